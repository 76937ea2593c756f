//! The document platform: types and the capability interface we need from
//! it.

pub mod client;
#[cfg(test)]
pub mod testing;

use crate::pages::PageRecord;
use crate::prelude::*;

/// A document's server-side processing status.
///
/// `Success` is the terminal state we wait for after each page update.
/// `Error` and `Nofile` mean the platform has given up on the document.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Success,
    Readable,
    Pending,
    Error,
    Nofile,
}

impl DocumentStatus {
    /// Has the platform fully applied the last update?
    pub fn is_success(self) -> bool {
        matches!(self, DocumentStatus::Success)
    }

    /// Has the platform given up processing the document?
    pub fn is_failed(self) -> bool {
        matches!(self, DocumentStatus::Error | DocumentStatus::Nofile)
    }
}

/// A document as the platform reports it. We only carry the fields the job
/// reads.
#[derive(Clone, Debug, Deserialize)]
pub struct Document {
    pub id: u64,
    pub slug: String,
    pub page_count: u32,
    pub status: DocumentStatus,
}

impl Document {
    /// The key under which the platform hosts the document's original PDF
    /// in its S3 bucket.
    pub fn pdf_key(&self) -> String {
        format!("documents/{}/{}.pdf", self.id, self.slug)
    }
}

/// Interface to the document platform.
///
/// The job is written against this trait so the platform can be faked in
/// tests.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the selected documents by ID.
    async fn get_documents(&self, ids: &[u64]) -> Result<Vec<Document>>;

    /// Charge `pages` AI credits against the caller's account.
    async fn charge_credits(&self, pages: u64) -> Result<()>;

    /// Apply a partial update to a document's page collection.
    ///
    /// Updates are upserts keyed by `page_number`, so resubmitting the same
    /// pages must not create duplicates.
    async fn update_pages(&self, document_id: u64, pages: &[PageRecord]) -> Result<()>;

    /// Read a document's current processing status.
    async fn document_status(&self, document_id: u64) -> Result<DocumentStatus>;

    /// Write one key into the document's metadata.
    async fn set_data_value(
        &self,
        document_id: u64,
        key: &str,
        value: &str,
    ) -> Result<()>;
}
