//! Batched page uploads with completion polling.
//!
//! The platform applies page updates asynchronously on the server side, so
//! after each PATCH we wait for the document to come back to `success`
//! before sending the next chunk. Submitting chunk N+1 while chunk N is
//! still being applied can collide on the same document.

use std::time::Duration;

use crate::pages::PageRecord;
use crate::platform::DocumentStore;
use crate::prelude::*;

/// Tunables for the upload/confirm cycle.
#[derive(Clone, Debug)]
pub struct UploadOptions {
    /// Maximum page records per update.
    pub batch_size: usize,

    /// Delay between status polls.
    pub poll_interval: Duration,

    /// How many polls to attempt before giving up on a chunk.
    pub max_poll_attempts: u32,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            batch_size: 50,
            poll_interval: Duration::from_secs(5),
            max_poll_attempts: 120,
        }
    }
}

/// Upload a document's page records in order, one chunk at a time.
///
/// Each chunk must be confirmed as applied before the next is sent. A
/// failed submission or an unconfirmed chunk aborts the whole run; replays
/// after a re-run are safe because the platform upserts pages by
/// `page_number`.
#[instrument(level = "debug", skip_all, fields(id = document_id, pages = pages.len()))]
pub async fn upload_pages(
    store: &dyn DocumentStore,
    document_id: u64,
    pages: &[PageRecord],
    opts: &UploadOptions,
) -> Result<()> {
    for chunk in pages.chunks(opts.batch_size.max(1)) {
        store
            .update_pages(document_id, chunk)
            .await
            .with_context(|| {
                format!("failed to upload a page chunk for document {document_id}")
            })?;
        debug!(chunk_len = chunk.len(), "submitted page chunk");
        wait_until_applied(store, document_id, opts).await?;
    }
    Ok(())
}

/// Poll the document until the platform reports the last update applied.
async fn wait_until_applied(
    store: &dyn DocumentStore,
    document_id: u64,
    opts: &UploadOptions,
) -> Result<()> {
    for _ in 0..opts.max_poll_attempts {
        let status = store.document_status(document_id).await?;
        if status.is_success() {
            return Ok(());
        }
        if status.is_failed() {
            bail!(
                "document {document_id} entered status {status:?} while a page update \
                 was being applied"
            );
        }
        trace!(?status, "page update still being applied");
        tokio::time::sleep(opts.poll_interval).await;
    }
    bail!(
        "page update for document {document_id} was not confirmed after {} polls",
        opts.max_poll_attempts
    )
}
