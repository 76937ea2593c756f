//! A scripted, in-memory `DocumentStore` for tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{Document, DocumentStatus, DocumentStore};
use crate::pages::PageRecord;
use crate::prelude::*;

/// An in-memory document store that records every call it receives.
#[derive(Default)]
pub struct FakeStore {
    pub state: Mutex<FakeStoreState>,
}

/// Mutable state behind [`FakeStore`].
#[derive(Default)]
pub struct FakeStoreState {
    /// Documents returned by `get_documents`.
    pub documents: Vec<Document>,

    /// Pages stored per document, keyed by page number (upsert semantics,
    /// like the real platform).
    pub pages: BTreeMap<u64, BTreeMap<u32, PageRecord>>,

    /// Page totals seen by `charge_credits`, in call order.
    pub charges: Vec<u64>,

    /// When true, `charge_credits` fails with a balance error.
    pub reject_charges: bool,

    /// Page-number lists seen by `update_pages`, in submission order.
    pub submitted_chunks: Vec<(u64, Vec<u32>)>,

    /// When true, `update_pages` fails.
    pub reject_updates: bool,

    /// Statuses returned by `document_status`, in order. The last entry
    /// repeats once the script runs out; an empty script means `Success`.
    pub status_script: Vec<DocumentStatus>,

    /// How many times `document_status` was called.
    pub status_polls: usize,

    /// `(document_id, key, value)` triples seen by `set_data_value`.
    pub data_writes: Vec<(u64, String, String)>,
}

impl FakeStore {
    /// Create a store pre-loaded with documents.
    pub fn with_documents(documents: Vec<Document>) -> Self {
        let store = Self::default();
        store.state.lock().expect("lock poisoned").documents = documents;
        store
    }

    /// A document suitable for most tests.
    pub fn document(id: u64, page_count: u32) -> Document {
        Document {
            id,
            slug: format!("test-doc-{id}"),
            page_count,
            status: DocumentStatus::Success,
        }
    }
}

#[async_trait]
impl DocumentStore for FakeStore {
    async fn get_documents(&self, ids: &[u64]) -> Result<Vec<Document>> {
        let state = self.state.lock().expect("lock poisoned");
        Ok(ids
            .iter()
            .filter_map(|id| state.documents.iter().find(|d| d.id == *id).cloned())
            .collect())
    }

    async fn charge_credits(&self, pages: u64) -> Result<()> {
        let mut state = self.state.lock().expect("lock poisoned");
        state.charges.push(pages);
        if state.reject_charges {
            bail!("insufficient AI credits");
        }
        Ok(())
    }

    async fn update_pages(&self, document_id: u64, pages: &[PageRecord]) -> Result<()> {
        let mut state = self.state.lock().expect("lock poisoned");
        state
            .submitted_chunks
            .push((document_id, pages.iter().map(|p| p.page_number).collect()));
        if state.reject_updates {
            bail!("page update rejected");
        }
        let stored = state.pages.entry(document_id).or_default();
        for page in pages {
            stored.insert(page.page_number, page.clone());
        }
        Ok(())
    }

    async fn document_status(&self, _document_id: u64) -> Result<DocumentStatus> {
        let mut state = self.state.lock().expect("lock poisoned");
        let status = if state.status_script.is_empty() {
            DocumentStatus::Success
        } else {
            let index = state.status_polls.min(state.status_script.len() - 1);
            state.status_script[index]
        };
        state.status_polls += 1;
        Ok(status)
    }

    async fn set_data_value(
        &self,
        document_id: u64,
        key: &str,
        value: &str,
    ) -> Result<()> {
        self.state
            .lock()
            .expect("lock poisoned")
            .data_writes
            .push((document_id, key.to_owned(), value.to_owned()));
        Ok(())
    }
}
