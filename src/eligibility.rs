//! Pre-flight validation and credit charging.

use crate::platform::{Document, DocumentStore};
use crate::prelude::*;

/// Outcome of the pre-flight gate.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Eligibility {
    /// Credits were charged for the whole job; OCR may proceed.
    Proceed { total_pages: u64 },

    /// Nothing was selected. Not an error.
    NoDocuments,

    /// The account could not be charged for the job.
    InsufficientCredits,
}

/// Check that the job has work to do, and charge for all of it up front.
///
/// The whole job is pre-paid in one call, before any document is touched,
/// so a run is either fully funded or never started. Any charging failure
/// reports [`Eligibility::InsufficientCredits`]; the underlying cause is
/// only logged.
#[instrument(level = "debug", skip_all)]
pub async fn check_eligibility(
    store: &dyn DocumentStore,
    documents: &[Document],
) -> Eligibility {
    if documents.is_empty() {
        return Eligibility::NoDocuments;
    }
    let total_pages = documents
        .iter()
        .map(|document| u64::from(document.page_count))
        .sum::<u64>();
    match store.charge_credits(total_pages).await {
        Ok(()) => Eligibility::Proceed { total_pages },
        Err(err) => {
            debug!("credit charge failed: {err:?}");
            Eligibility::InsufficientCredits
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::platform::testing::FakeStore;

    use super::*;

    #[tokio::test]
    async fn test_no_documents_skips_the_charge() {
        let store = FakeStore::default();
        assert_eq!(
            check_eligibility(&store, &[]).await,
            Eligibility::NoDocuments
        );
        assert!(store.state.lock().unwrap().charges.is_empty());
    }

    #[tokio::test]
    async fn test_charges_once_for_the_page_total() {
        let store = FakeStore::default();
        let documents = vec![FakeStore::document(1, 2), FakeStore::document(2, 3)];
        assert_eq!(
            check_eligibility(&store, &documents).await,
            Eligibility::Proceed { total_pages: 5 }
        );
        assert_eq!(store.state.lock().unwrap().charges, [5]);
    }

    #[tokio::test]
    async fn test_rejected_charge_is_a_benign_outcome() {
        let store = FakeStore::default();
        store.state.lock().unwrap().reject_charges = true;
        let documents = vec![FakeStore::document(1, 10)];
        assert_eq!(
            check_eligibility(&store, &documents).await,
            Eligibility::InsufficientCredits
        );
        // The charge was attempted exactly once.
        assert_eq!(store.state.lock().unwrap().charges, [10]);
    }
}
