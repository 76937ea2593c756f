//! The OCR job itself: gate, detect, ingest, upload, tag.

use crate::eligibility::{Eligibility, check_eligibility};
use crate::ocr::OcrProvider;
use crate::pages::{OCR_ENGINE, PageRecord};
use crate::platform::{Document, DocumentStore};
use crate::prelude::*;
use crate::ui::{ProgressConfig, Ui};
use crate::upload::{UploadOptions, upload_pages};

/// Job-level configuration.
#[derive(Clone, Debug)]
pub struct JobOptions {
    /// S3 bucket where the platform hosts document PDFs.
    pub bucket: String,

    /// Record the OCR engine in each document's metadata on success.
    pub tag_engine: bool,

    /// Upload tunables.
    pub upload: UploadOptions,
}

/// How a job run ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JobOutcome {
    /// Every selected document was OCRed and uploaded.
    Completed { document_count: usize },

    /// No documents were selected.
    NoDocuments,

    /// The account could not cover the job's page count.
    InsufficientCredits,
}

/// Run the OCR job over the selected documents.
///
/// Documents are processed one at a time. A failure partway through aborts
/// the run without touching the remaining documents; work already uploaded
/// for earlier documents stays in place.
#[instrument(level = "debug", skip_all, fields(documents = ids.len()))]
pub async fn run_job(
    ui: &Ui,
    store: &dyn DocumentStore,
    ocr: &dyn OcrProvider,
    ids: &[u64],
    opts: &JobOptions,
) -> Result<JobOutcome> {
    if ids.is_empty() {
        return Ok(JobOutcome::NoDocuments);
    }
    let documents = store
        .get_documents(ids)
        .await
        .context("failed to fetch the selected documents")?;
    match check_eligibility(store, &documents).await {
        Eligibility::Proceed { total_pages } => {
            info!(total_pages, "charged credits for the whole job");
        }
        Eligibility::NoDocuments => return Ok(JobOutcome::NoDocuments),
        Eligibility::InsufficientCredits => return Ok(JobOutcome::InsufficientCredits),
    }
    for document in &documents {
        process_document(ui, store, ocr, document, opts)
            .await
            .with_context(|| format!("failed to OCR document {}", document.id))?;
    }
    Ok(JobOutcome::Completed {
        document_count: documents.len(),
    })
}

/// OCR one document and persist the results.
///
/// Tagging is the last step, so a document is only tagged once every chunk
/// of its pages has been confirmed.
#[instrument(level = "debug", skip_all, fields(id = document.id, slug = %document.slug))]
async fn process_document(
    ui: &Ui,
    store: &dyn DocumentStore,
    ocr: &dyn OcrProvider,
    document: &Document,
    opts: &JobOptions,
) -> Result<()> {
    let spinner = ui.new_spinner(&ProgressConfig {
        emoji: "📄",
        msg: &format!("OCRing {}", document.slug),
        done_msg: &format!("OCRed {}", document.slug),
    });

    let ocr_pages = ocr
        .detect_document_text(&opts.bucket, &document.pdf_key())
        .await?;
    let records = ocr_pages
        .iter()
        .map(PageRecord::from_ocr_page)
        .collect::<Vec<_>>();
    upload_pages(store, document.id, &records, &opts.upload).await?;
    if opts.tag_engine {
        store
            .set_data_value(document.id, "ocr_engine", OCR_ENGINE)
            .await?;
    }

    spinner.finish_using_style();
    Ok(())
}
