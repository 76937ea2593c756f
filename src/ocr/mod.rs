//! OCR provider interface and result types.

pub mod textract;

use crate::prelude::*;

/// One recognized word, in the provider's coordinate space.
///
/// The bounding box is an origin plus size, fractional relative to the page
/// extent. Providers do not guarantee the box stays inside the page.
#[derive(Clone, Debug)]
pub struct OcrWord {
    pub text: String,
    pub confidence: f32,
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

/// One page of a completed OCR job.
///
/// Page numbers are 1-based, as providers report them.
#[derive(Clone, Debug)]
pub struct OcrPage {
    pub number: u32,
    pub text: String,
    pub words: Vec<OcrWord>,
}

/// Interface to an OCR provider.
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Run text detection against a document already hosted in cloud
    /// storage, waiting for the provider's asynchronous job to finish.
    ///
    /// Pages are returned in page-number order.
    async fn detect_document_text(&self, bucket: &str, key: &str) -> Result<Vec<OcrPage>>;
}
