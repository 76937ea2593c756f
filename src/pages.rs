//! Page records, the shape DocumentCloud accepts for page updates.

use serde::Serialize;

use crate::geometry::BoundingBox;
use crate::ocr::{OcrPage, OcrWord};

/// Engine tag recorded on every page we write.
pub const OCR_ENGINE: &str = "textract";

/// One recognized word with its normalized position on the page.
#[derive(Clone, Debug, Serialize)]
pub struct WordPosition {
    pub text: String,
    #[serde(flatten)]
    pub bounds: BoundingBox,
    pub confidence: f32,
}

impl WordPosition {
    fn from_ocr_word(word: &OcrWord) -> Self {
        Self {
            text: word.text.clone(),
            bounds: BoundingBox::from_origin_size(
                word.left,
                word.top,
                word.width,
                word.height,
            ),
            confidence: word.confidence,
        }
    }
}

/// One page of OCR results, shaped for the platform's page update API.
///
/// Page numbers are 0-based here; OCR providers report them 1-based.
#[derive(Clone, Debug, Serialize)]
pub struct PageRecord {
    pub page_number: u32,
    pub text: String,
    pub ocr: &'static str,
    pub positions: Vec<WordPosition>,
}

impl PageRecord {
    /// Build the page record for one page of provider output, preserving
    /// the provider's word order.
    pub fn from_ocr_page(page: &OcrPage) -> Self {
        Self {
            page_number: page.number.saturating_sub(1),
            text: page.text.clone(),
            ocr: OCR_ENGINE,
            positions: page.words.iter().map(WordPosition::from_ocr_word).collect(),
        }
    }
}
