//! OCR using the asynchronous AWS Textract APIs.

use std::collections::BTreeMap;
use std::time::Duration;

use aws_sdk_textract::types::{Block, BlockType, DocumentLocation, JobStatus, S3Object};
use leaky_bucket::RateLimiter;

use crate::aws::load_aws_config;
use crate::prelude::*;

use super::{OcrPage, OcrProvider, OcrWord};

/// How many Textract API calls we allow per second. The async job APIs
/// throttle aggressively.
const MAX_REQUESTS_PER_SECOND: usize = 2;

/// OCR provider wrapping AWS Textract's asynchronous text detection.
///
/// Textract reads the document straight out of S3, so submission is by
/// object reference and no page images ever pass through this process.
pub struct TextractProvider {
    /// AWS Textract client.
    client: aws_sdk_textract::Client,

    /// A rate limiter to avoid hitting API limits.
    rate_limiter: RateLimiter,

    /// How long to wait between job status checks.
    poll_interval: Duration,
}

impl TextractProvider {
    /// Create a new Textract provider.
    pub async fn new(poll_interval: Duration) -> Result<Self> {
        let config = load_aws_config().await?;
        let client = aws_sdk_textract::Client::new(&config);
        let rate_limiter = RateLimiter::builder()
            .initial(MAX_REQUESTS_PER_SECOND)
            .refill(MAX_REQUESTS_PER_SECOND)
            .max(MAX_REQUESTS_PER_SECOND)
            .interval(Duration::from_secs(1))
            .build();
        Ok(Self {
            client,
            rate_limiter,
            poll_interval,
        })
    }

    /// Start a text detection job against an S3 object and return the job
    /// ID.
    async fn start_job(&self, bucket: &str, key: &str) -> Result<String> {
        self.rate_limiter.acquire_one().await;
        let location = DocumentLocation::builder()
            .s3_object(S3Object::builder().bucket(bucket).name(key).build())
            .build();
        let response = self
            .client
            .start_document_text_detection()
            .document_location(location)
            .send()
            .await
            .with_context(|| {
                format!("failed to start text detection for s3://{bucket}/{key}")
            })?;
        response
            .job_id()
            .map(ToOwned::to_owned)
            .ok_or_else(|| anyhow!("Textract returned no job ID for s3://{bucket}/{key}"))
    }

    /// Wait for a job to finish and collect every result block, following
    /// `next_token` pagination.
    async fn collect_blocks(&self, job_id: &str) -> Result<Vec<Block>> {
        let mut blocks = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            self.rate_limiter.acquire_one().await;
            let response = self
                .client
                .get_document_text_detection()
                .job_id(job_id)
                .set_next_token(next_token.take())
                .send()
                .await
                .with_context(|| format!("failed to poll Textract job {job_id}"))?;
            match response.job_status() {
                Some(JobStatus::InProgress) => {
                    trace!("Textract job {job_id} still in progress");
                    tokio::time::sleep(self.poll_interval).await;
                }
                Some(JobStatus::Succeeded) => {
                    blocks.extend_from_slice(response.blocks());
                    match response.next_token() {
                        Some(token) => next_token = Some(token.to_owned()),
                        None => return Ok(blocks),
                    }
                }
                status => {
                    let status = status.map(|s| s.as_str()).unwrap_or("UNKNOWN");
                    let message = response.status_message().unwrap_or("no status message");
                    return Err(anyhow!(
                        "Textract job {job_id} failed ({status}): {message}"
                    ));
                }
            }
        }
    }
}

#[async_trait]
impl OcrProvider for TextractProvider {
    #[instrument(level = "debug", skip(self))]
    async fn detect_document_text(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Vec<OcrPage>> {
        let job_id = self.start_job(bucket, key).await?;
        debug!(%job_id, "started Textract job");
        let blocks = self.collect_blocks(&job_id).await?;
        Ok(pages_from_blocks(&blocks))
    }
}

/// Group Textract result blocks into per-page OCR output.
///
/// `LINE` blocks carry the page text and `WORD` blocks carry word-level
/// geometry and confidence. `PAGE` blocks make sure a page with no text
/// still shows up in the output.
fn pages_from_blocks(blocks: &[Block]) -> Vec<OcrPage> {
    let mut pages = BTreeMap::new();
    for block in blocks {
        let Some(number) = block.page().and_then(|page| u32::try_from(page).ok()) else {
            continue;
        };
        let page = pages.entry(number).or_insert_with(|| OcrPage {
            number,
            text: String::new(),
            words: Vec::new(),
        });
        match block.block_type() {
            Some(BlockType::Line) => {
                if let Some(text) = block.text() {
                    if !page.text.is_empty() {
                        page.text.push('\n');
                    }
                    page.text.push_str(text);
                }
            }
            Some(BlockType::Word) => {
                let Some(bounds) = block.geometry().and_then(|g| g.bounding_box()) else {
                    continue;
                };
                page.words.push(OcrWord {
                    text: block.text().unwrap_or_default().to_owned(),
                    confidence: block.confidence().unwrap_or_default(),
                    left: bounds.left(),
                    top: bounds.top(),
                    width: bounds.width(),
                    height: bounds.height(),
                });
            }
            _ => {}
        }
    }
    pages.into_values().collect()
}

#[cfg(test)]
mod tests {
    use aws_sdk_textract::types::{BoundingBox, Geometry};

    use super::*;

    fn geometry(left: f32, top: f32, width: f32, height: f32) -> Geometry {
        Geometry::builder()
            .bounding_box(
                BoundingBox::builder()
                    .left(left)
                    .top(top)
                    .width(width)
                    .height(height)
                    .build(),
            )
            .build()
    }

    fn line(page: i32, text: &str) -> Block {
        Block::builder()
            .block_type(BlockType::Line)
            .page(page)
            .text(text)
            .build()
    }

    fn word(page: i32, text: &str, confidence: f32) -> Block {
        Block::builder()
            .block_type(BlockType::Word)
            .page(page)
            .text(text)
            .confidence(confidence)
            .geometry(geometry(0.25, 0.5, 0.125, 0.0625))
            .build()
    }

    #[test]
    fn test_blocks_are_grouped_by_page() {
        let blocks = vec![
            Block::builder().block_type(BlockType::Page).page(1).build(),
            line(1, "Hello world"),
            word(1, "Hello", 99.0),
            word(1, "world", 98.5),
            Block::builder().block_type(BlockType::Page).page(2).build(),
            line(2, "Second page"),
            word(2, "Second", 97.0),
            word(2, "page", 96.0),
        ];
        let pages = pages_from_blocks(&blocks);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].number, 1);
        assert_eq!(pages[0].text, "Hello world");
        assert_eq!(pages[0].words.len(), 2);
        assert_eq!(pages[0].words[0].text, "Hello");
        assert_eq!(pages[0].words[0].confidence, 99.0);
        assert_eq!(pages[1].number, 2);
        assert_eq!(pages[1].text, "Second page");
    }

    #[test]
    fn test_multiple_lines_are_joined_with_newlines() {
        let blocks = vec![line(1, "First line"), line(1, "Second line")];
        let pages = pages_from_blocks(&blocks);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].text, "First line\nSecond line");
    }

    #[test]
    fn test_empty_page_still_appears() {
        let blocks = vec![
            Block::builder().block_type(BlockType::Page).page(1).build(),
            Block::builder().block_type(BlockType::Page).page(2).build(),
            line(2, "Only page two has text"),
        ];
        let pages = pages_from_blocks(&blocks);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].number, 1);
        assert_eq!(pages[0].text, "");
        assert!(pages[0].words.is_empty());
    }

    #[test]
    fn test_word_geometry_is_copied() {
        let pages = pages_from_blocks(&[word(1, "word", 95.0)]);
        let word = &pages[0].words[0];
        assert_eq!(word.left, 0.25);
        assert_eq!(word.top, 0.5);
        assert_eq!(word.width, 0.125);
        assert_eq!(word.height, 0.0625);
    }
}
