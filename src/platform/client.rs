//! The DocumentCloud REST client.

use reqwest::Response;
use serde_json::json;

use super::{Document, DocumentStatus, DocumentStore};
use crate::pages::PageRecord;
use crate::prelude::*;

/// Default API endpoint.
const DEFAULT_API_URL: &str = "https://api.www.documentcloud.org/api";

/// A client for the DocumentCloud API, authenticated with a bearer token.
pub struct DocumentCloudClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl DocumentCloudClient {
    /// Create a client from `DC_API_TOKEN` and (optionally) `DC_API_URL`.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("DC_API_TOKEN").context("DC_API_TOKEN is not set")?;
        let base_url =
            std::env::var("DC_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned());
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            token,
        })
    }

    /// Build a full URL from a path relative to the API root.
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Fetch one document.
    async fn get_document(&self, id: u64) -> Result<Document> {
        let response = self
            .client
            .get(self.url(&format!("documents/{id}/")))
            .bearer_auth(&self.token)
            .send()
            .await
            .with_context(|| format!("failed to fetch document {id}"))?;
        let response = check_status(response, "fetch document").await?;
        response
            .json()
            .await
            .with_context(|| format!("failed to parse document {id}"))
    }
}

#[async_trait]
impl DocumentStore for DocumentCloudClient {
    async fn get_documents(&self, ids: &[u64]) -> Result<Vec<Document>> {
        let mut documents = Vec::with_capacity(ids.len());
        for &id in ids {
            documents.push(self.get_document(id).await?);
        }
        Ok(documents)
    }

    #[instrument(level = "debug", skip(self))]
    async fn charge_credits(&self, pages: u64) -> Result<()> {
        let response = self
            .client
            .post(self.url("ai_credits/"))
            .bearer_auth(&self.token)
            .json(&json!({ "amount": pages, "note": "textract ocr" }))
            .send()
            .await
            .context("failed to charge AI credits")?;
        check_status(response, "charge AI credits").await?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self, pages), fields(pages = pages.len()))]
    async fn update_pages(&self, document_id: u64, pages: &[PageRecord]) -> Result<()> {
        let response = self
            .client
            .patch(self.url(&format!("documents/{document_id}/")))
            .bearer_auth(&self.token)
            .json(&json!({ "pages": pages }))
            .send()
            .await
            .with_context(|| {
                format!("failed to update pages of document {document_id}")
            })?;
        check_status(response, "update pages").await?;
        Ok(())
    }

    async fn document_status(&self, document_id: u64) -> Result<DocumentStatus> {
        Ok(self.get_document(document_id).await?.status)
    }

    #[instrument(level = "debug", skip(self))]
    async fn set_data_value(
        &self,
        document_id: u64,
        key: &str,
        value: &str,
    ) -> Result<()> {
        let response = self
            .client
            .put(self.url(&format!("documents/{document_id}/data/{key}/")))
            .bearer_auth(&self.token)
            .json(&json!({ "values": [value] }))
            .send()
            .await
            .with_context(|| {
                format!("failed to set data key {key:?} on document {document_id}")
            })?;
        check_status(response, "set data value").await?;
        Ok(())
    }
}

/// Convert a non-success response into an error carrying the status code
/// and the response body, which is where DocumentCloud puts the details.
async fn check_status(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(anyhow!("failed to {what}: {status} {body}"))
    }
}
