use async_trait::async_trait;
use reqwest::Url;

use crate::{HttpClient, HttpError, RequestOpts};

/// Anything that can hand the extractor a fully materialised page.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetch the raw page markup.
    async fn fetch_document(&self) -> Result<String, HttpError>;

    /// URL the document is fetched from, for logs and error reports.
    fn location(&self) -> String;
}

/// [`DocumentSource`] backed by [`HttpClient`], always fetching one page.
#[derive(Clone)]
pub struct HttpDocumentSource {
    client: HttpClient,
    path: String,
}

impl HttpDocumentSource {
    pub fn new(client: HttpClient, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
        }
    }

    pub fn page_url(&self) -> Result<Url, HttpError> {
        self.client
            .base()
            .join(&self.path)
            .map_err(|e| HttpError::Url(e.to_string()))
    }
}

#[async_trait]
impl DocumentSource for HttpDocumentSource {
    async fn fetch_document(&self) -> Result<String, HttpError> {
        let started = std::time::Instant::now();
        let html = self
            .client
            .get_text(&self.path, RequestOpts::default())
            .await?;
        tracing::info!(
            target: "http.source",
            path = %self.path,
            bytes = html.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "document.fetched"
        );
        Ok(html)
    }

    fn location(&self) -> String {
        self.page_url()
            .map(|u| u.to_string())
            .unwrap_or_else(|_| format!("{}{}", self.client.base(), self.path))
    }
}
