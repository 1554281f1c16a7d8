//! Text acquisition
//!
//! Turns an ingestion source (page URL, uploaded file or pasted text) into
//! the raw text handed to extraction. Only the [`TextSource`] seam is part of
//! the pipeline contract; [`SourceReader`] is the bundled adapter.

mod file;
mod web;

pub use file::read_upload;
pub use web::page_text;

use crate::config::AcquisitionConfig;
use std::future::Future;
use thiserror::Error;
use tracing::debug;

/// Errors raised while turning a source into text
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AcquisitionError {
    /// Nothing usable was supplied, or the upload is of an unsupported kind
    #[error("{0}")]
    Input(String),

    /// The page could not be fetched
    #[error("Failed to scrape content from the provided URL: {0}")]
    Fetch(String),

    /// The uploaded file could not be parsed
    #[error("Failed to process file: {0}")]
    File(String),

    /// The source yielded no text
    #[error("No text content found in {0}")]
    Empty(String),

    /// The HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Client(String),
}

/// Where the text of an ingestion request comes from
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// A web page to fetch
    Url(String),
    /// An uploaded file
    File {
        /// Original file name; its extension selects the reader
        name: String,
        /// Raw content
        bytes: Vec<u8>,
    },
    /// Pasted text
    Text(String),
}

impl Source {
    /// Pick the source of a request: URL first, then file, then text
    ///
    /// Blank values count as absent.
    pub fn select(
        url: Option<String>,
        file: Option<(String, Vec<u8>)>,
        text: Option<String>,
    ) -> Result<Source, AcquisitionError> {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            return Ok(Source::Url(url.trim().to_string()));
        }
        if let Some((name, bytes)) = file.filter(|(name, _)| !name.trim().is_empty()) {
            return Ok(Source::File { name, bytes });
        }
        if let Some(text) = text.filter(|t| !t.trim().is_empty()) {
            return Ok(Source::Text(text));
        }
        Err(AcquisitionError::Input("No input provided".to_string()))
    }

    /// Short label for logs
    pub fn describe(&self) -> String {
        match self {
            Source::Url(url) => format!("url {}", url),
            Source::File { name, bytes } => format!("file {} ({} bytes)", name, bytes.len()),
            Source::Text(text) => format!("text ({} chars)", text.chars().count()),
        }
    }
}

/// Turns a [`Source`] into raw text
pub trait TextSource {
    /// Acquire the text of `source`
    fn acquire(
        &self,
        source: &Source,
    ) -> impl Future<Output = Result<String, AcquisitionError>> + Send;
}

/// Bundled text source: static HTML over HTTP, CSV or text uploads, and
/// pasted text
#[derive(Debug, Clone)]
pub struct SourceReader {
    client: reqwest::Client,
    config: AcquisitionConfig,
}

impl SourceReader {
    /// Create a reader with its own HTTP client
    pub fn new(config: AcquisitionConfig) -> Result<Self, AcquisitionError> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout())
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| AcquisitionError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Active configuration
    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    async fn fetch_html(&self, url: &str) -> Result<String, AcquisitionError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AcquisitionError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AcquisitionError::Fetch(format!("HTTP {} for {}", status, url)));
        }

        response
            .text()
            .await
            .map_err(|e| AcquisitionError::Fetch(format!("Failed to read response body: {}", e)))
    }
}

impl TextSource for SourceReader {
    async fn acquire(&self, source: &Source) -> Result<String, AcquisitionError> {
        debug!("Acquiring text from {}", source.describe());
        match source {
            Source::Url(url) => {
                let html = self.fetch_html(url).await?;
                let text = page_text(&html, self.config.max_reveal_elements);
                if text.trim().is_empty() {
                    return Err(AcquisitionError::Empty(url.clone()));
                }
                debug!(url = %url, chars = text.chars().count(), "page text extracted");
                Ok(text)
            }
            Source::File { name, bytes } => read_upload(name, bytes),
            Source::Text(text) => {
                if text.trim().is_empty() {
                    return Err(AcquisitionError::Input("No input provided".to_string()));
                }
                Ok(text.clone())
            }
        }
    }
}
