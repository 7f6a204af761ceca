//! Boundaries to the external collaborators.
//!
//! The pipeline only talks to OCR and image search through the [`OcrService`] and
//! [`ImageSearch`] traits; the HTTP implementations here are the production wiring and tests swap
//! in in-memory fakes.

mod image_search;
mod ocr;

pub use image_search::{DisabledImageSearch, GoogleImageSearch};
pub use ocr::HttpOcrClient;

use crate::config::CoreConfig;
use crate::error::{ConfigError, ExternalServiceError};
use crate::prescription::RawOcrResult;
use async_trait::async_trait;

/// Turns an image into raw text and medicine guesses.
#[async_trait]
pub trait OcrService: Send + Sync {
    async fn extract(
        &self,
        image: Vec<u8>,
        file_name: &str,
    ) -> Result<RawOcrResult, ExternalServiceError>;
}

/// Finds a representative image for a free-text query.
#[async_trait]
pub trait ImageSearch: Send + Sync {
    /// Returns the image URL, or an empty string when the service has no match.
    async fn find_image(&self, query: &str) -> Result<String, ExternalServiceError>;
}

/// Builds the shared HTTP client with the configured timeout.
pub(crate) fn http_client(cfg: &CoreConfig) -> Result<reqwest::Client, ConfigError> {
    reqwest::Client::builder()
        .timeout(cfg.http_timeout())
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))
}

/// Reads a non-success response into an [`ExternalServiceError::Status`].
pub(crate) async fn status_error(
    service: &'static str,
    response: reqwest::Response,
) -> ExternalServiceError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ExternalServiceError::Status {
        service,
        status,
        body,
    }
}
