use super::{http_client, status_error, OcrService};
use crate::config::CoreConfig;
use crate::constants::{OCR_EXTRACT_PATH, OCR_IMAGE_FIELD};
use crate::error::{ConfigError, ExternalServiceError};
use crate::prescription::RawOcrResult;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Url;

const SERVICE: &str = "ocr";

/// Client for the prescription OCR backend.
///
/// Uploads the image as a single multipart file field and reads back
/// `{ extracted_text, medicine_data }`.
#[derive(Clone, Debug)]
pub struct HttpOcrClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpOcrClient {
    /// # Errors
    ///
    /// Returns a `ConfigError` if the HTTP client cannot be built or the endpoint URL cannot be
    /// derived from the configured base URL.
    pub fn new(cfg: &CoreConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            client: http_client(cfg)?,
            endpoint: extract_endpoint(cfg.ocr_url())?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

fn extract_endpoint(base: &Url) -> Result<Url, ConfigError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(OCR_EXTRACT_PATH)
        .map_err(|e| ConfigError::InvalidUrl {
            var: crate::constants::ENV_OCR_URL,
            message: e.to_string(),
        })
}

/// Media type sniffed from the image bytes; the file name is only a label.
fn mime_for(image: &[u8]) -> &'static str {
    infer::get(image)
        .map(|kind| kind.mime_type())
        .unwrap_or("application/octet-stream")
}

#[async_trait]
impl OcrService for HttpOcrClient {
    async fn extract(
        &self,
        image: Vec<u8>,
        file_name: &str,
    ) -> Result<RawOcrResult, ExternalServiceError> {
        tracing::info!(
            bytes = image.len(),
            file_name,
            endpoint = %self.endpoint,
            "sending prescription to OCR"
        );

        let transport = |e: reqwest::Error| ExternalServiceError::Transport {
            service: SERVICE,
            message: e.to_string(),
        };

        let mime = mime_for(&image);
        let part = Part::bytes(image)
            .file_name(file_name.to_owned())
            .mime_str(mime)
            .map_err(transport)?;
        let form = Form::new().part(OCR_IMAGE_FIELD, part);

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(status_error(SERVICE, response).await);
        }

        let body: serde_json::Value =
            response
                .json()
                .await
                .map_err(|e| ExternalServiceError::Malformed {
                    service: SERVICE,
                    message: e.to_string(),
                })?;

        if !body.is_object() {
            return Err(ExternalServiceError::Malformed {
                service: SERVICE,
                message: "expected a JSON object".into(),
            });
        }

        if let Some(error) = body.get("error") {
            let message = error
                .as_str()
                .map(str::to_owned)
                .unwrap_or_else(|| error.to_string());
            return Err(ExternalServiceError::Rejected {
                service: SERVICE,
                message,
            });
        }

        Ok(RawOcrResult::from_value(body))
    }
}
