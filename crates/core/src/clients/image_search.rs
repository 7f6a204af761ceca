use super::{http_client, status_error, ImageSearch};
use crate::config::{CoreConfig, ImageSearchCredentials};
use crate::constants::IMAGE_QUERY_SUFFIX;
use crate::error::{ConfigError, ExternalServiceError};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::sync::Arc;

const SERVICE: &str = "image-search";

/// Google Custom Search client restricted to image results.
#[derive(Clone, Debug)]
pub struct GoogleImageSearch {
    client: reqwest::Client,
    endpoint: Url,
    credentials: ImageSearchCredentials,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    link: String,
}

impl GoogleImageSearch {
    /// # Errors
    ///
    /// Returns a `ConfigError` if the HTTP client cannot be built.
    pub fn new(cfg: &CoreConfig, credentials: ImageSearchCredentials) -> Result<Self, ConfigError> {
        Ok(Self {
            client: http_client(cfg)?,
            endpoint: cfg.image_search_url().clone(),
            credentials,
        })
    }

    /// Picks the image search backend for `cfg`.
    ///
    /// Without credentials every lookup resolves to "no image", so the rest of the pipeline runs
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the HTTP client cannot be built.
    pub fn from_config(cfg: &CoreConfig) -> Result<Arc<dyn ImageSearch>, ConfigError> {
        match cfg.image_search_credentials() {
            Some(credentials) => Ok(Arc::new(Self::new(cfg, credentials.clone())?)),
            None => {
                tracing::warn!("image search credentials not configured; enrichment disabled");
                Ok(Arc::new(DisabledImageSearch))
            }
        }
    }
}

#[async_trait]
impl ImageSearch for GoogleImageSearch {
    async fn find_image(&self, query: &str) -> Result<String, ExternalServiceError> {
        let q = format!("{query} {IMAGE_QUERY_SUFFIX}");
        tracing::debug!(query = %q, "searching for medicine image");

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("q", q.as_str()),
                ("searchType", "image"),
                ("num", "1"),
                ("key", self.credentials.api_key.as_str()),
                ("cx", self.credentials.engine_id.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ExternalServiceError::Transport {
                service: SERVICE,
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(status_error(SERVICE, response).await);
        }

        let body: SearchResponse =
            response
                .json()
                .await
                .map_err(|e| ExternalServiceError::Malformed {
                    service: SERVICE,
                    message: e.to_string(),
                })?;

        Ok(body
            .items
            .into_iter()
            .next()
            .map(|item| item.link)
            .unwrap_or_default())
    }
}

/// Image search that never finds anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledImageSearch;

#[async_trait]
impl ImageSearch for DisabledImageSearch {
    async fn find_image(&self, query: &str) -> Result<String, ExternalServiceError> {
        tracing::debug!(query, "image search disabled");
        Ok(String::new())
    }
}
