//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services. Nothing
//! in this crate reads process environment variables during request handling; binaries hand a
//! lookup function to [`CoreConfig::resolve`] instead.

use crate::constants::{
    DEFAULT_COUNTRY_CODE, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_IMAGE_SEARCH_URL, DEFAULT_OCR_URL,
    ENV_COUNTRY_CODE, ENV_HTTP_TIMEOUT_SECS, ENV_IMAGE_SEARCH_CX, ENV_IMAGE_SEARCH_KEY,
    ENV_IMAGE_SEARCH_URL, ENV_OCR_URL,
};
use crate::error::ConfigError;
use crate::validation::{validate_country_code, validate_http_url};
use reqwest::Url;
use std::time::Duration;

/// Credentials for the image search service. Enrichment is disabled when these are absent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageSearchCredentials {
    pub api_key: String,
    pub engine_id: String,
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    ocr_url: Url,
    image_search_url: Url,
    image_search_credentials: Option<ImageSearchCredentials>,
    http_timeout: Duration,
    country_code: String,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the timeout is zero or the country code is malformed.
    pub fn new(
        ocr_url: Url,
        image_search_url: Url,
        image_search_credentials: Option<ImageSearchCredentials>,
        http_timeout: Duration,
        country_code: &str,
    ) -> Result<Self, ConfigError> {
        if http_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout {
                var: ENV_HTTP_TIMEOUT_SECS,
                value: "0".into(),
            });
        }

        Ok(Self {
            ocr_url,
            image_search_url,
            image_search_credentials,
            http_timeout,
            country_code: validate_country_code(country_code)?,
        })
    }

    /// Resolve configuration from a key lookup, typically `|k| std::env::var(k).ok()`.
    ///
    /// Missing or blank values fall back to the defaults in [`crate::constants`]. Image search
    /// credentials are only used when both the key and the engine id are present.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if any supplied value is invalid.
    pub fn resolve<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let ocr_url = validate_http_url(
            ENV_OCR_URL,
            &get(ENV_OCR_URL).unwrap_or_else(|| DEFAULT_OCR_URL.into()),
        )?;
        let image_search_url = validate_http_url(
            ENV_IMAGE_SEARCH_URL,
            &get(ENV_IMAGE_SEARCH_URL).unwrap_or_else(|| DEFAULT_IMAGE_SEARCH_URL.into()),
        )?;

        let image_search_credentials =
            match (get(ENV_IMAGE_SEARCH_KEY), get(ENV_IMAGE_SEARCH_CX)) {
                (Some(api_key), Some(engine_id)) => Some(ImageSearchCredentials {
                    api_key,
                    engine_id,
                }),
                _ => None,
            };

        let http_timeout = match get(ENV_HTTP_TIMEOUT_SECS) {
            Some(raw) => {
                let secs = raw
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidTimeout {
                        var: ENV_HTTP_TIMEOUT_SECS,
                        value: raw.clone(),
                    })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        let country_code = get(ENV_COUNTRY_CODE).unwrap_or_else(|| DEFAULT_COUNTRY_CODE.into());

        Self::new(
            ocr_url,
            image_search_url,
            image_search_credentials,
            http_timeout,
            &country_code,
        )
    }

    pub fn ocr_url(&self) -> &Url {
        &self.ocr_url
    }

    pub fn image_search_url(&self) -> &Url {
        &self.image_search_url
    }

    pub fn image_search_credentials(&self) -> Option<&ImageSearchCredentials> {
        self.image_search_credentials.as_ref()
    }

    pub fn http_timeout(&self) -> Duration {
        self.http_timeout
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_resolve_uses_defaults() {
        let cfg = CoreConfig::resolve(|_| None).unwrap();

        assert_eq!(cfg.ocr_url().as_str(), "http://127.0.0.1:5000/");
        assert_eq!(cfg.image_search_url().as_str(), DEFAULT_IMAGE_SEARCH_URL);
        assert!(cfg.image_search_credentials().is_none());
        assert_eq!(cfg.http_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.country_code(), "+91");
    }

    #[test]
    fn test_resolve_reads_overrides() {
        let cfg = CoreConfig::resolve(lookup_from(&[
            (ENV_OCR_URL, "https://ocr.example.org/api/"),
            (ENV_IMAGE_SEARCH_KEY, "key"),
            (ENV_IMAGE_SEARCH_CX, "engine"),
            (ENV_HTTP_TIMEOUT_SECS, "5"),
            (ENV_COUNTRY_CODE, "+44"),
        ]))
        .unwrap();

        assert_eq!(cfg.ocr_url().as_str(), "https://ocr.example.org/api/");
        assert_eq!(
            cfg.image_search_credentials(),
            Some(&ImageSearchCredentials {
                api_key: "key".into(),
                engine_id: "engine".into(),
            })
        );
        assert_eq!(cfg.http_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.country_code(), "+44");
    }

    #[test]
    fn test_resolve_ignores_half_configured_search() {
        let cfg = CoreConfig::resolve(lookup_from(&[(ENV_IMAGE_SEARCH_KEY, "key")])).unwrap();
        assert!(cfg.image_search_credentials().is_none());
    }

    #[test]
    fn test_resolve_rejects_bad_values() {
        assert!(matches!(
            CoreConfig::resolve(lookup_from(&[(ENV_HTTP_TIMEOUT_SECS, "0")])),
            Err(ConfigError::InvalidTimeout { .. })
        ));
        assert!(matches!(
            CoreConfig::resolve(lookup_from(&[(ENV_HTTP_TIMEOUT_SECS, "soon")])),
            Err(ConfigError::InvalidTimeout { .. })
        ));
        assert!(matches!(
            CoreConfig::resolve(lookup_from(&[(ENV_OCR_URL, "file:///tmp")])),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            CoreConfig::resolve(lookup_from(&[(ENV_COUNTRY_CODE, "91")])),
            Err(ConfigError::InvalidCountryCode(_))
        ));
    }
}
