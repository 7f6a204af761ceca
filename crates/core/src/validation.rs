//! Input validation utilities.
//!
//! This module contains functions for validating configuration inputs before they are used to
//! build HTTP clients or phone numbers.

use crate::error::ConfigError;
use reqwest::Url;

/// Parses `value` as an absolute `http` or `https` URL.
///
/// # Arguments
///
/// * `var` - Name of the setting the value came from, used in the error message.
/// * `value` - The candidate URL.
///
/// # Errors
///
/// Returns `ConfigError::InvalidUrl` if the value does not parse, uses another scheme, or has no
/// host.
pub fn validate_http_url(var: &'static str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim()).map_err(|e| ConfigError::InvalidUrl {
        var,
        message: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            var,
            message: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl {
            var,
            message: "missing host".into(),
        });
    }

    Ok(url)
}

/// Validates an international dialling prefix such as `+91` or `+44`.
///
/// # Errors
///
/// Returns `ConfigError::InvalidCountryCode` unless the value is `+` followed by one to three
/// digits, the first of which is non-zero.
pub fn validate_country_code(value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    let ok = trimmed
        .strip_prefix('+')
        .map(|digits| {
            (1..=3).contains(&digits.len())
                && digits.bytes().all(|b| b.is_ascii_digit())
                && !digits.starts_with('0')
        })
        .unwrap_or(false);

    if !ok {
        return Err(ConfigError::InvalidCountryCode(value.to_owned()));
    }

    Ok(trimmed.to_owned())
}
