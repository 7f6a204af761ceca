/// Header carrying the API key on mutating requests.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Environment variable holding the expected API key. Checks are disabled when it is unset.
pub const ENV_API_KEY: &str = "MEDAI_API_KEY";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ApiKeyError {
    #[error("missing API key")]
    Missing,
    #[error("invalid API key")]
    Invalid,
}

/// Validates the provided API key against the key resolved at startup.
///
/// When `expected` is `None` every request is accepted.
///
/// # Errors
///
/// Returns `ApiKeyError::Missing` if a key is required but none was sent, or
/// `ApiKeyError::Invalid` if it does not match.
pub fn validate_api_key(expected: Option<&str>, provided: Option<&str>) -> Result<(), ApiKeyError> {
    let Some(expected) = expected else {
        return Ok(());
    };

    match provided {
        None => Err(ApiKeyError::Missing),
        Some(key) if key == expected => Ok(()),
        Some(_) => Err(ApiKeyError::Invalid),
    }
}
