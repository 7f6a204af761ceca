use medai_types::ValueError;
use medai_uuid::EntryId;

/// A malformed or out-of-range mutation request.
///
/// Fatal to the call that produced it, never to the session: the reminder list is left exactly as
/// it was before the call.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no reminder with id {0}")]
    UnknownEntry(EntryId),
    #[error("reminder index {index} is out of range (list has {len} entries)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("unknown reminder field: '{0}'")]
    UnknownField(String),
    #[error("invalid value for {field}: '{value}'")]
    InvalidFieldValue { field: &'static str, value: String },
    #[error(transparent)]
    InvalidValue(#[from] ValueError),
}

/// Failure talking to an external collaborator (OCR or image search).
///
/// These never block the reminder workflow. OCR failures are reported to the caller and leave
/// the list untouched; image search failures are logged and swallowed.
#[derive(Debug, thiserror::Error)]
pub enum ExternalServiceError {
    #[error("{service} request failed: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },
    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },
    #[error("{service} reported an error: {message}")]
    Rejected {
        service: &'static str,
        message: String,
    },
    #[error("{service} returned a malformed payload: {message}")]
    Malformed {
        service: &'static str,
        message: String,
    },
}

/// Phone verification failure, surfaced to the user as a retry prompt.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("failed to send verification code: {0}")]
    SendFailed(String),
    #[error("verification code was rejected")]
    InvalidCode,
    #[error("no verification code has been sent for this registration")]
    NoPendingConfirmation,
    #[error(transparent)]
    InvalidPhoneNumber(#[from] ValueError),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not a valid http(s) URL: {message}")]
    InvalidUrl { var: &'static str, message: String },
    #[error("{var} must be a positive number of seconds, got '{value}'")]
    InvalidTimeout { var: &'static str, value: String },
    #[error("invalid country code '{0}' (expected '+' followed by 1-3 digits)")]
    InvalidCountryCode(String),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

#[derive(Debug, thiserror::Error)]
pub enum MedAiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    ExternalService(#[from] ExternalServiceError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type MedAiResult<T> = std::result::Result<T, MedAiError>;
