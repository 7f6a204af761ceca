//! Constants used throughout the MedAI core crate.
//!
//! Defaults for the external collaborators and the environment variable names they are
//! resolved from live here so the binaries and the config layer agree on them.

/// Default base URL of the OCR extraction service.
pub const DEFAULT_OCR_URL: &str = "http://127.0.0.1:5000";

/// Path of the extraction endpoint, relative to the OCR base URL.
pub const OCR_EXTRACT_PATH: &str = "extract_text";

/// Multipart field name the OCR service reads the image from.
pub const OCR_IMAGE_FIELD: &str = "image";

/// Default image search endpoint (Google Custom Search JSON API).
pub const DEFAULT_IMAGE_SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// Word appended to every image search query so results favour packaging shots.
pub const IMAGE_QUERY_SUFFIX: &str = "medicine";

/// Default timeout applied to every external HTTP request.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Country code prefixed to bare national phone numbers.
pub const DEFAULT_COUNTRY_CODE: &str = "+91";

pub const ENV_OCR_URL: &str = "MEDAI_OCR_URL";
pub const ENV_IMAGE_SEARCH_URL: &str = "MEDAI_IMAGE_SEARCH_URL";
pub const ENV_IMAGE_SEARCH_KEY: &str = "MEDAI_IMAGE_SEARCH_KEY";
pub const ENV_IMAGE_SEARCH_CX: &str = "MEDAI_IMAGE_SEARCH_CX";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "MEDAI_HTTP_TIMEOUT_SECS";
pub const ENV_COUNTRY_CODE: &str = "MEDAI_COUNTRY_CODE";
