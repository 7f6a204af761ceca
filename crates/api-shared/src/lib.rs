//! # API Shared
//!
//! Shared utilities and definitions for MedAI APIs.
//!
//! Contains:
//! - Request/response DTOs with OpenAPI schemas (`dto` module)
//! - Shared services like `HealthService`
//! - API key validation
//!
//! Used by `api-rest` and the `medai-run` binary.

pub mod auth;
pub mod dto;
pub mod health;

pub use auth::{validate_api_key, ApiKeyError, API_KEY_HEADER, ENV_API_KEY};
pub use dto::*;
pub use health::HealthService;
