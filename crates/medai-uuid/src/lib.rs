//! Identifier utilities.
//!
//! Reminder entries are addressed by a generated identifier that never changes for the lifetime
//! of the entry, independent of its position in the reminder list. Identifiers use a *canonical*
//! UUID representation: **32 lowercase hexadecimal characters** (no hyphens).
//!
//! This crate provides:
//! - [`EntryId`], a wrapper that *guarantees* the canonical format once constructed.
//! - [`TicketGenerator`], a strictly increasing counter used to tell an in-flight image lookup
//!   apart from the lookups that superseded it.
//!
//! ## Canonical UUID form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`

mod service;

// Re-export public types
pub use service::{EntryId, LookupTicket, TicketGenerator, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type IdResult<T> = Result<T, IdError>;
