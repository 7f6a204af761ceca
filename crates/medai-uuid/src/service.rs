//! Internal implementation of the identifier types.

use crate::{IdError, IdResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// Stable identifier of a reminder entry (32 lowercase hex characters, no hyphens).
///
/// An `EntryId` is allocated when an entry is created, whether by seeding from a prescription or
/// by the user adding a blank reminder, and is never reused. Deleting an entry does not change
/// the identifier of any other entry, so callers holding an id from an earlier listing either
/// address the same entry or get a clean "not found".
///
/// # Construction
/// - [`EntryId::new`] generates a fresh random identifier.
/// - [`EntryId::parse`] validates an externally supplied identifier (REST path, CLI argument).
///
/// # Display format
/// Always the canonical 32-character lowercase hex form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(Uuid);

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryId {
    /// Generates a new identifier in canonical form.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses an identifier that must already be in canonical form.
    ///
    /// Hyphenated or uppercase forms are rejected rather than normalised, so every id that
    /// crosses an API boundary has exactly one spelling.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidInput`] if `input` is not in canonical form.
    pub fn parse(input: &str) -> IdResult<Self> {
        if !Self::is_canonical(input) {
            return Err(IdError::InvalidInput(format!(
                "entry id must be 32 lowercase hex characters without hyphens, got: '{}'",
                input
            )));
        }
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| IdError::InvalidInput(format!("invalid entry id '{}': {}", input, e)))
    }

    /// Returns the underlying `uuid::Uuid`.
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Returns true if `input` is exactly 32 lowercase hex characters.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for EntryId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntryId::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for EntryId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for EntryId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        EntryId::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Identifies one dispatched image lookup.
///
/// Tickets are ordered: a ticket issued later always compares greater than one issued earlier by
/// the same [`TicketGenerator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LookupTicket(u64);

impl LookupTicket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for LookupTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues strictly increasing [`LookupTicket`]s.
///
/// Safe to share between threads; each call to [`TicketGenerator::next`] returns a value no other
/// call has returned.
#[derive(Debug, Default)]
pub struct TicketGenerator {
    last: AtomicU64,
}

impl TicketGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> LookupTicket {
        LookupTicket(self.last.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_new_generates_canonical_id() {
        let id = EntryId::new();
        let canonical = id.to_string();

        assert_eq!(canonical.len(), 32);
        assert!(EntryId::is_canonical(&canonical));
    }

    #[test]
    fn test_parse_valid_canonical_id() {
        let canonical = "550e8400e29b41d4a716446655440000";
        let id = EntryId::parse(canonical).unwrap();
        assert_eq!(id.to_string(), canonical);
    }

    #[test]
    fn test_parse_rejects_hyphenated_id() {
        let result = EntryId::parse("550e8400-e29b-41d4-a716-446655440000");

        match result {
            Err(IdError::InvalidInput(msg)) => {
                assert!(msg.contains("32 lowercase hex characters"));
            }
            _ => panic!("Expected InvalidInput error"),
        }
    }

    #[test]
    fn test_parse_rejects_uppercase_and_bad_length() {
        assert!(EntryId::parse("550E8400E29B41D4A716446655440000").is_err());
        assert!(EntryId::parse("550e8400e29b41d4a71644665544000").is_err());
        assert!(EntryId::parse("550e8400e29b41d4a716446655440zzz").is_err());
        assert!(EntryId::parse("").is_err());
    }

    #[test]
    fn test_from_str_matches_parse() {
        let id: EntryId = "00000000000000000000000000000001".parse().unwrap();
        assert_eq!(id, EntryId::parse("00000000000000000000000000000001").unwrap());
    }

    #[test]
    fn test_new_ids_are_distinct() {
        let ids: HashSet<EntryId> = (0..100).map(|_| EntryId::new()).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_serde_uses_canonical_string() {
        let id = EntryId::parse("550e8400e29b41d4a716446655440000").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"550e8400e29b41d4a716446655440000\"");
        let back: EntryId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<EntryId>("\"not-an-id\"").is_err());
    }

    #[test]
    fn test_tickets_strictly_increase() {
        let generator = TicketGenerator::new();
        let first = generator.next();
        let second = generator.next();
        let third = generator.next();

        assert!(first < second && second < third);
        assert_eq!(first.value(), 1);
        assert_eq!(third.to_string(), "#3");
    }
}
