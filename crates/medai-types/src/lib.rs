//! Validated value types shared across the MedAI crates.
//!
//! Each type here guarantees its invariant once constructed, so the store and the API layers can
//! pass values around without re-checking them.

use chrono::NaiveTime;
use std::fmt;
use std::str::FromStr;

/// Errors that can occur when creating validated value types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValueError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The input was not a 24-hour `HH:MM` time of day
    #[error("invalid time of day (expected HH:MM): '{0}'")]
    InvalidTimeOfDay(String),
    /// A course of treatment must last at least one day
    #[error("days to take must be at least 1")]
    ZeroDays,
    /// A course longer than [`DaysToTake::MAX_DAYS`]
    #[error("days to take must be at most 366, got {0}")]
    TooManyDays(u32),
    /// The input was neither an E.164 number nor a bare national number
    #[error("invalid phone number: '{0}'")]
    InvalidPhoneNumber(String),
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::Empty` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, ValueError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValueError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A wall-clock time of day at minute resolution, written as `HH:MM`.
///
/// This is the format produced by a browser `<input type="time">`, which is how reminder times
/// are captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    const FORMAT: &'static str = "%H:%M";

    /// Parses a 24-hour `HH:MM` string. Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidTimeOfDay` for anything else, including seconds.
    pub fn parse(input: &str) -> Result<Self, ValueError> {
        NaiveTime::parse_from_str(input.trim(), Self::FORMAT)
            .map(Self)
            .map_err(|_| ValueError::InvalidTimeOfDay(input.to_owned()))
    }

    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn as_naive(&self) -> NaiveTime {
        self.0
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}

impl FromStr for TimeOfDay {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeOfDay::parse(s)
    }
}

impl serde::Serialize for TimeOfDay {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for TimeOfDay {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        TimeOfDay::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Number of days a course of medicine runs for. Always between one and
/// [`DaysToTake::MAX_DAYS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(transparent)]
pub struct DaysToTake(u32);

impl DaysToTake {
    pub const ONE: DaysToTake = DaysToTake(1);

    /// Longest course accepted, one leap year.
    pub const MAX_DAYS: u32 = 366;

    /// # Errors
    ///
    /// Returns `ValueError::ZeroDays` when `days` is zero, or `ValueError::TooManyDays` when it
    /// exceeds [`DaysToTake::MAX_DAYS`].
    pub fn new(days: u32) -> Result<Self, ValueError> {
        if days == 0 {
            return Err(ValueError::ZeroDays);
        }
        if days > Self::MAX_DAYS {
            return Err(ValueError::TooManyDays(days));
        }
        Ok(Self(days))
    }

    /// Never fails: missing or zero counts become one day, and longer courses are clamped to
    /// [`DaysToTake::MAX_DAYS`].
    pub fn at_least_one(days: Option<u32>) -> Self {
        Self(days.unwrap_or(1).clamp(1, Self::MAX_DAYS))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for DaysToTake {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for DaysToTake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> serde::Deserialize<'de> for DaysToTake {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let days = u32::deserialize(deserializer)?;
        DaysToTake::new(days).map_err(serde::de::Error::custom)
    }
}

/// A phone number in E.164 form (`+` followed by 8 to 15 digits).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Length of a bare national number accepted by [`PhoneNumber::with_country_code`].
    pub const NATIONAL_DIGITS: usize = 10;

    /// Parses a number already in E.164 form. Spaces and dashes are ignored.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidPhoneNumber` if the digits do not form an E.164 number.
    pub fn parse(input: &str) -> Result<Self, ValueError> {
        let compact: String = input
            .chars()
            .filter(|c| !matches!(c, ' ' | '-'))
            .collect();

        let digits = compact
            .strip_prefix('+')
            .ok_or_else(|| ValueError::InvalidPhoneNumber(input.to_owned()))?;

        let ok = (8..=15).contains(&digits.len())
            && digits.bytes().all(|b| b.is_ascii_digit())
            && !digits.starts_with('0');
        if !ok {
            return Err(ValueError::InvalidPhoneNumber(input.to_owned()));
        }

        Ok(Self(compact))
    }

    /// Accepts either a full E.164 number or a bare 10-digit national number, which is prefixed
    /// with `country_code` (for example `+91`).
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidPhoneNumber` if neither form matches.
    pub fn with_country_code(input: &str, country_code: &str) -> Result<Self, ValueError> {
        let trimmed = input.trim();
        if trimmed.starts_with('+') {
            return Self::parse(trimmed);
        }

        let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() != Self::NATIONAL_DIGITS {
            return Err(ValueError::InvalidPhoneNumber(input.to_owned()));
        }

        Self::parse(&format!("{country_code}{digits}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
