//! Mapping of raw OCR output into normalized medicine records.
//!
//! The OCR service returns best-effort guesses whose shape cannot be trusted: fields may be
//! missing, `null`, numbers, or nested objects, and the list itself may be absent. Everything in
//! this module is total: malformed input degrades to empty strings, never to an error.

use crate::normalize::normalize;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Transient output of one OCR call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawOcrResult {
    /// Full text as read from the image, before normalization.
    #[serde(default, deserialize_with = "lenient_text")]
    pub extracted_text: String,
    /// Untyped medicine guesses, kept as JSON so a malformed payload still deserializes.
    #[serde(default)]
    pub medicine_data: Value,
}

impl RawOcrResult {
    /// Builds a result from any JSON value. Non-object payloads yield an empty result.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_owned).unwrap_or_default())
}

/// One normalized medicine line from a prescription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicineRecord {
    pub medicine: String,
    pub dosage: String,
    pub schedule: String,
    /// Course length reported by OCR, when it was a positive whole number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_to_take: Option<u32>,
}

/// Parses raw medicine guesses into records.
///
/// Returns an empty list unless `raw` is a JSON array. Every element yields exactly one record,
/// in input order; duplicates and empty records are kept for the caller to decide on.
pub fn parse_medicine_guesses(raw: &Value) -> Vec<MedicineRecord> {
    let Some(guesses) = raw.as_array() else {
        return Vec::new();
    };

    guesses.iter().map(parse_guess).collect()
}

fn parse_guess(guess: &Value) -> MedicineRecord {
    MedicineRecord {
        medicine: text_field(guess, "medicine"),
        dosage: text_field(guess, "dosage"),
        schedule: text_field(guess, "schedule"),
        days_to_take: days_field(guess),
    }
}

fn text_field(guess: &Value, key: &str) -> String {
    match guess.get(key) {
        Some(Value::String(s)) => normalize(s),
        Some(Value::Number(n)) => normalize(&n.to_string()),
        _ => String::new(),
    }
}

fn days_field(guess: &Value) -> Option<u32> {
    let days = match guess.get("days_to_take")? {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                .map(|f| f as u64)
        })?,
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };

    u32::try_from(days).ok().filter(|d| *d > 0)
}
