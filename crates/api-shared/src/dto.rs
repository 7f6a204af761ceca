//! Wire types for the HTTP API.
//!
//! Core types stay free of OpenAPI concerns; these mirror them with `ToSchema` derives and the
//! camelCase field names the mobile client expects.

use medai_core::{
    CalendarEvent, EnrichmentStatus, IngestSummary, MedicineRecord, ReminderSnapshot,
    ReminderUpdate, ValidationError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

const EVENT_START_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentState {
    Pending,
    Resolved,
    Absent,
}

impl From<EnrichmentStatus> for EnrichmentState {
    fn from(status: EnrichmentStatus) -> Self {
        match status {
            EnrichmentStatus::Pending => Self::Pending,
            EnrichmentStatus::Resolved => Self::Resolved,
            EnrichmentStatus::Absent => Self::Absent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: String,
    pub medicine: String,
    pub dosage: String,
    pub frequency: String,
    /// `HH:MM`, or empty when unset.
    pub time: String,
    pub days_to_take: u32,
    pub purchase_reminder: bool,
    pub image_url: String,
    pub enrichment: EnrichmentState,
}

impl From<ReminderSnapshot> for Reminder {
    fn from(snapshot: ReminderSnapshot) -> Self {
        let entry = snapshot.entry;
        Self {
            id: entry.id.to_string(),
            medicine: entry.medicine,
            dosage: entry.dosage,
            frequency: entry.frequency,
            time: entry.time.map(|t| t.to_string()).unwrap_or_default(),
            days_to_take: entry.days_to_take.get(),
            purchase_reminder: entry.purchase_reminder,
            image_url: entry.image_url,
            enrichment: snapshot.enrichment.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MedicineRecordRes {
    pub medicine: String,
    pub dosage: String,
    pub schedule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_to_take: Option<u32>,
}

impl From<MedicineRecord> for MedicineRecordRes {
    fn from(record: MedicineRecord) -> Self {
        Self {
            medicine: record.medicine,
            dosage: record.dosage,
            schedule: record.schedule,
            days_to_take: record.days_to_take,
        }
    }
}

/// Multipart form for a prescription photo upload.
#[derive(Debug, ToSchema)]
pub struct UploadPrescriptionReq {
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

/// Raw OCR output submitted directly, bypassing the OCR service.
///
/// Documentation only: the handler accepts any JSON and degrades malformed fields to empty values.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OcrPayloadReq {
    #[serde(default)]
    pub extracted_text: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub medicine_data: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngestRes {
    pub extracted_text: String,
    pub records: Vec<MedicineRecordRes>,
    pub reminders: Vec<Reminder>,
}

impl IngestRes {
    /// Pairs an ingest result with the reminder list as it stood right after seeding.
    pub fn new(summary: IngestSummary, reminders: Vec<ReminderSnapshot>) -> Self {
        Self {
            extracted_text: summary.extracted_text,
            records: summary.records.into_iter().map(Into::into).collect(),
            reminders: reminders.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ListRemindersRes {
    pub reminders: Vec<Reminder>,
}

/// A single-field edit. `value` may be a string, number or boolean.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateReminderReq {
    /// One of `medicine`, `dosage`, `frequency`, `time`, `daysToTake`, `purchaseReminder`.
    pub field: String,
    #[schema(value_type = Object)]
    pub value: Value,
}

impl UpdateReminderReq {
    /// # Errors
    ///
    /// Returns a `ValidationError` for an unknown field, a structured value, or a value that does
    /// not parse for the field.
    pub fn into_update(self) -> Result<ReminderUpdate, ValidationError> {
        let value = match self.value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => String::new(),
            other => {
                return Err(ValidationError::InvalidFieldValue {
                    field: "value",
                    value: other.to_string(),
                })
            }
        };
        ReminderUpdate::from_field(&self.field, &value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CalendarEventRes {
    pub id: String,
    pub title: String,
    /// Local date-time, `YYYY-MM-DDTHH:MM:SS`.
    pub start: String,
}

impl From<CalendarEvent> for CalendarEventRes {
    fn from(event: CalendarEvent) -> Self {
        Self {
            id: event.id,
            title: event.title,
            start: event.start.format(EVENT_START_FORMAT).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CalendarRes {
    pub events: Vec<CalendarEventRes>,
}
