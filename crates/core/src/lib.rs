//! # MedAI Core
//!
//! Core logic for turning a photographed prescription into a medication reminder schedule.
//!
//! The pipeline, front to back:
//! - [`normalize`]: strips OCR noise from text
//! - [`prescription`]: maps untyped OCR guesses into [`MedicineRecord`] values
//! - [`reminders`]: the editable reminder list, seeded from records
//! - [`enrichment`]: attaches images to reminders without ever writing a stale result
//! - [`calendar`]: projects reminders into calendar events
//! - [`session`]: ties the above together behind one async lock
//!
//! **No API concerns**: HTTP servers, authentication of API callers and request DTOs belong in
//! `api-rest` and `api-shared`.

pub mod calendar;
pub mod clients;
pub mod config;
pub mod constants;
pub mod enrichment;
pub mod error;
pub mod normalize;
pub mod prescription;
pub mod registration;
pub mod reminders;
pub mod session;
pub mod validation;

pub use calendar::{derive_events, expand_course, CalendarEvent};
pub use clients::{DisabledImageSearch, GoogleImageSearch, HttpOcrClient, ImageSearch, OcrService};
pub use config::{CoreConfig, ImageSearchCredentials};
pub use enrichment::{EnrichmentCoordinator, EnrichmentOutcome, EnrichmentStatus};
pub use error::{
    AuthError, ConfigError, ExternalServiceError, MedAiError, MedAiResult, ValidationError,
};
pub use normalize::{normalize, normalize_opt};
pub use prescription::{parse_medicine_guesses, MedicineRecord, RawOcrResult};
pub use registration::{Confirmation, PhoneVerifier, RegistrationFlow, VerifiedUser};
pub use reminders::{ReminderEntry, ReminderStore, ReminderUpdate};
pub use session::{IngestSummary, ReminderSession, ReminderSnapshot};

pub use medai_types::{DaysToTake, NonEmptyText, PhoneNumber, TimeOfDay, ValueError};
pub use medai_uuid::EntryId;
