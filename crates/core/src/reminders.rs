//! The reminder schedule store.
//!
//! [`ReminderStore`] exclusively owns the user's editable list of [`ReminderEntry`] values. Every
//! entry carries an [`EntryId`] allocated at creation, so edits, deletions and late image results
//! address the entry itself rather than whatever currently sits at a list position. Positional
//! variants of the mutators are kept for callers that work from a freshly enumerated list; they
//! resolve the index to an id at call time.
//!
//! Setting a non-empty `medicine` on an entry without an image is not a pure update: the mutator
//! returns an [`EnrichmentRequest`] that the caller must hand to the enrichment coordinator.

use crate::error::ValidationError;
use crate::prescription::MedicineRecord;
use medai_types::{DaysToTake, NonEmptyText, TimeOfDay};
use medai_uuid::EntryId;
use serde::{Deserialize, Serialize};

/// One reminder as the user sees and edits it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderEntry {
    pub id: EntryId,
    pub medicine: String,
    pub dosage: String,
    pub frequency: String,
    /// Time of day the reminder fires; serialized as `""` when unset.
    #[serde(with = "time_or_empty")]
    pub time: Option<TimeOfDay>,
    pub days_to_take: DaysToTake,
    pub purchase_reminder: bool,
    /// Representative image, filled in asynchronously; `""` until then.
    pub image_url: String,
}

impl ReminderEntry {
    /// A blank reminder with every field at its zero value.
    pub fn empty() -> Self {
        Self {
            id: EntryId::new(),
            medicine: String::new(),
            dosage: String::new(),
            frequency: String::new(),
            time: None,
            days_to_take: DaysToTake::ONE,
            purchase_reminder: false,
            image_url: String::new(),
        }
    }

    /// A reminder seeded from a parsed prescription line.
    pub fn from_record(record: &MedicineRecord) -> Self {
        Self {
            medicine: record.medicine.clone(),
            dosage: record.dosage.clone(),
            frequency: record.schedule.clone(),
            days_to_take: DaysToTake::at_least_one(record.days_to_take),
            ..Self::empty()
        }
    }

    fn enrichment_request(&self) -> Option<EnrichmentRequest> {
        if !self.image_url.is_empty() {
            return None;
        }
        NonEmptyText::new(&self.medicine)
            .ok()
            .map(|query| EnrichmentRequest {
                entry: self.id,
                query,
            })
    }
}

mod time_or_empty {
    use medai_types::TimeOfDay;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &Option<TimeOfDay>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(t) => serializer.collect_str(t),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<TimeOfDay>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if raw.trim().is_empty() {
            return Ok(None);
        }
        TimeOfDay::parse(&raw)
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}

/// A request to look up an image for `entry` using `query`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentRequest {
    pub entry: EntryId,
    pub query: NonEmptyText,
}

/// A single-field edit of a reminder.
///
/// Over JSON this is `{"field": "<camelCase name>", "value": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum ReminderUpdate {
    Medicine(String),
    Dosage(String),
    Frequency(String),
    /// `HH:MM`, or an empty string to clear the time.
    Time(String),
    DaysToTake(u32),
    PurchaseReminder(bool),
}

impl ReminderUpdate {
    /// Builds an update from a field name and its textual value, as typed into a form or passed
    /// on a command line. Field names are accepted in camelCase or snake_case.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownField` for an unrecognised field, or
    /// `ValidationError::InvalidFieldValue` if the value does not parse for that field.
    pub fn from_field(field: &str, value: &str) -> Result<Self, ValidationError> {
        let update = match field {
            "medicine" => Self::Medicine(value.to_owned()),
            "dosage" => Self::Dosage(value.to_owned()),
            "frequency" => Self::Frequency(value.to_owned()),
            "time" => Self::Time(value.to_owned()),
            "daysToTake" | "days_to_take" => {
                let days = value.trim().parse::<u32>().map_err(|_| {
                    ValidationError::InvalidFieldValue {
                        field: "daysToTake",
                        value: value.to_owned(),
                    }
                })?;
                Self::DaysToTake(days)
            }
            "purchaseReminder" | "purchase_reminder" => {
                let flag = value.trim().parse::<bool>().map_err(|_| {
                    ValidationError::InvalidFieldValue {
                        field: "purchaseReminder",
                        value: value.to_owned(),
                    }
                })?;
                Self::PurchaseReminder(flag)
            }
            other => return Err(ValidationError::UnknownField(other.to_owned())),
        };
        Ok(update)
    }
}

/// Ordered, editable list of reminders for one session.
#[derive(Debug, Default)]
pub struct ReminderStore {
    entries: Vec<ReminderEntry>,
}

impl ReminderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ReminderEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: EntryId) -> Option<&ReminderEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Current list position of `id`, if it still exists.
    pub fn position(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// Id of the entry currently at `index`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::IndexOutOfRange` if `index >= len`.
    pub fn id_at(&self, index: usize) -> Result<EntryId, ValidationError> {
        self.entries
            .get(index)
            .map(|e| e.id)
            .ok_or(ValidationError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            })
    }

    /// Replaces the whole list with one entry per record.
    ///
    /// Any previous list, including unsaved edits, is discarded; records are never merged into it.
    /// Returns an enrichment request for every new entry that names a medicine.
    pub fn seed(&mut self, records: &[MedicineRecord]) -> Vec<EnrichmentRequest> {
        self.entries = records.iter().map(ReminderEntry::from_record).collect();
        tracing::info!(entries = self.entries.len(), "seeded reminder list");

        self.entries
            .iter()
            .filter_map(ReminderEntry::enrichment_request)
            .collect()
    }

    /// Appends a blank reminder and returns its id.
    pub fn add(&mut self) -> EntryId {
        let entry = ReminderEntry::empty();
        let id = entry.id;
        self.entries.push(entry);
        id
    }

    /// Applies one field edit to the entry with `id`.
    ///
    /// Returns an enrichment request when the edit set a non-empty medicine on an entry that has
    /// no image yet.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownEntry` if no entry has `id`, or a value error if the new
    /// value is invalid (a time that is not `HH:MM`, zero days). The entry is unchanged on error.
    pub fn update(
        &mut self,
        id: EntryId,
        update: ReminderUpdate,
    ) -> Result<Option<EnrichmentRequest>, ValidationError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(ValidationError::UnknownEntry(id))?;

        match update {
            ReminderUpdate::Medicine(medicine) => {
                entry.medicine = medicine;
                return Ok(entry.enrichment_request());
            }
            ReminderUpdate::Dosage(dosage) => entry.dosage = dosage,
            ReminderUpdate::Frequency(frequency) => entry.frequency = frequency,
            ReminderUpdate::Time(time) => {
                entry.time = if time.trim().is_empty() {
                    None
                } else {
                    Some(TimeOfDay::parse(&time)?)
                };
            }
            ReminderUpdate::DaysToTake(days) => entry.days_to_take = DaysToTake::new(days)?,
            ReminderUpdate::PurchaseReminder(flag) => entry.purchase_reminder = flag,
        }

        Ok(None)
    }

    /// [`ReminderStore::update`] addressed by current list position.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::IndexOutOfRange` if `index >= len`, otherwise as `update`.
    pub fn update_at(
        &mut self,
        index: usize,
        update: ReminderUpdate,
    ) -> Result<Option<EnrichmentRequest>, ValidationError> {
        let id = self.id_at(index)?;
        self.update(id, update)
    }

    /// Removes the entry with `id`. Later entries move up one position and keep their ids.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownEntry` if no entry has `id`.
    pub fn remove(&mut self, id: EntryId) -> Result<ReminderEntry, ValidationError> {
        let index = self
            .position(id)
            .ok_or(ValidationError::UnknownEntry(id))?;
        Ok(self.entries.remove(index))
    }

    /// [`ReminderStore::remove`] addressed by current list position.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::IndexOutOfRange` if `index >= len`.
    pub fn remove_at(&mut self, index: usize) -> Result<ReminderEntry, ValidationError> {
        let id = self.id_at(index)?;
        self.remove(id)
    }

    /// Writes the image of an existing entry. Only the enrichment coordinator calls this, after
    /// its own staleness checks.
    pub(crate) fn set_image_url(&mut self, id: EntryId, url: String) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.image_url = url;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(medicine: &str, days: Option<u32>) -> MedicineRecord {
        MedicineRecord {
            medicine: medicine.into(),
            dosage: "10mg".into(),
            schedule: "twice daily".into(),
            days_to_take: days,
        }
    }

    #[test]
    fn test_seed_creates_one_entry_per_record() {
        let mut store = ReminderStore::new();
        let requests = store.seed(&[record("A", Some(30)), record("", None), record("C", Some(0))]);

        assert_eq!(store.len(), 3);
        for entry in store.entries() {
            assert!(entry.days_to_take.get() >= 1);
            assert_eq!(entry.image_url, "");
            assert_eq!(entry.time, None);
            assert!(!entry.purchase_reminder);
            assert_eq!(entry.frequency, "twice daily");
        }
        assert_eq!(store.entries()[0].days_to_take.get(), 30);
        assert_eq!(store.entries()[2].days_to_take.get(), 1);

        let queries: Vec<&str> = requests.iter().map(|r| r.query.as_str()).collect();
        assert_eq!(queries, vec!["A", "C"]);
    }

    #[test]
    fn test_reseed_replaces_edited_list() {
        let mut store = ReminderStore::new();
        store.seed(&[record("Old", None)]);
        let old_id = store.id_at(0).unwrap();
        store
            .update(old_id, ReminderUpdate::Time("08:00".into()))
            .unwrap();
        store.add();

        store.seed(&[record("New", None)]);

        assert_eq!(store.len(), 1);
        assert_eq!(store.entries()[0].medicine, "New");
        assert!(store.get(old_id).is_none());
    }

    #[test]
    fn test_add_appends_blank_entry() {
        let mut store = ReminderStore::new();
        store.seed(&[record("A", None)]);
        let id = store.add();

        assert_eq!(store.len(), 2);
        assert_eq!(store.position(id), Some(1));
        let entry = store.get(id).unwrap();
        assert_eq!(entry.medicine, "");
        assert_eq!(entry.days_to_take, DaysToTake::ONE);
        assert_eq!(entry.time, None);
    }

    #[test]
    fn test_update_medicine_requests_enrichment_only_when_needed() {
        let mut store = ReminderStore::new();
        let id = store.add();

        let request = store
            .update(id, ReminderUpdate::Medicine("Ibuprofen".into()))
            .unwrap();
        assert_eq!(request.map(|r| r.query.to_string()), Some("Ibuprofen".to_string()));

        let blank = store
            .update(id, ReminderUpdate::Medicine("   ".into()))
            .unwrap();
        assert_eq!(blank, None);

        store.set_image_url(id, "https://img/ibuprofen.png".into());
        let resolved = store
            .update(id, ReminderUpdate::Medicine("Naproxen".into()))
            .unwrap();
        assert_eq!(resolved, None);
        assert_eq!(store.get(id).unwrap().medicine, "Naproxen");
    }

    #[test]
    fn test_update_validates_values() {
        let mut store = ReminderStore::new();
        let id = store.add();

        assert!(matches!(
            store.update(id, ReminderUpdate::Time("9am".into())),
            Err(ValidationError::InvalidValue(_))
        ));
        assert!(matches!(
            store.update(id, ReminderUpdate::DaysToTake(0)),
            Err(ValidationError::InvalidValue(_))
        ));
        assert_eq!(store.get(id).unwrap(), &{
            let mut blank = ReminderEntry::empty();
            blank.id = id;
            blank
        });

        store.update(id, ReminderUpdate::Time("09:30".into())).unwrap();
        assert_eq!(store.get(id).unwrap().time, TimeOfDay::from_hm(9, 30));
        store.update(id, ReminderUpdate::Time("".into())).unwrap();
        assert_eq!(store.get(id).unwrap().time, None);

        store.update(id, ReminderUpdate::DaysToTake(14)).unwrap();
        store.update(id, ReminderUpdate::PurchaseReminder(true)).unwrap();
        let entry = store.get(id).unwrap();
        assert_eq!(entry.days_to_take.get(), 14);
        assert!(entry.purchase_reminder);
    }

    #[test]
    fn test_course_length_is_capped() {
        let mut store = ReminderStore::new();
        store.seed(&[record("Long", Some(u32::MAX))]);
        let id = store.id_at(0).unwrap();
        assert_eq!(store.entries()[0].days_to_take.get(), DaysToTake::MAX_DAYS);

        assert!(matches!(
            store.update(id, ReminderUpdate::DaysToTake(u32::MAX)),
            Err(ValidationError::InvalidValue(medai_types::ValueError::TooManyDays(_)))
        ));
        assert_eq!(store.get(id).unwrap().days_to_take.get(), DaysToTake::MAX_DAYS);

        store.update(id, ReminderUpdate::DaysToTake(7)).unwrap();
        assert_eq!(store.get(id).unwrap().days_to_take.get(), 7);
    }

    #[test]
    fn test_positional_operations_guard_range() {
        let mut store = ReminderStore::new();
        store.seed(&[record("A", None)]);

        assert_eq!(
            store.update_at(1, ReminderUpdate::Dosage("5mg".into())),
            Err(ValidationError::IndexOutOfRange { index: 1, len: 1 })
        );
        assert!(matches!(
            store.remove_at(3),
            Err(ValidationError::IndexOutOfRange { index: 3, len: 1 })
        ));

        store.update_at(0, ReminderUpdate::Dosage("5mg".into())).unwrap();
        assert_eq!(store.entries()[0].dosage, "5mg");
    }

    #[test]
    fn test_remove_shifts_positions_but_keeps_ids() {
        let mut store = ReminderStore::new();
        store.seed(&[record("A", None), record("B", None), record("C", None)]);
        let b = store.id_at(1).unwrap();

        let removed = store.remove_at(0).unwrap();
        assert_eq!(removed.medicine, "A");
        assert_eq!(store.position(b), Some(0));
        assert_eq!(store.get(b).unwrap().medicine, "B");

        assert_eq!(
            store.remove(removed.id),
            Err(ValidationError::UnknownEntry(removed.id))
        );
        assert_eq!(
            store.update(removed.id, ReminderUpdate::Dosage("1mg".into())),
            Err(ValidationError::UnknownEntry(removed.id))
        );
    }

    #[test]
    fn test_update_from_field_names() {
        assert_eq!(
            ReminderUpdate::from_field("daysToTake", "30").unwrap(),
            ReminderUpdate::DaysToTake(30)
        );
        assert_eq!(
            ReminderUpdate::from_field("purchase_reminder", "true").unwrap(),
            ReminderUpdate::PurchaseReminder(true)
        );
        assert!(matches!(
            ReminderUpdate::from_field("daysToTake", "many"),
            Err(ValidationError::InvalidFieldValue { field: "daysToTake", .. })
        ));
        assert!(matches!(
            ReminderUpdate::from_field("imageUrl", "x"),
            Err(ValidationError::UnknownField(f)) if f == "imageUrl"
        ));
    }

    #[test]
    fn test_entry_json_shape() {
        let mut store = ReminderStore::new();
        let id = store.add();
        store.update(id, ReminderUpdate::Time("07:45".into())).unwrap();

        let json = serde_json::to_value(store.get(id).unwrap()).unwrap();
        assert_eq!(json["id"], id.to_string());
        assert_eq!(json["time"], "07:45");
        assert_eq!(json["daysToTake"], 1);
        assert_eq!(json["purchaseReminder"], false);
        assert_eq!(json["imageUrl"], "");

        let blank = serde_json::to_value(ReminderEntry::empty()).unwrap();
        assert_eq!(blank["time"], "");

        let update: ReminderUpdate =
            serde_json::from_value(serde_json::json!({ "field": "time", "value": "08:00" }))
                .unwrap();
        assert_eq!(update, ReminderUpdate::Time("08:00".into()));
    }
}
