//! One user's prescription-to-reminder session.
//!
//! [`ReminderSession`] is the single owner of mutation for a reminder list: every operation takes
//! the same async lock, so edits, seeding and late image results never interleave mid-update.
//! Image lookups run as spawned tasks and only take the lock again to apply their result, which
//! goes through the coordinator's staleness checks.

use crate::calendar::{derive_events, expand_course, CalendarEvent};
use crate::clients::{ImageSearch, OcrService};
use crate::enrichment::{
    DispatchedLookup, EnrichmentCoordinator, EnrichmentOutcome, EnrichmentStatus,
};
use crate::error::{MedAiResult, ValidationError};
use crate::normalize::normalize;
use crate::prescription::{parse_medicine_guesses, MedicineRecord, RawOcrResult};
use crate::reminders::{EnrichmentRequest, ReminderEntry, ReminderStore, ReminderUpdate};
use chrono::NaiveDate;
use medai_uuid::EntryId;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;

/// Result of turning one OCR response into a fresh reminder list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSummary {
    /// Normalized full text of the prescription.
    pub extracted_text: String,
    pub records: Vec<MedicineRecord>,
    pub entries: Vec<ReminderEntry>,
}

/// A reminder together with its image state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderSnapshot {
    #[serde(flatten)]
    pub entry: ReminderEntry,
    pub enrichment: EnrichmentStatus,
}

#[derive(Debug, Default)]
struct SessionState {
    store: ReminderStore,
    coordinator: EnrichmentCoordinator,
}

impl SessionState {
    fn dispatch_all(&mut self, requests: Vec<EnrichmentRequest>) -> Vec<DispatchedLookup> {
        requests
            .into_iter()
            .filter_map(|request| self.coordinator.dispatch(request))
            .collect()
    }
}

pub struct ReminderSession {
    state: Arc<Mutex<SessionState>>,
    search: Arc<dyn ImageSearch>,
    lookups: Mutex<JoinSet<EnrichmentOutcome>>,
}

impl ReminderSession {
    pub fn new(search: Arc<dyn ImageSearch>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::default())),
            search,
            lookups: Mutex::new(JoinSet::new()),
        }
    }

    /// Seeds the reminder list from an OCR response and starts image lookups for it.
    ///
    /// The previous list is replaced wholesale and results of lookups still in flight for it are
    /// discarded when they arrive.
    pub async fn ingest(&self, raw: RawOcrResult) -> IngestSummary {
        let extracted_text = normalize(&raw.extracted_text);
        let records = parse_medicine_guesses(&raw.medicine_data);

        let (entries, lookups) = {
            let mut state = self.state.lock().await;
            state.coordinator.reset();
            let requests = state.store.seed(&records);
            let lookups = state.dispatch_all(requests);
            (state.store.entries().to_vec(), lookups)
        };

        tracing::info!(
            records = records.len(),
            lookups = lookups.len(),
            "ingested prescription"
        );
        self.spawn_lookups(lookups).await;

        IngestSummary {
            extracted_text,
            records,
            entries,
        }
    }

    /// Runs `image` through `ocr` and ingests the result.
    ///
    /// # Errors
    ///
    /// Returns `MedAiError::ExternalService` if the OCR call fails; the current list is left as it
    /// was.
    pub async fn extract(
        &self,
        ocr: &dyn OcrService,
        image: Vec<u8>,
        file_name: &str,
    ) -> MedAiResult<IngestSummary> {
        let raw = ocr.extract(image, file_name).await.map_err(|e| {
            tracing::warn!(error = %e, file_name, "OCR failed; reminder list unchanged");
            e
        })?;
        Ok(self.ingest(raw).await)
    }

    /// Appends a blank reminder.
    pub async fn add(&self) -> ReminderEntry {
        let mut state = self.state.lock().await;
        let id = state.store.add();
        tracing::debug!(entry = %id, "added reminder");
        state
            .store
            .get(id)
            .cloned()
            .unwrap_or_else(ReminderEntry::empty)
    }

    /// Edits one field of the reminder with `id` and returns it as updated.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if `id` is unknown or the value is invalid.
    pub async fn update(
        &self,
        id: EntryId,
        update: ReminderUpdate,
    ) -> Result<ReminderEntry, ValidationError> {
        let (entry, lookups) = {
            let mut state = self.state.lock().await;
            let request = state.store.update(id, update)?;
            let lookups = state.dispatch_all(request.into_iter().collect());
            let entry = state
                .store
                .get(id)
                .cloned()
                .ok_or(ValidationError::UnknownEntry(id))?;
            (entry, lookups)
        };

        self.spawn_lookups(lookups).await;
        Ok(entry)
    }

    /// [`ReminderSession::update`] addressed by current list position.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::IndexOutOfRange` if `index` is past the end of the list.
    pub async fn update_at(
        &self,
        index: usize,
        update: ReminderUpdate,
    ) -> Result<ReminderEntry, ValidationError> {
        let id = self.state.lock().await.store.id_at(index)?;
        self.update(id, update).await
    }

    /// Removes the reminder with `id`. A lookup still in flight for it is discarded on arrival.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownEntry` if `id` is unknown.
    pub async fn remove(&self, id: EntryId) -> Result<ReminderEntry, ValidationError> {
        let mut state = self.state.lock().await;
        let removed = state.store.remove(id)?;
        state.coordinator.forget(id);
        tracing::debug!(entry = %id, "removed reminder");
        Ok(removed)
    }

    /// [`ReminderSession::remove`] addressed by current list position.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::IndexOutOfRange` if `index` is past the end of the list.
    pub async fn remove_at(&self, index: usize) -> Result<ReminderEntry, ValidationError> {
        let mut state = self.state.lock().await;
        let id = state.store.id_at(index)?;
        let removed = state.store.remove(id)?;
        state.coordinator.forget(id);
        tracing::debug!(entry = %id, index, "removed reminder");
        Ok(removed)
    }

    pub async fn entries(&self) -> Vec<ReminderEntry> {
        self.state.lock().await.store.entries().to_vec()
    }

    pub async fn get(&self, id: EntryId) -> Option<ReminderEntry> {
        self.state.lock().await.store.get(id).cloned()
    }

    /// Current list with each entry's image state.
    pub async fn snapshot(&self) -> Vec<ReminderSnapshot> {
        let state = self.state.lock().await;
        state
            .store
            .entries()
            .iter()
            .map(|entry| ReminderSnapshot {
                entry: entry.clone(),
                enrichment: state.coordinator.status(entry),
            })
            .collect()
    }

    pub async fn snapshot_of(&self, id: EntryId) -> Option<ReminderSnapshot> {
        let state = self.state.lock().await;
        state.store.get(id).map(|entry| ReminderSnapshot {
            entry: entry.clone(),
            enrichment: state.coordinator.status(entry),
        })
    }

    /// Calendar events for the current list, placed on `anchor`.
    pub async fn calendar(&self, anchor: NaiveDate) -> Vec<CalendarEvent> {
        derive_events(self.state.lock().await.store.entries(), anchor)
    }

    /// Every daily dose of the current list, starting on `first_day`.
    pub async fn course(&self, first_day: NaiveDate) -> Vec<CalendarEvent> {
        expand_course(self.state.lock().await.store.entries(), first_day)
    }

    /// Waits for every image lookup started so far, including ones started while waiting.
    pub async fn settle(&self) -> Vec<EnrichmentOutcome> {
        let mut outcomes = Vec::new();
        loop {
            let mut tasks = std::mem::take(&mut *self.lookups.lock().await);
            if tasks.is_empty() {
                return outcomes;
            }
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(e) => tracing::error!(error = %e, "image lookup task failed"),
                }
            }
        }
    }

    async fn spawn_lookups(&self, lookups: Vec<DispatchedLookup>) {
        if lookups.is_empty() {
            return;
        }

        let mut tasks = self.lookups.lock().await;
        // Reap finished lookups so a long-lived session does not accumulate them.
        while let Some(joined) = tasks.try_join_next() {
            if let Err(e) = joined {
                tracing::error!(error = %e, "image lookup task failed");
            }
        }

        for lookup in lookups {
            let state = Arc::clone(&self.state);
            let search = Arc::clone(&self.search);
            tasks.spawn(async move {
                let result = search.find_image(lookup.query.as_str()).await;
                let mut guard = state.lock().await;
                let SessionState { store, coordinator } = &mut *guard;
                coordinator.complete(store, &lookup, result)
            });
        }
    }
}
