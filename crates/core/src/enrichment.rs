//! Enrichment coordinator: attaches a representative image to each reminder.
//!
//! Lookups are dispatched and completed in two separate steps so the caller can run the network
//! call without holding the reminder list. Dispatch records which lookup is the latest for an
//! entry; completion re-checks the current list before writing anything:
//!
//! - a result from a lookup that has since been superseded is dropped;
//! - a result for an entry that was deleted is dropped;
//! - a result whose query no longer matches the entry's medicine is dropped;
//! - a failed lookup leaves the entry as it was and is only logged.

use crate::error::ExternalServiceError;
use crate::normalize::normalize;
use crate::reminders::{EnrichmentRequest, ReminderEntry, ReminderStore};
use medai_types::NonEmptyText;
use medai_uuid::{EntryId, LookupTicket, TicketGenerator};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Image state of one entry, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentStatus {
    /// A lookup is in flight.
    Pending,
    /// The entry has an image.
    Resolved,
    /// No image and nothing in flight.
    Absent,
}

/// What happened to a completed lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentOutcome {
    Applied { url: String },
    /// A newer lookup for the same entry was dispatched after this one.
    Superseded,
    /// The entry was removed (or the list re-seeded) while the lookup was in flight.
    EntryGone,
    /// The entry's medicine was edited to something the query no longer describes.
    QueryMismatch,
    /// The entry already had an image.
    AlreadyResolved,
    /// The search service answered but had no image.
    NoResult,
    Failed,
}

/// A lookup that has been registered and must now be executed by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchedLookup {
    pub ticket: LookupTicket,
    pub entry: EntryId,
    pub query: NonEmptyText,
}

#[derive(Debug)]
struct InFlight {
    ticket: LookupTicket,
    query: NonEmptyText,
}

#[derive(Debug, Default)]
pub struct EnrichmentCoordinator {
    tickets: TicketGenerator,
    in_flight: HashMap<EntryId, InFlight>,
}

impl EnrichmentCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a lookup for `request`.
    ///
    /// Returns `None` when an identical query for the same entry is already in flight. Otherwise
    /// the new lookup becomes the only one whose result can be applied to the entry.
    pub fn dispatch(&mut self, request: EnrichmentRequest) -> Option<DispatchedLookup> {
        if let Some(existing) = self.in_flight.get(&request.entry) {
            if existing.query == request.query {
                tracing::debug!(
                    entry = %request.entry,
                    query = %request.query,
                    "lookup already in flight"
                );
                return None;
            }
        }

        let ticket = self.tickets.next();
        tracing::debug!(
            entry = %request.entry,
            query = %request.query,
            %ticket,
            "dispatching image lookup"
        );

        let superseded = self.in_flight.insert(
            request.entry,
            InFlight {
                ticket,
                query: request.query.clone(),
            },
        );
        if let Some(previous) = superseded {
            tracing::debug!(
                entry = %request.entry,
                previous = %previous.ticket,
                "superseded image lookup"
            );
        }

        Some(DispatchedLookup {
            ticket,
            entry: request.entry,
            query: request.query,
        })
    }

    /// Applies the result of `lookup` to `store` if it is still relevant.
    pub fn complete(
        &mut self,
        store: &mut ReminderStore,
        lookup: &DispatchedLookup,
        result: Result<String, ExternalServiceError>,
    ) -> EnrichmentOutcome {
        let is_latest = self
            .in_flight
            .get(&lookup.entry)
            .is_some_and(|f| f.ticket == lookup.ticket);

        if !is_latest {
            let outcome = if store.get(lookup.entry).is_some() {
                EnrichmentOutcome::Superseded
            } else {
                EnrichmentOutcome::EntryGone
            };
            tracing::debug!(
                entry = %lookup.entry,
                ticket = %lookup.ticket,
                ?outcome,
                "discarding image lookup result"
            );
            return outcome;
        }
        self.in_flight.remove(&lookup.entry);

        let url = match result {
            Ok(url) => url.trim().to_string(),
            Err(e) => {
                tracing::warn!(
                    entry = %lookup.entry,
                    query = %lookup.query,
                    error = %e,
                    "image lookup failed"
                );
                return EnrichmentOutcome::Failed;
            }
        };
        if url.is_empty() {
            tracing::info!(
                entry = %lookup.entry,
                query = %lookup.query,
                "image search returned no result"
            );
            return EnrichmentOutcome::NoResult;
        }

        let outcome = match store.get(lookup.entry) {
            None => EnrichmentOutcome::EntryGone,
            Some(entry) if !entry.image_url.is_empty() => EnrichmentOutcome::AlreadyResolved,
            Some(entry) if !query_matches(&entry.medicine, lookup.query.as_str()) => {
                EnrichmentOutcome::QueryMismatch
            }
            Some(_) => {
                store.set_image_url(lookup.entry, url.clone());
                EnrichmentOutcome::Applied { url }
            }
        };

        if !matches!(outcome, EnrichmentOutcome::Applied { .. }) {
            tracing::debug!(
                entry = %lookup.entry,
                ticket = %lookup.ticket,
                ?outcome,
                "discarding image lookup result"
            );
        }
        outcome
    }

    /// Drops all bookkeeping for `entry`; any result still in flight for it will be discarded.
    pub fn forget(&mut self, entry: EntryId) {
        self.in_flight.remove(&entry);
    }

    /// Drops all bookkeeping, as when the list is re-seeded.
    pub fn reset(&mut self) {
        self.in_flight.clear();
    }

    pub fn is_pending(&self, entry: EntryId) -> bool {
        self.in_flight.contains_key(&entry)
    }

    pub fn status(&self, entry: &ReminderEntry) -> EnrichmentStatus {
        if !entry.image_url.is_empty() {
            EnrichmentStatus::Resolved
        } else if self.is_pending(entry.id) {
            EnrichmentStatus::Pending
        } else {
            EnrichmentStatus::Absent
        }
    }
}

/// Whether an image found for `query` still describes `medicine`.
fn query_matches(medicine: &str, query: &str) -> bool {
    normalize(medicine).eq_ignore_ascii_case(&normalize(query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prescription::MedicineRecord;
    use crate::reminders::ReminderUpdate;

    fn seeded(names: &[&str]) -> (ReminderStore, Vec<EnrichmentRequest>) {
        let mut store = ReminderStore::new();
        let records: Vec<MedicineRecord> = names
            .iter()
            .map(|n| MedicineRecord {
                medicine: n.to_string(),
                ..Default::default()
            })
            .collect();
        let requests = store.seed(&records);
        (store, requests)
    }

    fn url(name: &str) -> Result<String, ExternalServiceError> {
        Ok(format!("https://img.example/{name}.png"))
    }

    #[test]
    fn test_complete_applies_latest_result() {
        let (mut store, requests) = seeded(&["Aspirin"]);
        let mut coordinator = EnrichmentCoordinator::new();
        let lookup = coordinator.dispatch(requests[0].clone()).unwrap();

        assert_eq!(coordinator.status(&store.entries()[0]), EnrichmentStatus::Pending);

        let outcome = coordinator.complete(&mut store, &lookup, url("aspirin"));

        assert_eq!(
            outcome,
            EnrichmentOutcome::Applied {
                url: "https://img.example/aspirin.png".into()
            }
        );
        assert_eq!(store.entries()[0].image_url, "https://img.example/aspirin.png");
        assert_eq!(coordinator.status(&store.entries()[0]), EnrichmentStatus::Resolved);
    }

    #[test]
    fn test_duplicate_dispatch_is_not_reissued() {
        let (_store, requests) = seeded(&["Aspirin"]);
        let mut coordinator = EnrichmentCoordinator::new();

        assert!(coordinator.dispatch(requests[0].clone()).is_some());
        assert!(coordinator.dispatch(requests[0].clone()).is_none());
    }

    #[test]
    fn test_newer_lookup_supersedes_older() {
        let (mut store, requests) = seeded(&["Asp"]);
        let id = requests[0].entry;
        let mut coordinator = EnrichmentCoordinator::new();
        let first = coordinator.dispatch(requests[0].clone()).unwrap();

        let request = store
            .update(id, ReminderUpdate::Medicine("Aspirin".into()))
            .unwrap()
            .unwrap();
        let second = coordinator.dispatch(request).unwrap();
        assert!(second.ticket > first.ticket);

        // The newer lookup lands first, the older one afterwards.
        let applied = coordinator.complete(&mut store, &second, url("aspirin"));
        assert!(matches!(applied, EnrichmentOutcome::Applied { .. }));
        let late = coordinator.complete(&mut store, &first, url("asp"));
        assert_eq!(late, EnrichmentOutcome::Superseded);
        assert_eq!(store.get(id).unwrap().image_url, "https://img.example/aspirin.png");
    }

    #[test]
    fn test_result_for_removed_entry_does_not_touch_shifted_entry() {
        let (mut store, requests) = seeded(&["Aspirin", "Metformin"]);
        let mut coordinator = EnrichmentCoordinator::new();
        let lookups: Vec<DispatchedLookup> = requests
            .into_iter()
            .filter_map(|r| coordinator.dispatch(r))
            .collect();

        let removed = store.remove_at(0).unwrap();
        coordinator.forget(removed.id);

        let outcome = coordinator.complete(&mut store, &lookups[0], url("aspirin"));
        assert_eq!(outcome, EnrichmentOutcome::EntryGone);
        assert_eq!(store.entries()[0].medicine, "Metformin");
        assert_eq!(store.entries()[0].image_url, "");

        let outcome = coordinator.complete(&mut store, &lookups[1], url("metformin"));
        assert!(matches!(outcome, EnrichmentOutcome::Applied { .. }));
        assert_eq!(store.entries()[0].image_url, "https://img.example/metformin.png");
    }

    #[test]
    fn test_result_discarded_when_removed_without_forget() {
        let (mut store, requests) = seeded(&["Aspirin", "Metformin"]);
        let mut coordinator = EnrichmentCoordinator::new();
        let lookup = coordinator.dispatch(requests[0].clone()).unwrap();

        store.remove_at(0).unwrap();

        let outcome = coordinator.complete(&mut store, &lookup, url("aspirin"));
        assert_eq!(outcome, EnrichmentOutcome::EntryGone);
        assert_eq!(store.entries()[0].image_url, "");
    }

    #[test]
    fn test_query_mismatch_is_discarded() {
        let (mut store, requests) = seeded(&["Aspirin"]);
        let id = requests[0].entry;
        let mut coordinator = EnrichmentCoordinator::new();
        let lookup = coordinator.dispatch(requests[0].clone()).unwrap();

        store
            .update(id, ReminderUpdate::Medicine("   ".into()))
            .unwrap();
        let outcome = coordinator.complete(&mut store, &lookup, url("aspirin"));

        assert_eq!(outcome, EnrichmentOutcome::QueryMismatch);
        assert_eq!(store.get(id).unwrap().image_url, "");
    }

    #[test]
    fn test_query_match_ignores_case_and_noise() {
        assert!(query_matches("aspirin!", "Aspirin"));
        assert!(query_matches("  Vitamin  D3 ", "vitamin d3"));
        assert!(!query_matches("Aspirin", "Asp"));
    }

    #[test]
    fn test_failure_and_empty_result_leave_entry_untouched() {
        let (mut store, requests) = seeded(&["Aspirin", "Ibuprofen"]);
        let mut coordinator = EnrichmentCoordinator::new();
        let failing = coordinator.dispatch(requests[0].clone()).unwrap();
        let empty = coordinator.dispatch(requests[1].clone()).unwrap();

        let outcome = coordinator.complete(
            &mut store,
            &failing,
            Err(ExternalServiceError::Transport {
                service: "image search",
                message: "connection refused".into(),
            }),
        );
        assert_eq!(outcome, EnrichmentOutcome::Failed);

        let outcome = coordinator.complete(&mut store, &empty, Ok(String::new()));
        assert_eq!(outcome, EnrichmentOutcome::NoResult);

        for entry in store.entries() {
            assert_eq!(entry.image_url, "");
            assert_eq!(coordinator.status(entry), EnrichmentStatus::Absent);
        }
    }

    #[test]
    fn test_reset_discards_everything_in_flight() {
        let (mut store, requests) = seeded(&["Aspirin"]);
        let mut coordinator = EnrichmentCoordinator::new();
        let lookup = coordinator.dispatch(requests[0].clone()).unwrap();

        store.seed(&[MedicineRecord {
            medicine: "Aspirin".into(),
            ..Default::default()
        }]);
        coordinator.reset();

        let outcome = coordinator.complete(&mut store, &lookup, url("aspirin"));
        assert_eq!(outcome, EnrichmentOutcome::EntryGone);
        assert_eq!(store.entries()[0].image_url, "");
    }
}
