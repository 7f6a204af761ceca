//! Projection of reminders into calendar events.
//!
//! Events are never stored: they are recomputed from the current reminder list on every request,
//! so they cannot drift from it. Reminders only capture a time of day, so the caller supplies the
//! anchor date the events are placed on (normally today's local date).

use crate::reminders::ReminderEntry;
use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: NaiveDateTime,
}

/// One event per reminder that has both a medicine and a time, placed on `anchor`.
///
/// Event ids are the entry ids, so an event keeps its id when entries before it are deleted.
pub fn derive_events(entries: &[ReminderEntry], anchor: NaiveDate) -> Vec<CalendarEvent> {
    entries
        .iter()
        .filter_map(|entry| {
            let start = schedulable(entry)?;
            Some(CalendarEvent {
                id: entry.id.to_string(),
                title: title(entry),
                start: anchor.and_time(start),
            })
        })
        .collect()
}

/// Every daily dose of every schedulable reminder, for `days_to_take` days starting at `first_day`.
///
/// Occurrence ids are `<entry id>-<day index>`, day index starting at zero. Output is ordered by
/// start time, ties broken by list order.
pub fn expand_course(entries: &[ReminderEntry], first_day: NaiveDate) -> Vec<CalendarEvent> {
    let mut events: Vec<CalendarEvent> = entries
        .iter()
        .filter_map(|entry| schedulable(entry).map(|time| (entry, time)))
        .flat_map(|(entry, time)| {
            (0..entry.days_to_take.get()).filter_map(move |day| {
                let date = first_day.checked_add_days(Days::new(u64::from(day)))?;
                Some(CalendarEvent {
                    id: format!("{}-{}", entry.id, day),
                    title: title(entry),
                    start: date.and_time(time),
                })
            })
        })
        .collect();

    // Stable sort keeps list order for doses at the same instant.
    events.sort_by_key(|e| e.start);
    events
}

fn schedulable(entry: &ReminderEntry) -> Option<chrono::NaiveTime> {
    if entry.medicine.is_empty() {
        return None;
    }
    entry.time.map(|t| t.as_naive())
}

fn title(entry: &ReminderEntry) -> String {
    format!("{} ({})", entry.medicine, entry.dosage)
}
