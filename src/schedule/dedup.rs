use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};

/// One reminder owed for a plan, before it is fanned out to device tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderSlot {
    pub payment_date: NaiveDate,
    pub scheduled_at: DateTime<Utc>,
}

/// Drop slots already queued for the plan and slots not strictly after `now`.
///
/// Also drops repeats within `candidates`, so the result never holds two slots
/// with the same instant.
pub fn retain_new_slots(
    candidates: Vec<ReminderSlot>,
    existing: &HashSet<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Vec<ReminderSlot> {
    let mut seen = HashSet::with_capacity(candidates.len());

    candidates
        .into_iter()
        .filter(|slot| slot.scheduled_at > now)
        .filter(|slot| !existing.contains(&slot.scheduled_at))
        .filter(|slot| seen.insert(slot.scheduled_at))
        .collect()
}
