//! Scheduler-side helpers over a set of checklist entries.
//!
//! The periodic check timer and the inbound message path both touch the same
//! entries, so every entry is shared behind a single mutex and each path
//! holds the lock for the whole of its update.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use super::entry::{CheckState, ChecklistEntry};
use super::ice_err::IceError;
use crate::config::CheckConfig;
use crate::stun::TransactionId;

/// Entry shared between the check scheduler and the receive path.
pub type SharedEntry = Arc<Mutex<ChecklistEntry>>;

pub fn share(entry: ChecklistEntry) -> SharedEntry {
    Arc::new(Mutex::new(entry))
}

/// Sort entries in descending order of pair priority.
pub fn sort_entries_by_priority(entries: &mut [ChecklistEntry]) {
    entries.sort();
}

/// Finds the entry a response with `id` belongs to.
pub fn find_entry_by_transaction(
    entries: &[SharedEntry],
    id: &TransactionId,
) -> Result<Option<SharedEntry>, IceError> {
    for entry in entries {
        let guard = entry.lock().map_err(|_| IceError::PoisonedEntry)?;
        if guard.matches_transaction(id) {
            return Ok(Some(Arc::clone(entry)));
        }
    }
    Ok(None)
}

/// The scheduler gave up on this check once the retransmission budget is spent.
pub fn check_timed_out(entry: &ChecklistEntry, config: &CheckConfig) -> bool {
    entry.state() == CheckState::InProgress && entry.exceeded_check_budget(config.max_checks)
}

/// A nominated pair needs a keep-alive once the interval elapsed since the
/// last request or confirmed response.
pub fn due_for_keepalive(entry: &ChecklistEntry, config: &CheckConfig, now: Instant) -> bool {
    if !entry.is_nominated() {
        return false;
    }
    let last = match (entry.last_check_sent_at(), entry.last_connected_response_at()) {
        (Some(sent), Some(confirmed)) => sent.max(confirmed),
        (Some(at), None) | (None, Some(at)) => at,
        (None, None) => return true,
    };
    now.saturating_duration_since(last) >= config.keepalive_interval()
}

/// True when no CreatePermission answer was received within the permission lifetime.
pub fn permission_needs_refresh(entry: &ChecklistEntry, config: &CheckConfig, now: Instant) -> bool {
    match entry.turn_permission_response_at() {
        Some(at) => now.saturating_duration_since(at) >= config.permission_lifetime(),
        None => true,
    }
}
