// Per-user session cap policy.
//
// Pure planning over a user's current records; the store applies the plan
// while still holding its write lock, so a concurrent create for the same
// user cannot slip past the cap.

use super::types::Session;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Pick the sessions to evict so that, after one more insert, the user's
/// live session count stays within `max_sessions`.
///
/// Expired records are reclaimed outright and do not count toward the cap.
/// Live records are evicted oldest-activity-first; ties break on session id
/// so the outcome is reproducible.
pub(crate) fn plan_evictions(
    user_sessions: &[&Session],
    max_sessions: usize,
    now: DateTime<Utc>,
) -> Vec<Uuid> {
    let mut evict: Vec<Uuid> = user_sessions
        .iter()
        .filter(|s| !s.is_live(now))
        .map(|s| s.session_id)
        .collect();

    let mut live: Vec<&&Session> = user_sessions.iter().filter(|s| s.is_live(now)).collect();
    live.sort_by(|a, b| {
        a.last_activity
            .cmp(&b.last_activity)
            .then(a.session_id.cmp(&b.session_id))
    });

    let overflow = (live.len() + 1).saturating_sub(max_sessions);
    evict.extend(live.iter().take(overflow).map(|s| s.session_id));

    evict
}
