// Background expiry sweep.
//
// Expired sessions are already rejected by the liveness checks; the sweep
// just reclaims their memory, so a skipped cycle loses nothing.

use super::clock::Clock;
use super::storage::SessionStorage;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, info};

/// Spawn a task that periodically removes expired sessions from the store.
///
/// The returned `JoinHandle` is the only way to stop the task; aborting it
/// mid-cycle is safe because each sweep is self-terminating.
pub fn spawn_cleanup_task(
    storage: Arc<dyn SessionStorage>,
    clock: Arc<dyn Clock>,
    cleanup_interval_secs: u64,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(cleanup_interval_secs));

        // interval fires immediately; swallow that first tick
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let removed = storage.cleanup_expired(clock.now()).await;
            if removed > 0 {
                info!("Session cleanup removed {} expired sessions", removed);
            } else {
                debug!("Session cleanup: no expired sessions");
            }
        }
    })
}
