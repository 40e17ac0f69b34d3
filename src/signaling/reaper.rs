//! Background sweep that evicts rooms with no recently-active members.
//!
//! The ordinary disconnect path is the primary reclamation mechanism; this
//! task is the safety net for rooms whose members vanished without a clean
//! close (half-open sockets).

use std::time::Duration;

use tokio::task::JoinHandle;

use crate::rooms::RoomTable;

/// Spawn the reaper loop. Runs until the process exits.
pub fn spawn(rooms: RoomTable, interval: Duration, stale_after: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // First tick fires immediately; skip it so a fresh start doesn't sweep.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = rooms.reap_idle(stale_after);
            if removed.is_empty() {
                tracing::debug!("idle sweep found nothing to reap");
            } else {
                tracing::info!(rooms = removed.len(), ids = ?removed, "reaped idle rooms");
            }
        }
    })
}
