use tracing::warn;

use crate::models::HistoryEntry;
use crate::store::SharedStore;

/// Best-effort, append-only movement log. An observer of the ledger, never a
/// correctness dependency: appends run detached from the mutation that
/// produced them, and failures are logged and swallowed.
#[derive(Clone)]
pub struct HistoryRecorder {
    store: SharedStore,
    enabled: bool,
}

impl HistoryRecorder {
    pub fn new(store: SharedStore, enabled: bool) -> Self {
        Self { store, enabled }
    }

    /// Fire-and-forget append. Returns immediately; the write happens on a
    /// detached task.
    pub fn record(&self, entry: HistoryEntry) {
        if !self.enabled {
            return;
        }
        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(err) = store.append_history(entry).await {
                warn!(%err, "history append failed; stock level remains authoritative");
            }
        });
    }
}
