use std::sync::Arc;

use tracing::warn;

use crate::sealable::{PauseCheckpoint, Sealable};
use crate::types::Address;

struct JournalEntry {
    address: Address,
    sealable: Arc<dyn Sealable>,
    checkpoint: PauseCheckpoint,
}

/// Checkpoints taken during one seal attempt.
///
/// Every sealable is recorded before it is paused, so an aborted seal can put
/// each one back exactly as it was.
#[derive(Default)]
pub struct PauseJournal {
    entries: Vec<JournalEntry>,
}

impl PauseJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current state of `sealable` ahead of pausing it.
    pub fn record(&mut self, address: Address, sealable: Arc<dyn Sealable>) {
        let checkpoint = sealable.checkpoint();
        self.entries.push(JournalEntry {
            address,
            sealable,
            checkpoint,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Restore all recorded sealables, most recent first.
    ///
    /// Reverse order matters when a subset names the same sealable twice:
    /// the oldest checkpoint is applied last.
    pub fn rollback(self) -> usize {
        let restored = self.entries.len();
        for entry in self.entries.into_iter().rev() {
            warn!(sealable = %entry.address, "Restoring sealable after aborted seal");
            entry.sealable.restore(entry.checkpoint);
        }
        restored
    }

    /// Drop the checkpoints once the seal has committed.
    pub fn commit(self) -> usize {
        self.entries.len()
    }
}
