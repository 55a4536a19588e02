use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::SealableError;
use crate::types::Address;

/// Opaque pause state captured before a gate pauses a sealable.
///
/// Only the sealable that produced it knows how to interpret the value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PauseCheckpoint(u64);

impl PauseCheckpoint {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// The pause capability a gate may trigger.
pub trait Sealable: Send + Sync {
    /// Enter the paused state for `duration_seconds`.
    ///
    /// Runs inside the gate's seal. The gate's read accessors may be called
    /// from here and report the armed state the seal started from; calling
    /// `seal` on the same gate from here fails with `SealInProgress`. Any
    /// error aborts the whole seal.
    fn pause(&self, duration_seconds: u64) -> Result<(), SealableError>;

    fn is_paused(&self) -> bool;

    /// Capture the current pause state.
    fn checkpoint(&self) -> PauseCheckpoint;

    /// Return to a state captured by [`Sealable::checkpoint`].
    ///
    /// Called only when a seal aborts after this sealable was paused.
    fn restore(&self, checkpoint: PauseCheckpoint);
}

/// Resolves identities to pause capabilities.
pub trait SealableDirectory: Send + Sync {
    fn resolve(&self, address: &Address) -> Option<Arc<dyn Sealable>>;
}

/// Directory backed by an in-process map.
#[derive(Default)]
pub struct InMemoryDirectory {
    entries: RwLock<HashMap<Address, Arc<dyn Sealable>>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the sealable at `address`.
    pub fn register(&self, address: Address, sealable: Arc<dyn Sealable>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(address, sealable);
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SealableDirectory for InMemoryDirectory {
    fn resolve(&self, address: &Address) -> Option<Arc<dyn Sealable>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(address)
            .cloned()
    }
}

/// Resolve `address` or report it as a seal failure.
pub(crate) fn resolve_or_fail(
    directory: &dyn SealableDirectory,
    address: &Address,
) -> Result<Arc<dyn Sealable>, SealableError> {
    directory
        .resolve(address)
        .ok_or(SealableError::NotFound(*address))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::mocks::MockSealable;

    #[test]
    fn register_and_resolve() {
        let clock = Arc::new(ManualClock::new(0));
        let dir = InMemoryDirectory::new();
        assert!(dir.is_empty());

        let addr = Address::derive(b"s1");
        dir.register(addr, Arc::new(MockSealable::new(clock)));
        assert_eq!(dir.len(), 1);
        assert!(dir.resolve(&addr).is_some());
        assert!(dir.resolve(&Address::derive(b"s2")).is_none());
    }

    #[test]
    fn resolve_or_fail_names_missing_address() {
        let dir = InMemoryDirectory::new();
        let addr = Address::derive(b"missing");
        let err = resolve_or_fail(&dir, &addr).err().unwrap();
        assert_eq!(err, SealableError::NotFound(addr));
    }
}
