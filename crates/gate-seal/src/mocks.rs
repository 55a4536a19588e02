use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::clock::Clock;
use crate::error::SealableError;
use crate::sealable::{PauseCheckpoint, Sealable};
use crate::types::Timestamp;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MockBehavior {
    Pause,
    Reject,
    /// Accepts the call but never enters the paused state.
    Ignore,
}

/// Mock sealable for testing.
///
/// Paused while the clock reads before its resume timestamp, the way a
/// pause-until resource behaves.
pub struct MockSealable {
    clock: Arc<dyn Clock>,
    resume_since: AtomicU64,
    pause_calls: AtomicUsize,
    behavior: MockBehavior,
}

impl MockSealable {
    /// A sealable that pauses on request.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_behavior(clock, MockBehavior::Pause)
    }

    /// A sealable whose pause call always fails.
    pub fn failing(clock: Arc<dyn Clock>) -> Self {
        Self::with_behavior(clock, MockBehavior::Reject)
    }

    /// A sealable that reports success but stays resumed.
    pub fn ignoring(clock: Arc<dyn Clock>) -> Self {
        Self::with_behavior(clock, MockBehavior::Ignore)
    }

    fn with_behavior(clock: Arc<dyn Clock>, behavior: MockBehavior) -> Self {
        Self {
            clock,
            resume_since: AtomicU64::new(0),
            pause_calls: AtomicUsize::new(0),
            behavior,
        }
    }

    /// Number of pause calls received, including failed ones.
    pub fn pause_calls(&self) -> usize {
        self.pause_calls.load(Ordering::SeqCst)
    }

    pub fn resume_since(&self) -> Timestamp {
        self.resume_since.load(Ordering::SeqCst)
    }
}

impl Sealable for MockSealable {
    fn pause(&self, duration_seconds: u64) -> Result<(), SealableError> {
        self.pause_calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            MockBehavior::Pause => {
                let until = self.clock.now().saturating_add(duration_seconds);
                self.resume_since.store(until, Ordering::SeqCst);
                Ok(())
            }
            MockBehavior::Reject => Err(SealableError::Rejected("mock: pause disabled".into())),
            MockBehavior::Ignore => Ok(()),
        }
    }

    fn is_paused(&self) -> bool {
        self.clock.now() < self.resume_since()
    }

    fn checkpoint(&self) -> PauseCheckpoint {
        PauseCheckpoint::new(self.resume_since())
    }

    fn restore(&self, checkpoint: PauseCheckpoint) {
        self.resume_since.store(checkpoint.raw(), Ordering::SeqCst);
    }
}
