#![deny(unsafe_code)]
//! # gate-seal
//!
//! One-shot, time-bounded emergency pause gate.
//!
//! A single sealing committee may pause a bounded set of sealables (all of
//! them or a chosen subset) once, before the gate's expiry deadline. After a
//! seal, or once the deadline passes, the gate is permanently inert.
//!
//! Enforces:
//! - **Committee only**: no other identity can trigger a seal
//! - **One shot**: a successful seal expires the gate for good
//! - **All or nothing**: every targeted sealable is paused and the gate is
//!   expired together, or nothing changes

pub mod clock;
pub mod config;
pub mod error;
pub mod factory;
pub mod gate;
pub mod mocks;
pub mod rollback;
pub mod sealable;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, GateSealConfig};
pub use error::{
    AuthorizationError, ConfigurationError, ErrorKind, GateSealError, SealableError, StateError,
    ValidationError,
};
pub use factory::GateSealFactory;
pub use gate::GateSeal;
pub use mocks::MockSealable;
pub use rollback::PauseJournal;
pub use sealable::{InMemoryDirectory, PauseCheckpoint, Sealable, SealableDirectory};
pub use types::{
    Address, AddressError, GateSealParams, GateState, SealReceipt, SealedEvent, Timestamp,
    MAX_EXPIRY_PERIOD_SECONDS, MAX_SEALABLES, MAX_SEAL_DURATION_SECONDS, MIN_SEALABLES,
    SECONDS_PER_DAY,
};
