use crate::types::Address;
use thiserror::Error;

/// Errors from the GateSeal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateSealError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("sealable {sealable}: failed to seal: {reason}")]
    SealFailed { sealable: Address, reason: String },
}

/// Coarse category of a [`GateSealError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Authorization,
    State,
    Validation,
    SealFailed,
}

impl GateSealError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GateSealError::Configuration(_) => ErrorKind::Configuration,
            GateSealError::Authorization(_) => ErrorKind::Authorization,
            GateSealError::State(_) => ErrorKind::State,
            GateSealError::Validation(_) => ErrorKind::Validation,
            GateSealError::SealFailed { .. } => ErrorKind::SealFailed,
        }
    }
}

/// Construction-time rejections. No gate exists when one of these is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("sealing committee: zero address")]
    ZeroCommittee,

    #[error("seal duration: zero")]
    ZeroSealDuration,

    #[error("seal duration: exceeds max ({requested}s > {max}s)")]
    SealDurationExceedsMax { requested: u64, max: u64 },

    #[error("sealables: empty list")]
    EmptySealables,

    #[error("sealables: too many ({count} > {max})")]
    TooManySealables { count: usize, max: usize },

    #[error("sealables: includes zero address at index {index}")]
    ZeroSealable { index: usize },

    #[error("sealables: includes duplicates at index {index}")]
    DuplicateSealable { index: usize },

    #[error("expiry period: zero")]
    ZeroExpiryPeriod,

    #[error("expiry period: exceeds max ({requested}s > {max}s)")]
    ExpiryPeriodExceedsMax { requested: u64, max: u64 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("sender: not committee ({sender})")]
    NotCommittee { sender: Address },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("gate seal: already expired/used")]
    AlreadyExpired,

    #[error("gate seal: seal already in progress on this thread")]
    SealInProgress,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("sealables: empty subset")]
    EmptySubset,

    #[error("sealables: includes a non-sealable ({sealable})")]
    NonSealable { sealable: Address },
}

/// Failure reported by a sealable's pause capability.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SealableError {
    #[error("pause rejected: {0}")]
    Rejected(String),

    #[error("no sealable registered at {0}")]
    NotFound(Address),
}
