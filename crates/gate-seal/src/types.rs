use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Seconds since the Unix epoch.
pub type Timestamp = u64;

pub const MIN_SEALABLES: usize = 1;
pub const MAX_SEALABLES: usize = 8;

pub const SECONDS_PER_DAY: u64 = 60 * 60 * 24;
pub const MAX_SEAL_DURATION_DAYS: u64 = 14;
pub const MAX_SEAL_DURATION_SECONDS: u64 = SECONDS_PER_DAY * MAX_SEAL_DURATION_DAYS;
pub const MAX_EXPIRY_PERIOD_DAYS: u64 = 365;
pub const MAX_EXPIRY_PERIOD_SECONDS: u64 = SECONDS_PER_DAY * MAX_EXPIRY_PERIOD_DAYS;

/// Opaque 20-byte identity used for committees, sealables and gates.
///
/// The all-zero value is the reserved null identity. It can be parsed and
/// carried around, but every boundary that needs a real identity goes through
/// [`Address::non_zero`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Derive an address from the first 20 bytes of a BLAKE3 digest.
    pub fn derive(data: &[u8]) -> Self {
        let digest = blake3::hash(data);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest.as_bytes()[..20]);
        Self(bytes)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// `None` for the null identity.
    pub fn non_zero(self) -> Option<Address> {
        if self.is_zero() {
            None
        } else {
            Some(self)
        }
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse from hex, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.len() != 40 {
            return Err(AddressError::InvalidLength(digits.len()));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes).map_err(|_| AddressError::InvalidHex)?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_hex(s)
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Address::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("invalid address length: {0} hex digits (expected 40)")]
    InvalidLength(usize),
    #[error("invalid hex character in address")]
    InvalidHex,
}

/// Construction parameters, in the fixed order the gate validates them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateSealParams {
    pub sealing_committee: Address,
    pub seal_duration_seconds: u64,
    pub sealables: Vec<Address>,
    pub expiry_period_seconds: u64,
}

impl GateSealParams {
    pub fn new(
        sealing_committee: Address,
        seal_duration_seconds: u64,
        sealables: Vec<Address>,
        expiry_period_seconds: u64,
    ) -> Self {
        Self {
            sealing_committee,
            seal_duration_seconds,
            sealables,
            expiry_period_seconds,
        }
    }
}

/// Armed/used state of a gate.
///
/// Both variants project onto a single expiry timestamp: the deadline while
/// armed, the moment of use once sealed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateState {
    Armed { deadline: Timestamp },
    Used { at: Timestamp },
}

impl GateState {
    pub fn expiry_timestamp(&self) -> Timestamp {
        match *self {
            GateState::Armed { deadline } => deadline,
            GateState::Used { at } => at,
        }
    }

    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        match *self {
            GateState::Armed { deadline } => now >= deadline,
            GateState::Used { .. } => true,
        }
    }

    pub fn is_used(&self) -> bool {
        matches!(self, GateState::Used { .. })
    }
}

/// Emitted once per sealable on a successful seal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedEvent {
    pub gate_seal: Address,
    pub sealed_by: Address,
    pub sealed_for: u64,
    pub sealable: Address,
    pub sealed_at: Timestamp,
}

/// Result of a successful seal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealReceipt {
    pub gate_seal: Address,
    pub sealed_at: Timestamp,
    pub events: Vec<SealedEvent>,
}

impl SealReceipt {
    /// Sealables paused by this seal, in call order.
    pub fn sealed(&self) -> Vec<Address> {
        self.events.iter().map(|e| e.sealable).collect()
    }
}
