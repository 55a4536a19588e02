use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, ThreadId};

use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{
    AuthorizationError, ConfigurationError, GateSealError, StateError, ValidationError,
};
use crate::rollback::PauseJournal;
use crate::sealable::{resolve_or_fail, Sealable, SealableDirectory};
use crate::types::{
    Address, GateSealParams, GateState, SealReceipt, SealedEvent, Timestamp,
    MAX_EXPIRY_PERIOD_SECONDS, MAX_SEALABLES, MAX_SEAL_DURATION_SECONDS, MIN_SEALABLES,
};

/// Mutable part of a gate, guarded as a unit.
struct SealState {
    gate: GateState,
    events: Vec<SealedEvent>,
}

/// The thread running `seal` and the state it started from.
type InFlightSlot = RwLock<Option<(ThreadId, GateState)>>;

/// Marks a seal as running on the current thread until dropped.
struct InFlight<'a> {
    slot: &'a InFlightSlot,
}

impl<'a> InFlight<'a> {
    fn enter(slot: &'a InFlightSlot, state: GateState) -> Self {
        *slot.write().unwrap_or_else(PoisonError::into_inner) =
            Some((thread::current().id(), state));
        Self { slot }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// One-shot, time-bounded emergency pause gate.
///
/// The sealing committee may pause any subset of the configured sealables
/// exactly once, before the expiry deadline. Sealing or reaching the deadline
/// leaves the gate permanently expired.
///
/// `seal` runs under a single lock. All pauses and the switch to
/// [`GateState::Used`] commit together, or none of them do. Other threads
/// reading the gate wait for the seal to finish.
///
/// A sealable may read the gate from inside [`Sealable::pause`]; it sees the
/// armed state the seal started from. Calling `seal` from inside `pause` is
/// rejected with [`StateError::SealInProgress`].
pub struct GateSeal {
    id: Address,
    sealing_committee: Address,
    seal_duration_seconds: u64,
    sealables: Vec<Address>,
    state: Mutex<SealState>,
    in_flight: InFlightSlot,
    clock: Arc<dyn Clock>,
    directory: Arc<dyn SealableDirectory>,
}

impl std::fmt::Debug for GateSeal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateSeal")
            .field("id", &self.id)
            .field("sealing_committee", &self.sealing_committee)
            .field("seal_duration_seconds", &self.seal_duration_seconds)
            .field("sealables", &self.sealables)
            .field("state", &self.state())
            .finish()
    }
}

impl GateSeal {
    /// Validate `params` and create an armed gate.
    ///
    /// The gate id is derived from the parameters and the creation time.
    pub fn new(
        params: GateSealParams,
        clock: Arc<dyn Clock>,
        directory: Arc<dyn SealableDirectory>,
    ) -> Result<Self, GateSealError> {
        let created_at = clock.now();
        let mut seed = Vec::with_capacity(20 * (params.sealables.len() + 1) + 8);
        seed.extend_from_slice(params.sealing_committee.as_bytes());
        for sealable in &params.sealables {
            seed.extend_from_slice(sealable.as_bytes());
        }
        seed.extend_from_slice(&created_at.to_be_bytes());
        Self::armed(Address::derive(&seed), params, created_at, clock, directory)
    }

    /// Validate `params` and create an armed gate with a caller-chosen id.
    pub fn with_id(
        id: Address,
        params: GateSealParams,
        clock: Arc<dyn Clock>,
        directory: Arc<dyn SealableDirectory>,
    ) -> Result<Self, GateSealError> {
        let created_at = clock.now();
        Self::armed(id, params, created_at, clock, directory)
    }

    fn armed(
        id: Address,
        params: GateSealParams,
        created_at: Timestamp,
        clock: Arc<dyn Clock>,
        directory: Arc<dyn SealableDirectory>,
    ) -> Result<Self, GateSealError> {
        Self::validate(&params)?;

        let deadline = created_at.saturating_add(params.expiry_period_seconds);

        info!(
            gate_seal = %id,
            committee = %params.sealing_committee,
            seal_duration = params.seal_duration_seconds,
            sealables = params.sealables.len(),
            expiry_timestamp = deadline,
            "GateSeal created"
        );

        Ok(Self {
            id,
            sealing_committee: params.sealing_committee,
            seal_duration_seconds: params.seal_duration_seconds,
            sealables: params.sealables,
            state: Mutex::new(SealState {
                gate: GateState::Armed { deadline },
                events: Vec::new(),
            }),
            in_flight: RwLock::new(None),
            clock,
            directory,
        })
    }

    /// Construction checks, in order. The first failure wins.
    pub fn validate(params: &GateSealParams) -> Result<(), ConfigurationError> {
        if params.sealing_committee.non_zero().is_none() {
            return Err(ConfigurationError::ZeroCommittee);
        }

        if params.seal_duration_seconds == 0 {
            return Err(ConfigurationError::ZeroSealDuration);
        }
        if params.seal_duration_seconds > MAX_SEAL_DURATION_SECONDS {
            return Err(ConfigurationError::SealDurationExceedsMax {
                requested: params.seal_duration_seconds,
                max: MAX_SEAL_DURATION_SECONDS,
            });
        }

        if params.sealables.len() < MIN_SEALABLES {
            return Err(ConfigurationError::EmptySealables);
        }
        if params.sealables.len() > MAX_SEALABLES {
            return Err(ConfigurationError::TooManySealables {
                count: params.sealables.len(),
                max: MAX_SEALABLES,
            });
        }
        if let Some(index) = params.sealables.iter().position(|s| s.non_zero().is_none()) {
            return Err(ConfigurationError::ZeroSealable { index });
        }
        let mut seen = HashSet::with_capacity(params.sealables.len());
        if let Some(index) = params.sealables.iter().position(|s| !seen.insert(*s)) {
            return Err(ConfigurationError::DuplicateSealable { index });
        }

        if params.expiry_period_seconds == 0 {
            return Err(ConfigurationError::ZeroExpiryPeriod);
        }
        if params.expiry_period_seconds > MAX_EXPIRY_PERIOD_SECONDS {
            return Err(ConfigurationError::ExpiryPeriodExceedsMax {
                requested: params.expiry_period_seconds,
                max: MAX_EXPIRY_PERIOD_SECONDS,
            });
        }

        Ok(())
    }

    /// Pause every sealable in `subset`, in order, and expire the gate.
    ///
    /// Checks run before any pause is issued:
    /// 1. `caller` is the sealing committee
    /// 2. the gate is not expired or used
    /// 3. `subset` is not empty
    /// 4. every entry of `subset` is a configured sealable
    ///
    /// If a sealable cannot be resolved, rejects the pause, or does not report
    /// itself paused afterwards, every sealable paused so far is restored and
    /// the gate stays armed.
    pub fn seal(&self, caller: Address, subset: &[Address]) -> Result<SealReceipt, GateSealError> {
        if self.reentrant_state().is_some() {
            warn!(gate_seal = %self.id, sender = %caller, "Seal rejected: called from inside a pause");
            return Err(StateError::SealInProgress.into());
        }

        let mut state = self.lock_state();
        let now = self.clock.now();

        if caller != self.sealing_committee {
            warn!(gate_seal = %self.id, sender = %caller, "Seal rejected: sender is not the committee");
            return Err(AuthorizationError::NotCommittee { sender: caller }.into());
        }

        if state.gate.is_expired_at(now) {
            warn!(
                gate_seal = %self.id,
                expiry_timestamp = state.gate.expiry_timestamp(),
                now,
                "Seal rejected: gate already expired/used"
            );
            return Err(StateError::AlreadyExpired.into());
        }

        if subset.is_empty() {
            warn!(gate_seal = %self.id, "Seal rejected: empty subset");
            return Err(ValidationError::EmptySubset.into());
        }

        if let Some(outsider) = subset.iter().find(|s| !self.sealables.contains(s)) {
            warn!(gate_seal = %self.id, sealable = %outsider, "Seal rejected: non-sealable in subset");
            return Err(ValidationError::NonSealable {
                sealable: *outsider,
            }
            .into());
        }

        let targets = subset
            .iter()
            .map(|address| {
                resolve_or_fail(self.directory.as_ref(), address)
                    .map(|sealable| (*address, sealable))
                    .map_err(|e| GateSealError::SealFailed {
                        sealable: *address,
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<(Address, Arc<dyn Sealable>)>, _>>()?;

        let in_flight = InFlight::enter(&self.in_flight, state.gate);
        let mut journal = PauseJournal::new();
        for (address, sealable) in &targets {
            journal.record(*address, Arc::clone(sealable));

            if let Err(reason) = self.pause_one(sealable.as_ref()) {
                warn!(
                    gate_seal = %self.id,
                    sealable = %address,
                    reason = %reason,
                    restored = journal.len(),
                    "Seal aborted, rolling back"
                );
                journal.rollback();
                return Err(GateSealError::SealFailed {
                    sealable: *address,
                    reason,
                });
            }
            debug!(gate_seal = %self.id, sealable = %address, duration = self.seal_duration_seconds, "Sealable paused");
        }
        journal.commit();
        drop(in_flight);

        state.gate = GateState::Used { at: now };
        let events: Vec<SealedEvent> = targets
            .iter()
            .map(|(address, _)| SealedEvent {
                gate_seal: self.id,
                sealed_by: caller,
                sealed_for: self.seal_duration_seconds,
                sealable: *address,
                sealed_at: now,
            })
            .collect();
        state.events.extend(events.iter().cloned());

        info!(
            gate_seal = %self.id,
            sealed = events.len(),
            sealed_at = now,
            "GateSeal sealed and expired"
        );

        Ok(SealReceipt {
            gate_seal: self.id,
            sealed_at: now,
            events,
        })
    }

    fn pause_one(&self, sealable: &dyn Sealable) -> Result<(), String> {
        sealable
            .pause(self.seal_duration_seconds)
            .map_err(|e| e.to_string())?;
        if !sealable.is_paused() {
            return Err("paused state not observed after pause".into());
        }
        Ok(())
    }

    /// True once the deadline is reached or the gate has been used.
    pub fn is_expired(&self) -> bool {
        self.state().is_expired_at(self.clock.now())
    }

    pub fn id(&self) -> Address {
        self.id
    }

    pub fn sealing_committee(&self) -> Address {
        self.sealing_committee
    }

    pub fn seal_duration_seconds(&self) -> u64 {
        self.seal_duration_seconds
    }

    /// Configured sealables, in configured order.
    pub fn sealables(&self) -> &[Address] {
        &self.sealables
    }

    pub fn expiry_timestamp(&self) -> Timestamp {
        self.state().expiry_timestamp()
    }

    pub fn state(&self) -> GateState {
        match self.reentrant_state() {
            Some(started_from) => started_from,
            None => self.lock_state().gate,
        }
    }

    /// Events recorded by the successful seal, if any.
    pub fn events(&self) -> Vec<SealedEvent> {
        // A seal still running on this thread has recorded nothing yet.
        if self.reentrant_state().is_some() {
            return Vec::new();
        }
        self.lock_state().events.clone()
    }

    /// State a seal running on the current thread started from.
    fn reentrant_state(&self) -> Option<GateState> {
        match *self.in_flight.read().unwrap_or_else(PoisonError::into_inner) {
            Some((thread, state)) if thread == thread::current().id() => Some(state),
            _ => None,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SealState> {
        // State is only written after every fallible step, so a poisoned
        // lock still holds a consistent value.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
