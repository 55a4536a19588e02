//! End-to-end tests: a gate seal from deployment config to permanent expiry.

use std::sync::{Arc, Barrier};
use std::thread;

use gate_seal::{
    Address, ConfigurationError, ErrorKind, GateSeal, GateSealConfig, GateSealError,
    GateSealFactory, GateSealParams, InMemoryDirectory, ManualClock, MockSealable, Sealable,
    StateError, MAX_SEALABLES, SECONDS_PER_DAY,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const DEPLOYED_AT: u64 = 1_690_000_000;
const SEAL_DURATION: u64 = 6 * SECONDS_PER_DAY;
const EXPIRY_PERIOD: u64 = 365 * SECONDS_PER_DAY;

struct Host {
    clock: Arc<ManualClock>,
    directory: Arc<InMemoryDirectory>,
    committee: Address,
    sealables: Vec<(Address, Arc<MockSealable>)>,
}

fn host(count: usize) -> Host {
    let clock = Arc::new(ManualClock::new(DEPLOYED_AT));
    let directory = Arc::new(InMemoryDirectory::new());
    let sealables = (0..count)
        .map(|i| {
            let addr = Address::derive(format!("withdrawal-queue-{i}").as_bytes());
            let mock = Arc::new(MockSealable::new(clock.clone()));
            directory.register(addr, mock.clone());
            (addr, mock)
        })
        .collect();
    Host {
        clock,
        directory,
        committee: Address::derive(b"emergency-committee"),
        sealables,
    }
}

impl Host {
    fn addresses(&self) -> Vec<Address> {
        self.sealables.iter().map(|(a, _)| *a).collect()
    }

    fn deploy(&self) -> GateSeal {
        GateSeal::new(
            GateSealParams::new(self.committee, SEAL_DURATION, self.addresses(), EXPIRY_PERIOD),
            self.clock.clone(),
            self.directory.clone(),
        )
        .expect("valid deployment")
    }

    fn paused(&self) -> Vec<bool> {
        self.sealables.iter().map(|(_, m)| m.is_paused()).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests: Construction
// ---------------------------------------------------------------------------

#[test]
fn each_invalid_parameter_has_its_own_error() {
    let h = host(2);
    let clock = h.clock.clone();
    let dir = h.directory.clone();
    let build = |params: GateSealParams| {
        GateSeal::new(params, clock.clone(), dir.clone())
            .map(|_| ())
            .unwrap_err()
    };

    let cases = vec![
        (
            GateSealParams::new(Address::ZERO, SEAL_DURATION, h.addresses(), EXPIRY_PERIOD),
            ConfigurationError::ZeroCommittee,
        ),
        (
            GateSealParams::new(h.committee, 0, h.addresses(), EXPIRY_PERIOD),
            ConfigurationError::ZeroSealDuration,
        ),
        (
            GateSealParams::new(h.committee, SEAL_DURATION, vec![], EXPIRY_PERIOD),
            ConfigurationError::EmptySealables,
        ),
        (
            GateSealParams::new(h.committee, SEAL_DURATION, h.addresses(), 0),
            ConfigurationError::ZeroExpiryPeriod,
        ),
    ];

    for (params, expected) in cases {
        assert_eq!(build(params), GateSealError::Configuration(expected));
    }
}

#[test]
fn too_many_sealables_rejected() {
    let h = host(MAX_SEALABLES + 1);
    let err = GateSeal::new(
        GateSealParams::new(h.committee, SEAL_DURATION, h.addresses(), EXPIRY_PERIOD),
        h.clock.clone(),
        h.directory.clone(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err.to_string().starts_with("sealables: too many"));
}

#[test]
fn deployed_gate_matches_params() {
    let h = host(3);
    let gate = h.deploy();
    assert_eq!(gate.sealing_committee(), h.committee);
    assert_eq!(gate.seal_duration_seconds(), SEAL_DURATION);
    assert_eq!(gate.sealables(), h.addresses().as_slice());
    assert_eq!(gate.expiry_timestamp(), DEPLOYED_AT + EXPIRY_PERIOD);
    assert!(!gate.is_expired());
}

// ---------------------------------------------------------------------------
// Tests: Sealing
// ---------------------------------------------------------------------------

#[test]
fn seal_all() {
    let h = host(4);
    let gate = h.deploy();
    h.clock.advance(30 * SECONDS_PER_DAY);

    gate.seal(h.committee, &h.addresses()).unwrap();
    assert!(gate.is_expired());
    assert_eq!(h.paused(), vec![true; 4]);
}

#[test]
fn seal_partial() {
    let h = host(3);
    let gate = h.deploy();
    gate.seal(h.committee, &[h.sealables[0].0]).unwrap();
    assert!(gate.is_expired());
    assert_eq!(h.paused(), vec![true, false, false]);
}

#[test]
fn pause_lasts_for_seal_duration() {
    let h = host(1);
    let gate = h.deploy();
    gate.seal(h.committee, &h.addresses()).unwrap();

    h.clock.advance(SEAL_DURATION - 1);
    assert!(h.sealables[0].1.is_paused());
    h.clock.advance(1);
    assert!(!h.sealables[0].1.is_paused());
    // Resumed sealables do not re-arm the gate.
    assert!(gate.is_expired());
}

#[test]
fn stranger_changes_nothing() {
    let h = host(2);
    let gate = h.deploy();
    let err = gate
        .seal(Address::derive(b"stranger"), &h.addresses())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert_eq!(h.paused(), vec![false, false]);
    assert!(!gate.is_expired());
}

#[test]
fn nonintersecting_subset_rejected() {
    let h = host(2);
    let gate = h.deploy();
    let err = gate
        .seal(h.committee, &[Address::derive(b"not-a-sealable")])
        .unwrap_err();
    assert!(err.to_string().contains("includes a non-sealable"));
}

#[test]
fn valid_members_not_paused_when_subset_has_outsider() {
    let h = host(3);
    let gate = h.deploy();
    let subset = [h.sealables[0].0, h.sealables[1].0, Address::derive(b"intruder")];
    let err = gate.seal(h.committee, &subset).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(h.paused(), vec![false, false, false]);
    assert!(h.sealables.iter().all(|(_, m)| m.pause_calls() == 0));
}

#[test]
fn one_shot() {
    let h = host(2);
    let gate = h.deploy();
    gate.seal(h.committee, &[h.sealables[0].0]).unwrap();

    for subset in [vec![h.sealables[1].0], h.addresses()] {
        let err = gate.seal(h.committee, &subset).unwrap_err();
        assert_eq!(err, GateSealError::State(StateError::AlreadyExpired));
    }
    h.clock.advance(10 * EXPIRY_PERIOD);
    assert!(gate.is_expired());
    assert_eq!(h.paused(), vec![false, false]);
}

#[test]
fn expired_gate_cannot_seal() {
    let h = host(2);
    let gate = h.deploy();
    h.clock.set(DEPLOYED_AT + EXPIRY_PERIOD);
    assert!(gate.is_expired());
    let err = gate.seal(h.committee, &h.addresses()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);
    assert_eq!(h.paused(), vec![false, false]);
}

#[test]
fn failed_pause_leaves_gate_armed() {
    let h = host(2);
    let flaky = Address::derive(b"flaky");
    h.directory
        .register(flaky, Arc::new(MockSealable::failing(h.clock.clone())));
    let mut sealables = h.addresses();
    sealables.insert(1, flaky);
    let gate = GateSeal::new(
        GateSealParams::new(h.committee, SEAL_DURATION, sealables.clone(), EXPIRY_PERIOD),
        h.clock.clone(),
        h.directory.clone(),
    )
    .unwrap();

    let err = gate.seal(h.committee, &sealables).unwrap_err();
    assert!(matches!(err, GateSealError::SealFailed { sealable, .. } if sealable == flaky));
    assert_eq!(h.paused(), vec![false, false]);
    assert_eq!(gate.expiry_timestamp(), DEPLOYED_AT + EXPIRY_PERIOD);
    // Only the sealable before the failing one was reached.
    assert_eq!(h.sealables[0].1.pause_calls(), 1);
    assert_eq!(h.sealables[1].1.pause_calls(), 0);
}

// ---------------------------------------------------------------------------
// Tests: Concurrency
// ---------------------------------------------------------------------------

#[test]
fn concurrent_seals_have_exactly_one_winner() {
    const THREADS: usize = 16;
    let h = host(8);
    let gate = Arc::new(h.deploy());
    let barrier = Arc::new(Barrier::new(THREADS));
    let addresses = h.addresses();

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let gate = Arc::clone(&gate);
            let barrier = Arc::clone(&barrier);
            let committee = h.committee;
            let subset = addresses[i % addresses.len()..].to_vec();
            thread::spawn(move || {
                barrier.wait();
                let outcome = gate.seal(committee, &subset);
                (subset, outcome)
            })
        })
        .collect();
    let outcomes: Vec<_> = handles.into_iter().map(|t| t.join().unwrap()).collect();

    let winners: Vec<_> = outcomes.iter().filter(|(_, r)| r.is_ok()).collect();
    assert_eq!(winners.len(), 1);
    for (_, outcome) in outcomes.iter().filter(|(_, r)| r.is_err()) {
        assert_eq!(outcome.as_ref().unwrap_err().kind(), ErrorKind::State);
    }

    let winning_subset = &winners[0].0;
    assert!(gate.is_expired());
    assert_eq!(gate.events().len(), winning_subset.len());
    for (addr, mock) in &h.sealables {
        assert_eq!(mock.is_paused(), winning_subset.contains(addr));
        assert!(mock.pause_calls() <= 1);
    }
}

// ---------------------------------------------------------------------------
// Tests: Factory + config
// ---------------------------------------------------------------------------

#[test]
fn factory_deploys_from_config() {
    let h = host(2);
    let toml = format!(
        "sealing_committee = \"{}\"\nseal_duration_seconds = {}\nexpiry_period_seconds = {}\nsealables = [\"{}\", \"{}\"]\n",
        h.committee,
        SEAL_DURATION,
        EXPIRY_PERIOD,
        h.sealables[0].0,
        h.sealables[1].0,
    );
    let config = GateSealConfig::from_toml(&toml).unwrap();

    let factory = GateSealFactory::new(
        Address::derive(b"factory"),
        h.clock.clone(),
        h.directory.clone(),
    );
    let gate = factory.create(config.into()).unwrap();
    assert_eq!(factory.gate_count(), 1);

    let receipt = gate.seal(h.committee, &h.addresses()).unwrap();
    assert_eq!(receipt.gate_seal, gate.id());
    assert_eq!(receipt.sealed(), h.addresses());
    assert_eq!(h.paused(), vec![true, true]);
    assert!(factory.get(&gate.id()).unwrap().is_expired());
}
