use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use crate::clock::Clock;
use crate::error::GateSealError;
use crate::gate::GateSeal;
use crate::sealable::SealableDirectory;
use crate::types::{Address, GateSealParams};

/// Creates gate seals that share one clock and one sealable directory.
///
/// Gate ids are derived from the factory id, a creation nonce and the
/// committee, so they are unique per factory and reproducible.
pub struct GateSealFactory {
    id: Address,
    clock: Arc<dyn Clock>,
    directory: Arc<dyn SealableDirectory>,
    gates: RwLock<Vec<Arc<GateSeal>>>,
}

impl GateSealFactory {
    pub fn new(
        id: Address,
        clock: Arc<dyn Clock>,
        directory: Arc<dyn SealableDirectory>,
    ) -> Self {
        Self {
            id,
            clock,
            directory,
            gates: RwLock::new(Vec::new()),
        }
    }

    pub fn id(&self) -> Address {
        self.id
    }

    /// Validate `params` and create a new armed gate.
    ///
    /// A rejected configuration does not consume a nonce.
    pub fn create(&self, params: GateSealParams) -> Result<Arc<GateSeal>, GateSealError> {
        let mut gates = self.gates.write().unwrap_or_else(PoisonError::into_inner);
        let nonce = gates.len() as u64;
        let gate_id = self.derive_gate_id(nonce, &params.sealing_committee);

        let gate = Arc::new(GateSeal::with_id(
            gate_id,
            params,
            Arc::clone(&self.clock),
            Arc::clone(&self.directory),
        )?);
        gates.push(Arc::clone(&gate));

        info!(
            factory = %self.id,
            gate_seal = %gate_id,
            nonce,
            "GateSealCreated"
        );
        Ok(gate)
    }

    fn derive_gate_id(&self, nonce: u64, committee: &Address) -> Address {
        let mut seed = Vec::with_capacity(48);
        seed.extend_from_slice(self.id.as_bytes());
        seed.extend_from_slice(&nonce.to_be_bytes());
        seed.extend_from_slice(committee.as_bytes());
        Address::derive(&seed)
    }

    /// All gates created so far, oldest first.
    pub fn gates(&self) -> Vec<Arc<GateSeal>> {
        self.gates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, id: &Address) -> Option<Arc<GateSeal>> {
        self.gates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|g| g.id() == *id)
            .cloned()
    }

    pub fn gate_count(&self) -> usize {
        self.gates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
