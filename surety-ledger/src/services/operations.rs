//! Operational gate - owner-controlled pause switch.
//!
//! Every mutating operation in every other component consults this gate
//! first and fails with `NotOperational` while it is off. The switch has no
//! side effects beyond the boolean itself.

use async_trait::async_trait;
use surety_core::logging::operations;
use surety_core::{Address, LedgerError, LedgerResult};
use std::sync::Arc;
use tracing::{info, warn};

use super::Ledger;
use crate::store::LedgerStore;

/// Operational gate trait
#[async_trait]
pub trait OperationsGate: Ledger {
    /// Whether mutating operations are currently admitted.
    async fn is_operational(&self) -> bool;

    /// Flip the switch. Only the designated owner may call this.
    async fn set_operating_status(&self, operational: bool, caller: &Address) -> LedgerResult<()>;
}

/// Operational gate over the shared store.
pub struct OperationsService {
    store: Arc<LedgerStore>,
}

impl OperationsService {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Ledger for OperationsService {
    fn name(&self) -> &'static str {
        "operations"
    }

    async fn current_sequence(&self) -> LedgerResult<u64> {
        Ok(self.store.current_sequence())
    }

    async fn verify_integrity(&self) -> LedgerResult<bool> {
        // The gate is a single boolean; nothing further to check.
        Ok(true)
    }
}

#[async_trait]
impl OperationsGate for OperationsService {
    async fn is_operational(&self) -> bool {
        self.store.read().operational
    }

    async fn set_operating_status(&self, operational: bool, caller: &Address) -> LedgerResult<()> {
        if caller != self.store.owner() {
            warn!(
                operation = operations::SET_OPERATING_STATUS,
                caller = %caller,
                "rejected: caller is not the contract owner"
            );
            return Err(LedgerError::NotContractOwner(caller.clone()));
        }

        self.store.write().operational = operational;
        info!(
            operation = operations::SET_OPERATING_STATUS,
            operational, "operating status changed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> OperationsService {
        OperationsService::new(Arc::new(LedgerStore::new(
            Address::new("owner"),
            Address::new("AL1"),
        )))
    }

    #[tokio::test]
    async fn test_initial_status_is_not_operational() {
        assert!(!service().is_operational().await);
    }

    #[tokio::test]
    async fn test_only_owner_may_flip_switch() {
        let gate = service();
        let err = gate
            .set_operating_status(true, &Address::new("intruder"))
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::NotContractOwner(Address::new("intruder")));
        assert!(!gate.is_operational().await);

        gate.set_operating_status(true, &Address::new("owner"))
            .await
            .unwrap();
        assert!(gate.is_operational().await);

        gate.set_operating_status(false, &Address::new("owner"))
            .await
            .unwrap();
        assert!(!gate.is_operational().await);
    }
}
