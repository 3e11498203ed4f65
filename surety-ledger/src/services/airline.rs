//! Airline registry and admission consensus.
//!
//! Admission is a one-shot multi-party vote: the full approver set arrives
//! with the call. While the federation is small (fewer than four members) a
//! single vote from an existing member admits the candidate; from four
//! members on, at least half of the membership must approve, counting only
//! distinct approvers that are themselves members.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use surety_core::logging::operations;
use surety_core::{
    Address, AirlineRecord, LedgerError, LedgerEvent, LedgerResult, Value,
    MULTIPARTY_CONSENSUS_THRESHOLD,
};
use tracing::info;

use super::Ledger;
use crate::outbox::EventOutbox;
use crate::store::LedgerStore;

/// Airline Registry trait
#[async_trait]
pub trait AirlineLedger: Ledger {
    /// Get an airline record by address.
    async fn get_airline(&self, address: &Address) -> LedgerResult<AirlineRecord>;

    /// Admit a candidate airline on the approvers' votes.
    async fn register_airline(
        &self,
        approvers: &[Address],
        candidate: &Address,
    ) -> LedgerResult<AirlineRecord>;

    /// Add funding to an airline's balance. Reaching the funding threshold
    /// makes the airline a full participant; there is no minimum per call.
    async fn fund(&self, airline: &Address, value: Value) -> LedgerResult<AirlineRecord>;

    /// Get an airline record, only if it has reached the funding threshold.
    async fn get_valid_airline(&self, address: &Address) -> LedgerResult<AirlineRecord>;
}

/// Airline registry over the shared store.
pub struct AirlineService {
    store: Arc<LedgerStore>,
    outbox: EventOutbox,
}

impl AirlineService {
    pub fn new(store: Arc<LedgerStore>, outbox: EventOutbox) -> Self {
        Self { store, outbox }
    }
}

#[async_trait]
impl Ledger for AirlineService {
    fn name(&self) -> &'static str {
        "airlines"
    }

    async fn current_sequence(&self) -> LedgerResult<u64> {
        Ok(self.store.current_sequence())
    }

    async fn verify_integrity(&self) -> LedgerResult<bool> {
        let state = self.store.read();
        let funding = Value::checked_sum(state.airlines.values().map(|a| a.funding));
        Ok(funding == Some(state.totals.funding_received))
    }
}

#[async_trait]
impl AirlineLedger for AirlineService {
    async fn get_airline(&self, address: &Address) -> LedgerResult<AirlineRecord> {
        self.store
            .read()
            .airlines
            .get(address)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("airline {address}")))
    }

    async fn register_airline(
        &self,
        approvers: &[Address],
        candidate: &Address,
    ) -> LedgerResult<AirlineRecord> {
        let (record, facts) = {
            let mut state = self.store.write();
            state.require_operational()?;

            if state.airlines.contains_key(candidate) {
                return Err(LedgerError::AirlineAlreadyRegistered(candidate.clone()));
            }

            let registered = state.registered_count();
            if approvers.is_empty() {
                return Err(LedgerError::MinimumConsensusNotMet {
                    approvals: 0,
                    registered,
                });
            }

            // Only distinct approvers that are themselves members count.
            let qualifying: BTreeSet<Address> = approvers
                .iter()
                .filter(|a| state.airlines.contains_key(a))
                .cloned()
                .collect();

            if registered < MULTIPARTY_CONSENSUS_THRESHOLD {
                if qualifying.is_empty() {
                    return Err(LedgerError::AirlineNotRegistered(approvers[0].clone()));
                }
            } else if qualifying.len() * 2 < registered {
                return Err(LedgerError::MinimumConsensusNotMet {
                    approvals: qualifying.len(),
                    registered,
                });
            }

            let approvals = qualifying.len();
            let record = AirlineRecord::new(candidate.clone(), qualifying, Utc::now());
            state.airlines.insert(candidate.clone(), record.clone());

            let facts = self.store.stamp(vec![LedgerEvent::AirlineRegistered {
                airline: candidate.clone(),
                approvals,
            }]);
            (record, facts)
        };

        info!(
            operation = operations::REGISTER_AIRLINE,
            airline = %candidate,
            approvals = record.approved_by.len(),
            "airline admitted"
        );
        self.outbox.send_all(facts);
        Ok(record)
    }

    async fn fund(&self, airline: &Address, value: Value) -> LedgerResult<AirlineRecord> {
        let (record, facts) = {
            let mut state = self.store.write();
            state.require_operational()?;

            let record = state
                .airlines
                .get_mut(airline)
                .ok_or_else(|| LedgerError::AirlineNotRegistered(airline.clone()))?;
            record.funding = record
                .funding
                .checked_add(value)
                .ok_or(LedgerError::ValueOverflow)?;
            let record = record.clone();

            state.totals.funding_received = state
                .totals
                .funding_received
                .checked_add(value)
                .ok_or(LedgerError::ValueOverflow)?;

            let facts = self.store.stamp(vec![LedgerEvent::AirlineFunded {
                airline: airline.clone(),
                amount: value,
                total_funding: record.funding,
            }]);
            (record, facts)
        };

        info!(
            operation = operations::FUND_AIRLINE,
            airline = %airline,
            amount_micros = value.micros(),
            funded = record.is_funded(),
            "airline funded"
        );
        self.outbox.send_all(facts);
        Ok(record)
    }

    async fn get_valid_airline(&self, address: &Address) -> LedgerResult<AirlineRecord> {
        self.store
            .read()
            .require_funded_airline(address)
            .map(Clone::clone)
    }
}
