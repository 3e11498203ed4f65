//! Insurance ledger - purchase, crediting, withdrawal.
//!
//! Premiums are capped at one unit with the excess returned in the same
//! operation. Crediting grants each policy on a flight 3/2 of its premium,
//! exactly once per flight. Withdrawal follows checks-effects order: the
//! amount due is computed and the credits zeroed before the transfer is
//! reported, so a concurrent second call can only ever observe zero.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use surety_core::logging::operations;
use surety_core::{
    max_insurance_value, Address, FlightKey, LedgerError, LedgerEvent, LedgerResult,
    PassengerPolicy, Value,
};
use tracing::info;

use super::Ledger;
use crate::outbox::EventOutbox;
use crate::store::LedgerStore;

/// Result of a purchase: the policy created and any change returned.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PurchaseReceipt {
    pub policy: PassengerPolicy,
    /// Excess over the cap, returned to the payer in the same operation.
    pub refunded: Value,
}

/// Insurance Ledger trait
#[async_trait]
pub trait InsuranceLedger: Ledger {
    /// Buy insurance on a flight. The insured value is the offered value
    /// capped at one unit; the rest is refunded, never retained.
    async fn buy(
        &self,
        passenger: &Address,
        airline: &Address,
        code: &str,
        departs_at: i64,
        offered: Value,
    ) -> LedgerResult<PurchaseReceipt>;

    /// Credit every insuree on the flight with 3/2 of their premium.
    /// Idempotent per flight; returns the number of policies credited.
    async fn credit_insurees(
        &self,
        airline: &Address,
        code: &str,
        departs_at: i64,
    ) -> LedgerResult<usize>;

    /// Withdraw the passenger's full outstanding credit. Returns the amount
    /// transferred; zero when nothing is due.
    async fn pay(&self, passenger: &Address) -> LedgerResult<Value>;

    /// Outstanding credit for a passenger. Pure read.
    async fn get_balance_due(&self, passenger: &Address) -> LedgerResult<Value>;

    /// The passenger's policies, most recent last.
    async fn get_passenger(&self, passenger: &Address) -> LedgerResult<Vec<PassengerPolicy>>;
}

/// Insurance ledger over the shared store.
pub struct InsuranceService {
    store: Arc<LedgerStore>,
    outbox: EventOutbox,
}

impl InsuranceService {
    pub fn new(store: Arc<LedgerStore>, outbox: EventOutbox) -> Self {
        Self { store, outbox }
    }
}

#[async_trait]
impl Ledger for InsuranceService {
    fn name(&self) -> &'static str {
        "insurance"
    }

    async fn current_sequence(&self) -> LedgerResult<u64> {
        Ok(self.store.current_sequence())
    }

    async fn verify_integrity(&self) -> LedgerResult<bool> {
        Ok(self.store.read().conserves_value())
    }
}

#[async_trait]
impl InsuranceLedger for InsuranceService {
    async fn buy(
        &self,
        passenger: &Address,
        airline: &Address,
        code: &str,
        departs_at: i64,
        offered: Value,
    ) -> LedgerResult<PurchaseReceipt> {
        let key = FlightKey::new(airline.clone(), code, departs_at);
        let (receipt, facts) = {
            let mut state = self.store.write();
            state.require_operational()?;

            if !state.flights.contains_key(&key) {
                return Err(LedgerError::FlightNotFound(key.to_string()));
            }
            let policy_key = (passenger.clone(), key.clone());
            if state.policies.contains_key(&policy_key) {
                return Err(LedgerError::AlreadyInsured {
                    passenger: passenger.clone(),
                    flight: key.to_string(),
                });
            }

            let insured = offered.min(max_insurance_value());
            // offered >= insured, so the subtraction cannot fail.
            let refunded = offered.checked_sub(insured).unwrap_or(Value::ZERO);
            // Validate before mutating so a failure leaves no partial state.
            let premiums_retained = state
                .totals
                .premiums_retained
                .checked_add(insured)
                .ok_or(LedgerError::ValueOverflow)?;

            let policy =
                PassengerPolicy::new(passenger.clone(), key.clone(), insured, Utc::now());
            state.policies.insert(policy_key, policy.clone());
            if let Some(flight) = state.flights.get_mut(&key) {
                flight.passengers.push(passenger.clone());
            }
            state.totals.premiums_retained = premiums_retained;

            let mut events = vec![LedgerEvent::PassengerInsured {
                passenger: passenger.clone(),
                flight: key.clone(),
                insured_value: insured,
            }];
            if !refunded.is_zero() {
                events.push(LedgerEvent::PremiumRefunded {
                    passenger: passenger.clone(),
                    flight: key.clone(),
                    refunded,
                });
            }
            let facts = self.store.stamp(events);
            (PurchaseReceipt { policy, refunded }, facts)
        };

        info!(
            operation = operations::BUY_INSURANCE,
            passenger = %passenger,
            flight = %key,
            insured_micros = receipt.policy.insured_value.micros(),
            refunded_micros = receipt.refunded.micros(),
            "insurance purchased"
        );
        self.outbox.send_all(facts);
        Ok(receipt)
    }

    async fn credit_insurees(
        &self,
        airline: &Address,
        code: &str,
        departs_at: i64,
    ) -> LedgerResult<usize> {
        let key = FlightKey::new(airline.clone(), code, departs_at);
        let (granted, facts) = {
            let mut state = self.store.write();
            state.require_operational()?;

            if !state.flights.contains_key(&key) {
                return Err(LedgerError::FlightNotFound(key.to_string()));
            }

            let granted = state.credit_flight_policies(&key);
            let events = granted
                .iter()
                .map(|(passenger, credit)| LedgerEvent::InsureeCredited {
                    passenger: passenger.clone(),
                    flight: key.clone(),
                    credit: *credit,
                })
                .collect();
            let facts = self.store.stamp(events);
            (granted, facts)
        };

        info!(
            operation = operations::CREDIT_INSUREES,
            flight = %key,
            count = granted.len(),
            "insurees credited"
        );
        self.outbox.send_all(facts);
        Ok(granted.len())
    }

    async fn pay(&self, passenger: &Address) -> LedgerResult<Value> {
        let (due, facts) = {
            let mut state = self.store.write();
            state.require_operational()?;

            // Compute the amount due, then zero the credits, and only then
            // report the transfer.
            let due = Value::checked_sum(
                state
                    .policies
                    .values()
                    .filter(|p| &p.passenger == passenger)
                    .map(|p| p.payout_credit),
            )
            .ok_or(LedgerError::ValueOverflow)?;

            if due.is_zero() {
                (due, Vec::new())
            } else {
                let payouts_executed = state
                    .totals
                    .payouts_executed
                    .checked_add(due)
                    .ok_or(LedgerError::ValueOverflow)?;
                for policy in state
                    .policies
                    .values_mut()
                    .filter(|p| &p.passenger == passenger)
                {
                    policy.payout_credit = Value::ZERO;
                }
                state.totals.payouts_executed = payouts_executed;
                let facts = self.store.stamp(vec![LedgerEvent::PayoutExecuted {
                    passenger: passenger.clone(),
                    amount: due,
                }]);
                (due, facts)
            }
        };

        info!(
            operation = operations::PAY_INSUREE,
            passenger = %passenger,
            amount_micros = due.micros(),
            "payout executed"
        );
        self.outbox.send_all(facts);
        Ok(due)
    }

    async fn get_balance_due(&self, passenger: &Address) -> LedgerResult<Value> {
        let state = self.store.read();
        Value::checked_sum(
            state
                .policies
                .values()
                .filter(|p| &p.passenger == passenger)
                .map(|p| p.payout_credit),
        )
        .ok_or(LedgerError::ValueOverflow)
    }

    async fn get_passenger(&self, passenger: &Address) -> LedgerResult<Vec<PassengerPolicy>> {
        let state = self.store.read();
        let mut policies: Vec<PassengerPolicy> = state
            .policies
            .values()
            .filter(|p| &p.passenger == passenger)
            .cloned()
            .collect();
        policies.sort_by_key(|p| p.purchased_at);
        Ok(policies)
    }
}
