//! Single-owner state store for all mutable ledger records.
//!
//! All registries live behind one `RwLock`; a mutating operation takes the
//! write guard, validates, applies its full transition, and stamps its facts
//! before the guard drops. Readers take a stable snapshot. This is the
//! serialization point for every rule in the protocol, including quorum
//! resolution: responses are applied in a single global order, so exactly
//! one status code can cross the threshold first.

use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use surety_core::{
    Address, AirlineRecord, EmittedFact, FlightKey, FlightRecord, LedgerError, LedgerEvent,
    LedgerResult, OracleRecord, PassengerPolicy, StatusRequest, Value,
};

/// Running monetary totals, maintained on every commit and used by the
/// integrity checks to assert conservation.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Totals {
    /// Airline funding received.
    pub funding_received: Value,
    /// Premiums retained after the purchase cap (refunds excluded).
    pub premiums_retained: Value,
    /// Oracle registration fees collected.
    pub fees_collected: Value,
    /// Payout credits granted to insurees.
    pub credits_granted: Value,
    /// Payouts transferred out on withdrawal.
    pub payouts_executed: Value,
}

/// All mutable records. Owned exclusively by [`LedgerStore`].
#[derive(Debug, Default)]
pub(crate) struct LedgerState {
    pub operational: bool,
    pub airlines: HashMap<Address, AirlineRecord>,
    pub flights: HashMap<FlightKey, FlightRecord>,
    /// Lookup index for `get_flight(code)`; the full key is the identity.
    pub flights_by_code: HashMap<String, FlightKey>,
    pub policies: HashMap<(Address, FlightKey), PassengerPolicy>,
    pub oracles: HashMap<Address, OracleRecord>,
    pub requests: HashMap<FlightKey, StatusRequest>,
    pub totals: Totals,
}

impl LedgerState {
    pub(crate) fn require_operational(&self) -> LedgerResult<()> {
        if self.operational {
            Ok(())
        } else {
            Err(LedgerError::NotOperational)
        }
    }

    /// Airlines currently admitted (registered or funded).
    pub(crate) fn registered_count(&self) -> usize {
        self.airlines.len()
    }

    /// The airline, only if it has reached the funding threshold.
    pub(crate) fn require_funded_airline(&self, address: &Address) -> LedgerResult<&AirlineRecord> {
        match self.airlines.get(address) {
            Some(airline) if airline.is_funded() => Ok(airline),
            _ => Err(LedgerError::AirlineBelowMinimumFunding(address.clone())),
        }
    }

    /// Grant payout credits to every policy on the flight, exactly once.
    ///
    /// Returns the (passenger, credit) pairs granted; empty when the flight
    /// was already credited or carries no policies. The caller must have
    /// verified the flight exists.
    pub(crate) fn credit_flight_policies(&mut self, key: &FlightKey) -> Vec<(Address, Value)> {
        let passengers = match self.flights.get_mut(key) {
            Some(flight) if !flight.insurees_credited => {
                flight.insurees_credited = true;
                flight.passengers.clone()
            }
            _ => return Vec::new(),
        };

        let mut granted = Vec::with_capacity(passengers.len());
        for passenger in passengers {
            if let Some(policy) = self.policies.get_mut(&(passenger.clone(), key.clone())) {
                let credit = policy.insured_value.payout_credit();
                policy.payout_credit = credit;
                self.totals.credits_granted = self
                    .totals
                    .credits_granted
                    .checked_add(credit)
                    .unwrap_or(self.totals.credits_granted);
                granted.push((passenger, credit));
            }
        }
        granted
    }

    /// Conservation over the escrow: credits granted equal payouts executed
    /// plus credits still outstanding on live policies, and retained
    /// premiums equal the sum of insured values.
    pub(crate) fn conserves_value(&self) -> bool {
        let outstanding = Value::checked_sum(self.policies.values().map(|p| p.payout_credit));
        let insured = Value::checked_sum(self.policies.values().map(|p| p.insured_value));
        let (Some(outstanding), Some(insured)) = (outstanding, insured) else {
            return false;
        };
        self.totals
            .payouts_executed
            .checked_add(outstanding)
            .map_or(false, |total| total == self.totals.credits_granted)
            && insured == self.totals.premiums_retained
    }
}

/// Guarded store handed to every service.
///
/// The gate starts non-operational; the owner flips it on during
/// commissioning. The federation is bootstrapped with a first airline so
/// admission voting has a seed member.
pub struct LedgerStore {
    owner: Address,
    state: RwLock<LedgerState>,
    sequence: AtomicU64,
    entropy: AtomicU64,
}

impl LedgerStore {
    pub fn new(owner: Address, first_airline: Address) -> Self {
        let mut state = LedgerState::default();
        state.airlines.insert(
            first_airline.clone(),
            AirlineRecord::new(first_airline, Default::default(), Utc::now()),
        );
        Self {
            owner,
            state: RwLock::new(state),
            sequence: AtomicU64::new(0),
            entropy: AtomicU64::new(0),
        }
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, LedgerState> {
        self.state.read().unwrap()
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, LedgerState> {
        self.state.write().unwrap()
    }

    /// Facts committed so far.
    pub fn current_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Monotone counter feeding deterministic index derivation.
    pub(crate) fn next_entropy(&self) -> u64 {
        self.entropy.fetch_add(1, Ordering::SeqCst)
    }

    /// Stamp events with commit order and time. Called while the write
    /// guard is still held so sequence numbers follow application order.
    pub(crate) fn stamp(&self, events: Vec<LedgerEvent>) -> Vec<EmittedFact> {
        let now = Utc::now();
        events
            .into_iter()
            .map(|event| EmittedFact {
                sequence_no: self.sequence.fetch_add(1, Ordering::SeqCst) + 1,
                recorded_at: now,
                event,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn store() -> LedgerStore {
        LedgerStore::new(Address::new("owner"), Address::new("AL1"))
    }

    #[test]
    fn test_bootstrap_airline_registered_and_gate_closed() {
        let store = store();
        let state = store.read();
        assert!(state.airlines.contains_key(&Address::new("AL1")));
        assert!(!state.operational);
        assert_eq!(state.registered_count(), 1);
    }

    #[test]
    fn test_stamp_assigns_monotone_sequence() {
        let store = store();
        let facts = store.stamp(vec![
            LedgerEvent::AirlineRegistered {
                airline: Address::new("AL2"),
                approvals: 1,
            },
            LedgerEvent::AirlineFunded {
                airline: Address::new("AL2"),
                amount: Value::from_units(10),
                total_funding: Value::from_units(10),
            },
        ]);
        assert_eq!(facts[0].sequence_no, 1);
        assert_eq!(facts[1].sequence_no, 2);
        assert_eq!(store.current_sequence(), 2);
    }

    #[test]
    fn test_credit_flight_policies_runs_once() {
        let store = store();
        let key = FlightKey::new(Address::new("AL1"), "101", 0);
        {
            let mut state = store.write();
            state
                .flights
                .insert(key.clone(), FlightRecord::new(key.clone(), Utc::now()));
            let flight = state.flights.get_mut(&key).unwrap();
            flight.passengers.push(Address::new("P1"));
            state.policies.insert(
                (Address::new("P1"), key.clone()),
                PassengerPolicy::new(
                    Address::new("P1"),
                    key.clone(),
                    Value::from_units(1),
                    Utc::now(),
                ),
            );
            state.totals.premiums_retained = Value::from_units(1);
        }

        let mut state = store.write();
        let granted = state.credit_flight_policies(&key);
        assert_eq!(
            granted,
            vec![(Address::new("P1"), Value::from_micros(1_500_000))]
        );
        assert!(state.credit_flight_policies(&key).is_empty());
        assert!(state.conserves_value());
    }

    #[test]
    fn test_totals_serialize_in_micro_units() {
        let totals = Totals {
            premiums_retained: Value::from_units(1),
            ..Default::default()
        };
        let json = serde_json::to_value(&totals).unwrap();
        assert_eq!(json["premiums_retained"], 1_000_000);
    }
}
