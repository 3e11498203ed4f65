//! Flight registry.
//!
//! Flights are identified by (airline, code, scheduled departure); only an
//! airline at the funding threshold may register one. The status field is
//! finalized later, exactly once, by the oracle quorum protocol.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use surety_core::logging::operations;
use surety_core::{Address, FlightKey, FlightRecord, LedgerError, LedgerEvent, LedgerResult};
use tracing::info;

use super::Ledger;
use crate::outbox::EventOutbox;
use crate::store::LedgerStore;

/// Flight Registry trait
#[async_trait]
pub trait FlightLedger: Ledger {
    /// Register a flight for a funded airline.
    async fn register_flight(
        &self,
        airline: &Address,
        code: &str,
        departs_at: i64,
    ) -> LedgerResult<FlightRecord>;

    /// Get a flight by code.
    async fn get_flight(&self, code: &str) -> LedgerResult<FlightRecord>;

    /// Insured passengers on a flight, in purchase order.
    async fn get_flight_passengers(
        &self,
        airline: &Address,
        code: &str,
        departs_at: i64,
    ) -> LedgerResult<Vec<Address>>;
}

/// Flight registry over the shared store.
pub struct FlightService {
    store: Arc<LedgerStore>,
    outbox: EventOutbox,
}

impl FlightService {
    pub fn new(store: Arc<LedgerStore>, outbox: EventOutbox) -> Self {
        Self { store, outbox }
    }
}

#[async_trait]
impl Ledger for FlightService {
    fn name(&self) -> &'static str {
        "flights"
    }

    async fn current_sequence(&self) -> LedgerResult<u64> {
        Ok(self.store.current_sequence())
    }

    async fn verify_integrity(&self) -> LedgerResult<bool> {
        let state = self.store.read();
        // The code index must point at live flights, and every listed
        // passenger must hold a policy.
        let index_live = state
            .flights_by_code
            .values()
            .all(|key| state.flights.contains_key(key));
        let passengers_insured = state.flights.values().all(|flight| {
            flight.passengers.iter().all(|passenger| {
                state
                    .policies
                    .contains_key(&(passenger.clone(), flight.key.clone()))
            })
        });
        Ok(index_live && passengers_insured)
    }
}

#[async_trait]
impl FlightLedger for FlightService {
    async fn register_flight(
        &self,
        airline: &Address,
        code: &str,
        departs_at: i64,
    ) -> LedgerResult<FlightRecord> {
        let (record, facts) = {
            let mut state = self.store.write();
            state.require_operational()?;
            state.require_funded_airline(airline)?;

            let key = FlightKey::new(airline.clone(), code, departs_at);
            if state.flights.contains_key(&key) {
                return Err(LedgerError::FlightAlreadyExists(key.to_string()));
            }

            let record = FlightRecord::new(key.clone(), Utc::now());
            state.flights.insert(key.clone(), record.clone());
            state.flights_by_code.insert(code.to_string(), key.clone());

            let facts = self
                .store
                .stamp(vec![LedgerEvent::FlightRegistered { flight: key }]);
            (record, facts)
        };

        info!(
            operation = operations::REGISTER_FLIGHT,
            flight = %record.key,
            "flight registered"
        );
        self.outbox.send_all(facts);
        Ok(record)
    }

    async fn get_flight(&self, code: &str) -> LedgerResult<FlightRecord> {
        let state = self.store.read();
        state
            .flights_by_code
            .get(code)
            .and_then(|key| state.flights.get(key))
            .cloned()
            .ok_or_else(|| LedgerError::FlightNotFound(code.to_string()))
    }

    async fn get_flight_passengers(
        &self,
        airline: &Address,
        code: &str,
        departs_at: i64,
    ) -> LedgerResult<Vec<Address>> {
        let key = FlightKey::new(airline.clone(), code, departs_at);
        self.store
            .read()
            .flights
            .get(&key)
            .map(|flight| flight.passengers.clone())
            .ok_or_else(|| LedgerError::FlightNotFound(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{AirlineLedger, AirlineService, OperationsGate, OperationsService};
    use surety_core::{FlightStatus, Value};

    fn addr(id: &str) -> Address {
        Address::new(id)
    }

    async fn funded_registry() -> (Arc<LedgerStore>, FlightService) {
        let store = Arc::new(LedgerStore::new(addr("owner"), addr("AL1")));
        OperationsService::new(store.clone())
            .set_operating_status(true, &addr("owner"))
            .await
            .unwrap();
        AirlineService::new(store.clone(), EventOutbox::disabled())
            .fund(&addr("AL1"), Value::from_units(10))
            .await
            .unwrap();
        let service = FlightService::new(store.clone(), EventOutbox::disabled());
        (store, service)
    }

    #[tokio::test]
    async fn test_funded_airline_registers_flights() {
        let (_, service) = funded_registry().await;
        for (code, ts) in [("101", 1_000), ("102", 2_000), ("103", 3_000)] {
            service.register_flight(&addr("AL1"), code, ts).await.unwrap();
        }

        let flight = service.get_flight("102").await.unwrap();
        assert_eq!(flight.key.code, "102");
        assert_eq!(flight.status, FlightStatus::Unknown);
        assert!(service.verify_integrity().await.unwrap());
    }

    #[tokio::test]
    async fn test_unfunded_airline_cannot_register() {
        let store = Arc::new(LedgerStore::new(addr("owner"), addr("AL1")));
        OperationsService::new(store.clone())
            .set_operating_status(true, &addr("owner"))
            .await
            .unwrap();
        let service = FlightService::new(store, EventOutbox::disabled());

        let err = service
            .register_flight(&addr("AL1"), "201", 1_000)
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::AirlineBelowMinimumFunding(addr("AL1")));
    }

    #[tokio::test]
    async fn test_duplicate_flight_rejected() {
        let (_, service) = funded_registry().await;
        service.register_flight(&addr("AL1"), "101", 1_000).await.unwrap();
        let err = service
            .register_flight(&addr("AL1"), "101", 1_000)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::FlightAlreadyExists(_)));

        // A different departure is a different flight.
        service.register_flight(&addr("AL1"), "101", 2_000).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_flight_miss() {
        let (_, service) = funded_registry().await;
        assert_eq!(
            service.get_flight("999").await.unwrap_err(),
            LedgerError::FlightNotFound("999".to_string())
        );
    }
}
