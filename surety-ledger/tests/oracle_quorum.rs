//! Oracle quorum scenarios: registration, request dispatch, response
//! tallies, and delay-triggered crediting.

use std::sync::Arc;
use surety_core::{Address, FlightStatus, Value};
use surety_ledger::{
    AirlineLedger, AirlineService, EventOutbox, FlightLedger, FlightService, InsuranceLedger,
    InsuranceService, Ledger, LedgerStore, OperationsGate, OperationsService, OracleLedger,
    OracleService, SubmissionOutcome,
};

const OWNER: &str = "owner";
const AIRLINE: &str = "AL1";
const DEPARTS_AT: i64 = 1_661_087_400_000;

struct Harness {
    airlines: AirlineService,
    flights: FlightService,
    insurance: InsuranceService,
    oracles: OracleService,
}

impl Harness {
    /// A commissioned federation with one funded airline and flight "101".
    async fn with_flight() -> Self {
        let store = Arc::new(LedgerStore::new(Address::new(OWNER), Address::new(AIRLINE)));
        OperationsService::new(store.clone())
            .set_operating_status(true, &Address::new(OWNER))
            .await
            .unwrap();
        let harness = Self {
            airlines: AirlineService::new(store.clone(), EventOutbox::disabled()),
            flights: FlightService::new(store.clone(), EventOutbox::disabled()),
            insurance: InsuranceService::new(store.clone(), EventOutbox::disabled()),
            oracles: OracleService::new(store, EventOutbox::disabled()),
        };
        harness
            .airlines
            .fund(&Address::new(AIRLINE), Value::from_units(10))
            .await
            .unwrap();
        harness
            .flights
            .register_flight(&Address::new(AIRLINE), "101", DEPARTS_AT)
            .await
            .unwrap();
        harness
    }

    /// Register oracles until `need` of them hold the open index. Index
    /// sets are drawn per registration, so the population is grown until
    /// enough reporters qualify.
    async fn matching_oracles(&self, open_index: u8, need: usize) -> Vec<Address> {
        let mut matching = Vec::new();
        for n in 0..300 {
            let payer = Address::new(format!("oracle-{n}"));
            let record = self
                .oracles
                .register_oracle(&payer, Value::from_units(1))
                .await
                .unwrap();
            if record.is_assigned(open_index) {
                matching.push(payer);
                if matching.len() == need {
                    break;
                }
            }
        }
        assert!(
            matching.len() >= need,
            "population did not yield {need} oracles holding index {open_index}"
        );
        matching
    }

    async fn submit(
        &self,
        oracle: &Address,
        index: u8,
        status: FlightStatus,
    ) -> SubmissionOutcome {
        self.oracles
            .submit_oracle_response(oracle, index, &Address::new(AIRLINE), "101", DEPARTS_AT, status)
            .await
            .unwrap()
    }

    async fn flight_status(&self) -> FlightStatus {
        self.flights.get_flight("101").await.unwrap().status
    }
}

#[tokio::test]
async fn test_three_distinct_reports_finalize_and_credit() {
    let harness = Harness::with_flight().await;
    harness
        .insurance
        .buy(
            &Address::new("P1"),
            &Address::new(AIRLINE),
            "101",
            DEPARTS_AT,
            Value::from_units(1),
        )
        .await
        .unwrap();

    let request = harness
        .oracles
        .fetch_flight_status(&Address::new(AIRLINE), "101", DEPARTS_AT)
        .await
        .unwrap();
    let reporters = harness.matching_oracles(request.open_index, 3).await;

    assert_eq!(
        harness
            .submit(&reporters[0], request.open_index, FlightStatus::LateAirline)
            .await,
        SubmissionOutcome::Accepted
    );
    assert_eq!(
        harness
            .submit(&reporters[1], request.open_index, FlightStatus::LateAirline)
            .await,
        SubmissionOutcome::Accepted
    );
    assert_eq!(harness.flight_status().await, FlightStatus::Unknown);

    assert_eq!(
        harness
            .submit(&reporters[2], request.open_index, FlightStatus::LateAirline)
            .await,
        SubmissionOutcome::Resolved(FlightStatus::LateAirline)
    );
    assert_eq!(harness.flight_status().await, FlightStatus::LateAirline);

    // The airline-fault resolution credited the insuree 3/2 of the premium.
    assert_eq!(
        harness
            .insurance
            .get_balance_due(&Address::new("P1"))
            .await
            .unwrap(),
        Value::from_micros(1_500_000)
    );
    assert!(harness.insurance.verify_integrity().await.unwrap());
    assert!(harness.oracles.verify_integrity().await.unwrap());
}

#[tokio::test]
async fn test_two_matching_and_one_differing_leave_status_unknown() {
    let harness = Harness::with_flight().await;
    let request = harness
        .oracles
        .fetch_flight_status(&Address::new(AIRLINE), "101", DEPARTS_AT)
        .await
        .unwrap();
    let reporters = harness.matching_oracles(request.open_index, 3).await;

    harness
        .submit(&reporters[0], request.open_index, FlightStatus::LateAirline)
        .await;
    harness
        .submit(&reporters[1], request.open_index, FlightStatus::LateAirline)
        .await;
    let outcome = harness
        .submit(&reporters[2], request.open_index, FlightStatus::OnTime)
        .await;
    assert_eq!(outcome, SubmissionOutcome::Accepted);

    // No code reached three distinct reporters.
    assert_eq!(harness.flight_status().await, FlightStatus::Unknown);
}

#[tokio::test]
async fn test_repeat_reports_by_one_oracle_count_once() {
    let harness = Harness::with_flight().await;
    let request = harness
        .oracles
        .fetch_flight_status(&Address::new(AIRLINE), "101", DEPARTS_AT)
        .await
        .unwrap();
    let reporters = harness.matching_oracles(request.open_index, 1).await;

    for _ in 0..3 {
        harness
            .submit(&reporters[0], request.open_index, FlightStatus::LateAirline)
            .await;
    }
    assert_eq!(harness.flight_status().await, FlightStatus::Unknown);
}

#[tokio::test]
async fn test_post_resolution_reports_never_recredit() {
    let harness = Harness::with_flight().await;
    harness
        .insurance
        .buy(
            &Address::new("P1"),
            &Address::new(AIRLINE),
            "101",
            DEPARTS_AT,
            Value::from_units(1),
        )
        .await
        .unwrap();

    let request = harness
        .oracles
        .fetch_flight_status(&Address::new(AIRLINE), "101", DEPARTS_AT)
        .await
        .unwrap();
    let reporters = harness.matching_oracles(request.open_index, 4).await;

    for reporter in &reporters[..3] {
        harness
            .submit(reporter, request.open_index, FlightStatus::LateAirline)
            .await;
    }
    assert_eq!(harness.flight_status().await, FlightStatus::LateAirline);

    // A late fourth report is kept for bookkeeping but cannot re-finalize
    // or double-credit.
    assert_eq!(
        harness
            .submit(&reporters[3], request.open_index, FlightStatus::LateAirline)
            .await,
        SubmissionOutcome::AcceptedAfterResolution
    );
    assert_eq!(
        harness
            .insurance
            .get_balance_due(&Address::new("P1"))
            .await
            .unwrap(),
        Value::from_micros(1_500_000)
    );

    // Crediting again through the insurance ledger is also a no-op.
    assert_eq!(
        harness
            .insurance
            .credit_insurees(&Address::new(AIRLINE), "101", DEPARTS_AT)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_non_fault_resolution_does_not_credit() {
    let harness = Harness::with_flight().await;
    harness
        .insurance
        .buy(
            &Address::new("P1"),
            &Address::new(AIRLINE),
            "101",
            DEPARTS_AT,
            Value::from_units(1),
        )
        .await
        .unwrap();

    let request = harness
        .oracles
        .fetch_flight_status(&Address::new(AIRLINE), "101", DEPARTS_AT)
        .await
        .unwrap();
    let reporters = harness.matching_oracles(request.open_index, 3).await;
    for reporter in &reporters {
        harness
            .submit(reporter, request.open_index, FlightStatus::OnTime)
            .await;
    }

    assert_eq!(harness.flight_status().await, FlightStatus::OnTime);
    assert_eq!(
        harness
            .insurance
            .get_balance_due(&Address::new("P1"))
            .await
            .unwrap(),
        Value::ZERO
    );
}

#[tokio::test]
async fn test_resolved_request_stays_resolved_on_refetch() {
    let harness = Harness::with_flight().await;
    let request = harness
        .oracles
        .fetch_flight_status(&Address::new(AIRLINE), "101", DEPARTS_AT)
        .await
        .unwrap();
    let reporters = harness.matching_oracles(request.open_index, 3).await;
    for reporter in &reporters {
        harness
            .submit(reporter, request.open_index, FlightStatus::LateWeather)
            .await;
    }
    assert_eq!(harness.flight_status().await, FlightStatus::LateWeather);

    let refetched = harness
        .oracles
        .fetch_flight_status(&Address::new(AIRLINE), "101", DEPARTS_AT)
        .await
        .unwrap();
    assert!(!refetched.is_open());
    assert_eq!(harness.flight_status().await, FlightStatus::LateWeather);
}
