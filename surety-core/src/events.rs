//! Facts emitted for external observers.
//!
//! One fact per committed state transition, appended to the outbox strictly
//! after the transition commits. Facts are append-only; consumers (audit
//! sinks, oracle relays, clients) never influence the commit.

use crate::constants::INDEXES_PER_ORACLE;
use crate::types::{Address, FlightKey, FlightStatus};
use crate::value::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Observable state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerEvent {
    AirlineRegistered {
        airline: Address,
        approvals: usize,
    },
    AirlineFunded {
        airline: Address,
        amount: Value,
        total_funding: Value,
    },
    FlightRegistered {
        flight: FlightKey,
    },
    PassengerInsured {
        passenger: Address,
        flight: FlightKey,
        insured_value: Value,
    },
    /// Excess over the purchase cap returned to the payer.
    PremiumRefunded {
        passenger: Address,
        flight: FlightKey,
        refunded: Value,
    },
    InsureeCredited {
        passenger: Address,
        flight: FlightKey,
        credit: Value,
    },
    OracleRegistered {
        oracle: Address,
        indexes: [u8; INDEXES_PER_ORACLE],
    },
    /// A status request is open; oracles holding the index should answer.
    StatusRequested {
        flight: FlightKey,
        open_index: u8,
    },
    OracleReported {
        flight: FlightKey,
        oracle: Address,
        status: FlightStatus,
        reports: usize,
    },
    StatusResolved {
        flight: FlightKey,
        status: FlightStatus,
    },
    PayoutExecuted {
        passenger: Address,
        amount: Value,
    },
}

impl LedgerEvent {
    /// Stable name for logs and consumers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AirlineRegistered { .. } => "airline_registered",
            Self::AirlineFunded { .. } => "airline_funded",
            Self::FlightRegistered { .. } => "flight_registered",
            Self::PassengerInsured { .. } => "passenger_insured",
            Self::PremiumRefunded { .. } => "premium_refunded",
            Self::InsureeCredited { .. } => "insuree_credited",
            Self::OracleRegistered { .. } => "oracle_registered",
            Self::StatusRequested { .. } => "status_requested",
            Self::OracleReported { .. } => "oracle_reported",
            Self::StatusResolved { .. } => "status_resolved",
            Self::PayoutExecuted { .. } => "payout_executed",
        }
    }
}

/// A committed fact, stamped at commit time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmittedFact {
    /// Monotone across the whole ledger; gaps never occur.
    pub sequence_no: u64,
    pub recorded_at: DateTime<Utc>,
    pub event: LedgerEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_matches_serde_tag() {
        let event = LedgerEvent::PayoutExecuted {
            passenger: Address::new("P1"),
            amount: Value::from_units(1),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], event.kind());
    }
}
