//! Flight records and delay status.

use super::address::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Flight delay status as finalized by the oracle swarm.
///
/// Wire codes follow the oracle protocol: multiples of ten so relays can
/// extend the set without colliding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightStatus {
    Unknown,
    OnTime,
    LateAirline,
    LateWeather,
    LateTechnical,
    LateOther,
}

impl FlightStatus {
    /// Numeric status code used on the oracle wire.
    pub fn code(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::OnTime => 10,
            Self::LateAirline => 20,
            Self::LateWeather => 30,
            Self::LateTechnical => 40,
            Self::LateOther => 50,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Unknown),
            10 => Some(Self::OnTime),
            20 => Some(Self::LateAirline),
            30 => Some(Self::LateWeather),
            40 => Some(Self::LateTechnical),
            50 => Some(Self::LateOther),
            _ => None,
        }
    }

    /// Airline-fault delays obligate payout crediting.
    pub fn is_airline_fault(self) -> bool {
        matches!(self, Self::LateAirline)
    }
}

impl Default for FlightStatus {
    fn default() -> Self {
        Self::Unknown
    }
}

/// Composite identity of a scheduled flight.
///
/// `departs_at` is the scheduled departure as epoch milliseconds; the ledger
/// treats it as an opaque key component.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FlightKey {
    pub airline: Address,
    pub code: String,
    pub departs_at: i64,
}

impl FlightKey {
    pub fn new(airline: Address, code: impl Into<String>, departs_at: i64) -> Self {
        Self {
            airline,
            code: code.into(),
            departs_at,
        }
    }
}

impl fmt::Display for FlightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.airline, self.code, self.departs_at)
    }
}

/// A registered flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightRecord {
    pub key: FlightKey,
    /// Finalized exactly once by oracle quorum resolution.
    pub status: FlightStatus,
    /// Passengers holding policies on this flight, in purchase order.
    pub passengers: Vec<Address>,
    /// Set when payout crediting has run; guards against double-crediting.
    pub insurees_credited: bool,
    pub registered_at: DateTime<Utc>,
}

impl FlightRecord {
    pub fn new(key: FlightKey, now: DateTime<Utc>) -> Self {
        Self {
            key,
            status: FlightStatus::Unknown,
            passengers: Vec::new(),
            insurees_credited: false,
            registered_at: now,
        }
    }

    /// Whether the status has been finalized.
    pub fn is_finalized(&self) -> bool {
        self.status != FlightStatus::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_roundtrip() {
        for status in [
            FlightStatus::Unknown,
            FlightStatus::OnTime,
            FlightStatus::LateAirline,
            FlightStatus::LateWeather,
            FlightStatus::LateTechnical,
            FlightStatus::LateOther,
        ] {
            assert_eq!(FlightStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(FlightStatus::from_code(15), None);
    }

    #[test]
    fn test_only_late_airline_is_airline_fault() {
        assert!(FlightStatus::LateAirline.is_airline_fault());
        assert!(!FlightStatus::LateWeather.is_airline_fault());
        assert!(!FlightStatus::OnTime.is_airline_fault());
    }

    #[test]
    fn test_new_flight_is_unresolved() {
        let key = FlightKey::new(Address::new("AL1"), "101", 1_661_087_400_000);
        let flight = FlightRecord::new(key, Utc::now());
        assert!(!flight.is_finalized());
        assert!(!flight.insurees_credited);
        assert!(flight.passengers.is_empty());
    }
}
