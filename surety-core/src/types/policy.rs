//! Passenger insurance policies.

use super::address::Address;
use super::flight::FlightKey;
use crate::value::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A passenger's insurance record for one specific flight.
///
/// There is exactly one policy per (passenger, flight) pair; a repeat
/// purchase on the same flight is rejected, never merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassengerPolicy {
    pub passenger: Address,
    pub flight: FlightKey,
    /// Premium retained after the purchase cap; excess was refunded.
    pub insured_value: Value,
    /// Owed payout. Set once on airline-fault delay, cleared once on
    /// withdrawal.
    pub payout_credit: Value,
    pub purchased_at: DateTime<Utc>,
}

impl PassengerPolicy {
    pub fn new(
        passenger: Address,
        flight: FlightKey,
        insured_value: Value,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            passenger,
            flight,
            insured_value,
            payout_credit: Value::ZERO,
            purchased_at: now,
        }
    }
}
