//! Airline membership records and the admission lifecycle.

use super::address::Address;
use crate::constants::min_airline_funding;
use crate::value::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Airline lifecycle status.
///
/// `Funded` is derived from the stored balance, never stored separately,
/// so it can never disagree with the funding the record actually holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AirlineStatus {
    Unregistered,
    Registered,
    Funded,
}

/// Airline membership record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirlineRecord {
    pub address: Address,
    /// Accumulated funding; monotonically non-decreasing.
    pub funding: Value,
    /// Distinct members whose votes admitted this airline. Empty for the
    /// bootstrap member.
    pub approved_by: BTreeSet<Address>,
    pub registered_at: DateTime<Utc>,
}

impl AirlineRecord {
    pub fn new(address: Address, approved_by: BTreeSet<Address>, now: DateTime<Utc>) -> Self {
        Self {
            address,
            funding: Value::ZERO,
            approved_by,
            registered_at: now,
        }
    }

    /// Whether this airline may register flights and back policies.
    pub fn is_funded(&self) -> bool {
        self.funding >= min_airline_funding()
    }

    pub fn status(&self) -> AirlineStatus {
        if self.is_funded() {
            AirlineStatus::Funded
        } else {
            AirlineStatus::Registered
        }
    }
}
