//! Oracle records and status requests.

use super::address::Address;
use super::flight::{FlightKey, FlightStatus};
use crate::constants::{INDEXES_PER_ORACLE, ORACLE_QUORUM};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// An independent status reporter with its fixed index assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleRecord {
    pub address: Address,
    /// Indices drawn at registration, fixed for the oracle's lifetime. An
    /// oracle may answer a request only when its set contains the request's
    /// open index.
    pub indexes: [u8; INDEXES_PER_ORACLE],
    pub registered_at: DateTime<Utc>,
}

impl OracleRecord {
    pub fn is_assigned(&self, index: u8) -> bool {
        self.indexes.contains(&index)
    }
}

/// Status request lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    Open,
    Resolved,
}

/// An open query for a flight's delay status.
///
/// Responses accumulate per status code as sets of distinct oracle
/// identities; the first code to collect a quorum resolves the request. A
/// request that never reaches quorum stays open indefinitely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRequest {
    pub flight: FlightKey,
    /// Index an oracle must hold for its response to count.
    pub open_index: u8,
    pub state: RequestState,
    /// Distinct reporters recorded under each status code.
    pub responses: BTreeMap<FlightStatus, BTreeSet<Address>>,
    pub opened_at: DateTime<Utc>,
}

impl StatusRequest {
    pub fn new(flight: FlightKey, open_index: u8, now: DateTime<Utc>) -> Self {
        Self {
            flight,
            open_index,
            state: RequestState::Open,
            responses: BTreeMap::new(),
            opened_at: now,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state == RequestState::Open
    }

    /// Distinct reporters recorded for a status code.
    pub fn report_count(&self, status: FlightStatus) -> usize {
        self.responses.get(&status).map_or(0, BTreeSet::len)
    }

    /// Record a reporter under a status code; `true` if newly recorded.
    /// A repeat report by the same oracle for the same code counts once.
    pub fn record(&mut self, status: FlightStatus, oracle: Address) -> bool {
        self.responses.entry(status).or_default().insert(oracle)
    }

    /// Whether a status code has collected the quorum of distinct reporters.
    pub fn has_quorum(&self, status: FlightStatus) -> bool {
        self.report_count(status) >= ORACLE_QUORUM
    }
}
