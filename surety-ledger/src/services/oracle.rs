//! Oracle quorum protocol.
//!
//! Independent oracles register against a fee and receive three fixed
//! indices. A status request carries an open index; only oracles holding it
//! may answer, and mismatched or stale submissions are tolerated as no-ops
//! rather than errors, since relays retry freely. The first status code to
//! collect three distinct reporters resolves the request, finalizes the
//! flight status exactly once, and triggers insurance crediting when the
//! resolved code is an airline-fault delay. Responses are applied under the
//! store's write guard, so resolution is a function of the recorded tally,
//! never of arrival timing beyond who crossed the threshold first.

use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use surety_core::logging::operations;
use surety_core::{
    oracle_registration_fee, Address, FlightStatus, LedgerError, LedgerEvent, LedgerResult,
    OracleRecord, RequestState, StatusRequest, Value, FlightKey, INDEXES_PER_ORACLE,
    ORACLE_INDEX_RANGE,
};
use tracing::{debug, info};

use super::Ledger;
use crate::outbox::EventOutbox;
use crate::store::LedgerStore;

/// Outcome of a response submission. Mismatches are tolerated, not surfaced
/// as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionOutcome {
    /// Response recorded under the status code.
    Accepted,
    /// Response recorded after resolution; bookkeeping only.
    AcceptedAfterResolution,
    /// Index mismatch or unknown request; dropped silently.
    Ignored,
    /// This response completed the quorum and finalized the flight status.
    Resolved(FlightStatus),
}

/// Oracle Protocol trait
#[async_trait]
pub trait OracleLedger: Ledger {
    /// Register an oracle against the registration fee and assign its
    /// indices, fixed for the oracle's lifetime.
    async fn register_oracle(&self, payer: &Address, fee: Value) -> LedgerResult<OracleRecord>;

    /// The calling oracle's assigned indices.
    async fn get_my_indexes(&self, oracle: &Address) -> LedgerResult<[u8; INDEXES_PER_ORACLE]>;

    /// Open (or re-open the index of) the status request for a flight and
    /// emit the request fact for oracle relays.
    async fn fetch_flight_status(
        &self,
        airline: &Address,
        code: &str,
        departs_at: i64,
    ) -> LedgerResult<StatusRequest>;

    /// Submit an oracle's status report for a request.
    async fn submit_oracle_response(
        &self,
        oracle: &Address,
        index: u8,
        airline: &Address,
        code: &str,
        departs_at: i64,
        status: FlightStatus,
    ) -> LedgerResult<SubmissionOutcome>;
}

/// Oracle protocol over the shared store.
pub struct OracleService {
    store: Arc<LedgerStore>,
    outbox: EventOutbox,
}

impl OracleService {
    pub fn new(store: Arc<LedgerStore>, outbox: EventOutbox) -> Self {
        Self { store, outbox }
    }

    /// Deterministic digest over registration entropy: the participant
    /// identity, a monotone draw counter, and the current instant.
    fn entropy_digest(&self, subject: &Address) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(subject.as_str().as_bytes());
        hasher.update(self.store.next_entropy().to_be_bytes());
        hasher.update(Utc::now().timestamp_micros().to_be_bytes());
        hasher.finalize().into()
    }

    /// Draw the oracle's index set: distinct indices within one oracle's
    /// own assignment, each in 0..ORACLE_INDEX_RANGE.
    fn draw_indexes(&self, payer: &Address) -> [u8; INDEXES_PER_ORACLE] {
        let mut indexes = [0u8; INDEXES_PER_ORACLE];
        let mut drawn = 0;
        while drawn < INDEXES_PER_ORACLE {
            for byte in self.entropy_digest(payer) {
                if drawn == INDEXES_PER_ORACLE {
                    break;
                }
                let candidate = byte % ORACLE_INDEX_RANGE;
                if !indexes[..drawn].contains(&candidate) {
                    indexes[drawn] = candidate;
                    drawn += 1;
                }
            }
        }
        indexes
    }

    fn draw_open_index(&self, subject: &Address) -> u8 {
        self.entropy_digest(subject)[0] % ORACLE_INDEX_RANGE
    }
}

#[async_trait]
impl Ledger for OracleService {
    fn name(&self) -> &'static str {
        "oracles"
    }

    async fn current_sequence(&self) -> LedgerResult<u64> {
        Ok(self.store.current_sequence())
    }

    async fn verify_integrity(&self) -> LedgerResult<bool> {
        let state = self.store.read();
        // An open request must not already hold a quorum on any code, and
        // every index in every oracle's assignment must be in range.
        let open_below_quorum = state.requests.values().all(|request| {
            !request.is_open()
                || request
                    .responses
                    .keys()
                    .all(|status| !request.has_quorum(*status))
        });
        let indexes_in_range = state
            .oracles
            .values()
            .all(|o| o.indexes.iter().all(|i| *i < ORACLE_INDEX_RANGE));
        Ok(open_below_quorum && indexes_in_range)
    }
}

#[async_trait]
impl OracleLedger for OracleService {
    async fn register_oracle(&self, payer: &Address, fee: Value) -> LedgerResult<OracleRecord> {
        let (record, facts) = {
            let mut state = self.store.write();
            state.require_operational()?;

            let required = oracle_registration_fee();
            if fee < required {
                return Err(LedgerError::InsufficientFee {
                    offered: fee,
                    required,
                });
            }
            let fees_collected = state
                .totals
                .fees_collected
                .checked_add(fee)
                .ok_or(LedgerError::ValueOverflow)?;

            let record = OracleRecord {
                address: payer.clone(),
                indexes: self.draw_indexes(payer),
                registered_at: Utc::now(),
            };
            state.oracles.insert(payer.clone(), record.clone());
            state.totals.fees_collected = fees_collected;

            let facts = self.store.stamp(vec![LedgerEvent::OracleRegistered {
                oracle: payer.clone(),
                indexes: record.indexes,
            }]);
            (record, facts)
        };

        info!(
            operation = operations::REGISTER_ORACLE,
            oracle = %payer,
            indexes = ?record.indexes,
            "oracle registered"
        );
        self.outbox.send_all(facts);
        Ok(record)
    }

    async fn get_my_indexes(&self, oracle: &Address) -> LedgerResult<[u8; INDEXES_PER_ORACLE]> {
        self.store
            .read()
            .oracles
            .get(oracle)
            .map(|record| record.indexes)
            .ok_or_else(|| LedgerError::NotFound(format!("oracle {oracle}")))
    }

    async fn fetch_flight_status(
        &self,
        airline: &Address,
        code: &str,
        departs_at: i64,
    ) -> LedgerResult<StatusRequest> {
        let key = FlightKey::new(airline.clone(), code, departs_at);
        let (request, facts) = {
            let mut state = self.store.write();
            state.require_operational()?;

            let open_index = self.draw_open_index(airline);
            let request = state
                .requests
                .entry(key.clone())
                .or_insert_with(|| StatusRequest::new(key.clone(), open_index, Utc::now()));

            // A resolved request stays resolved; the flight status is final.
            if !request.is_open() {
                return Ok(request.clone());
            }
            request.open_index = open_index;
            let request = request.clone();

            let facts = self.store.stamp(vec![LedgerEvent::StatusRequested {
                flight: key.clone(),
                open_index,
            }]);
            (request, facts)
        };

        info!(
            operation = operations::FETCH_FLIGHT_STATUS,
            flight = %key,
            open_index = request.open_index,
            "status request opened"
        );
        self.outbox.send_all(facts);
        Ok(request)
    }

    async fn submit_oracle_response(
        &self,
        oracle: &Address,
        index: u8,
        airline: &Address,
        code: &str,
        departs_at: i64,
        status: FlightStatus,
    ) -> LedgerResult<SubmissionOutcome> {
        let key = FlightKey::new(airline.clone(), code, departs_at);
        let (outcome, facts) = {
            let mut state = self.store.write();
            state.require_operational()?;

            let assigned = state
                .oracles
                .get(oracle)
                .ok_or_else(|| LedgerError::NotFound(format!("oracle {oracle}")))?
                .is_assigned(index);

            // Tolerated no-ops: the oracle does not hold the index, the
            // request does not exist, or the index is no longer the open one.
            if !assigned {
                debug!(
                    operation = operations::SUBMIT_ORACLE_RESPONSE,
                    oracle = %oracle, index, "ignored: index not assigned to oracle"
                );
                return Ok(SubmissionOutcome::Ignored);
            }
            let (newly_recorded, reports, was_open, resolves) = {
                let Some(request) = state.requests.get_mut(&key) else {
                    debug!(
                        operation = operations::SUBMIT_ORACLE_RESPONSE,
                        flight = %key, "ignored: no request for flight"
                    );
                    return Ok(SubmissionOutcome::Ignored);
                };
                if request.open_index != index {
                    debug!(
                        operation = operations::SUBMIT_ORACLE_RESPONSE,
                        flight = %key, index, open_index = request.open_index,
                        "ignored: index does not match the open request"
                    );
                    return Ok(SubmissionOutcome::Ignored);
                }

                let was_open = request.is_open();
                let newly_recorded = request.record(status, oracle.clone());
                let reports = request.report_count(status);
                // First code to reach the threshold wins; the request never
                // re-finalizes.
                let resolves = was_open && newly_recorded && request.has_quorum(status);
                if resolves {
                    request.state = RequestState::Resolved;
                }
                (newly_recorded, reports, was_open, resolves)
            };

            let mut events = Vec::new();
            if newly_recorded {
                events.push(LedgerEvent::OracleReported {
                    flight: key.clone(),
                    oracle: oracle.clone(),
                    status,
                    reports,
                });
            }

            let outcome = if resolves {
                events.push(LedgerEvent::StatusResolved {
                    flight: key.clone(),
                    status,
                });

                // Finalize the flight status exactly once; a flight whose
                // status is already final is never overwritten.
                let mut credit_due = false;
                if let Some(flight) = state.flights.get_mut(&key) {
                    if !flight.is_finalized() {
                        flight.status = status;
                        credit_due = status.is_airline_fault();
                    }
                }
                if credit_due {
                    for (passenger, credit) in state.credit_flight_policies(&key) {
                        events.push(LedgerEvent::InsureeCredited {
                            passenger,
                            flight: key.clone(),
                            credit,
                        });
                    }
                }
                SubmissionOutcome::Resolved(status)
            } else if was_open {
                SubmissionOutcome::Accepted
            } else {
                SubmissionOutcome::AcceptedAfterResolution
            };

            let facts = self.store.stamp(events);
            (outcome, facts)
        };

        if let SubmissionOutcome::Resolved(status) = outcome {
            info!(
                operation = operations::SUBMIT_ORACLE_RESPONSE,
                flight = %key,
                status = ?status,
                "quorum reached, flight status finalized"
            );
        }
        self.outbox.send_all(facts);
        Ok(outcome)
    }
}
