//! Surety Ledger - state store and services
//!
//! Concrete implementations of the flight-surety ledger components over a
//! single guarded state store:
//! - Operational gate (owner-controlled pause switch)
//! - Airline registry and admission consensus
//! - Flight registry
//! - Insurance ledger (purchase, crediting, withdrawal)
//! - Oracle quorum protocol
//!
//! The store is the single owner of all mutable records; every mutating
//! operation is applied under one write guard, which gives the serialized
//! application order the quorum protocol requires. Committed transitions
//! are appended to an event outbox for external observers.

pub mod outbox;
pub mod services;
pub mod store;

pub use outbox::EventOutbox;
pub use services::{
    AirlineLedger, AirlineService, FlightLedger, FlightService, InsuranceLedger,
    InsuranceService, Ledger, OperationsGate, OperationsService, OracleLedger, OracleService,
    PurchaseReceipt, SubmissionOutcome,
};
pub use store::LedgerStore;
