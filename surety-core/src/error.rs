//! Error types for the flight-surety ledger.
//!
//! Every error is synchronous and local to the failing operation; a failing
//! operation leaves all registry and monetary state unchanged.

use crate::types::Address;
use crate::value::Value;
use thiserror::Error;

/// Ledger operation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Contract is not operational")]
    NotOperational,

    #[error("Operating status may only be changed by the contract owner (caller: {0})")]
    NotContractOwner(Address),

    #[error("Minimum consensus not met: {approvals} approvals of {registered} registered airlines")]
    MinimumConsensusNotMet { approvals: usize, registered: usize },

    #[error("Airline not registered: {0}")]
    AirlineNotRegistered(Address),

    #[error("Airline already registered: {0}")]
    AirlineAlreadyRegistered(Address),

    #[error("Airline not at minimum funding: {0}")]
    AirlineBelowMinimumFunding(Address),

    #[error("Flight not found: {0}")]
    FlightNotFound(String),

    #[error("Flight already exists: {0}")]
    FlightAlreadyExists(String),

    #[error("Passenger {passenger} already insured on flight {flight}")]
    AlreadyInsured { passenger: Address, flight: String },

    #[error("Registration fee below minimum: offered {offered}, required {required}")]
    InsufficientFee { offered: Value, required: Value },

    #[error("Monetary value overflow")]
    ValueOverflow,

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type alias for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
