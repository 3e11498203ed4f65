//! Surety Core - Cooperative Flight-Surety Ledger
//!
//! This crate provides the core types and rules for the flight-surety
//! federation:
//! - Fixed-point monetary values pre-scaled to the smallest indivisible unit
//! - Airline, flight, policy, and oracle records with their transition rules
//! - Facts emitted once per committed state transition
//! - Error kinds shared by every ledger component
//!
//! The mutable registries and the services that drive them live in
//! `surety-ledger`; this crate holds no state and performs no I/O.

pub mod constants;
pub mod error;
pub mod events;
pub mod logging;
pub mod types;
pub mod value;

pub use constants::*;
pub use error::*;
pub use events::*;
pub use types::*;
pub use value::Value;
