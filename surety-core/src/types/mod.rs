//! Record types for the flight-surety ledger.

mod address;
mod airline;
mod flight;
mod oracle;
mod policy;

pub use address::*;
pub use airline::*;
pub use flight::*;
pub use oracle::*;
pub use policy::*;
