//! Ledger service implementations.
//!
//! One service per component, each defined as an `async_trait` ledger trait
//! plus a concrete implementation over the shared [`LedgerStore`]. Every
//! mutating call checks the operational gate first, validates before
//! touching any record (atomic rollback by construction), and emits its
//! facts only after the transition commits.

pub mod airline;
pub mod flight;
pub mod insurance;
pub mod operations;
pub mod oracle;

pub use airline::{AirlineLedger, AirlineService};
pub use flight::{FlightLedger, FlightService};
pub use insurance::{InsuranceLedger, InsuranceService, PurchaseReceipt};
pub use operations::{OperationsGate, OperationsService};
pub use oracle::{OracleLedger, OracleService, SubmissionOutcome};

use async_trait::async_trait;
use surety_core::LedgerResult;

/// Base trait for all ledger services.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Get the ledger name
    fn name(&self) -> &'static str;

    /// Facts committed across the store so far.
    async fn current_sequence(&self) -> LedgerResult<u64>;

    /// Verify the component's record invariants.
    async fn verify_integrity(&self) -> LedgerResult<bool>;
}
