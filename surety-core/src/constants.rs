//! Protocol Constants
//!
//! Centralized constants for the flight-surety protocol. All protocol-defined
//! thresholds and ratios live here for consistency.

use crate::value::Value;

// ============================================================================
// Monetary scaling
// ============================================================================

/// Micro-units per native value unit. All stored amounts are micro-unit
/// counts, so the 3/2 payout multiply is exact for every half-unit premium.
pub const MICROS_PER_UNIT: u64 = 1_000_000;

// ============================================================================
// Funding and insurance thresholds
// ============================================================================

/// Funding an airline must accumulate before it participates (10 units).
pub const MIN_AIRLINE_FUNDING_UNITS: u64 = 10;

/// Maximum insured value per policy (1 unit); any excess is refunded.
pub const MAX_INSURANCE_UNITS: u64 = 1;

/// Payout credit ratio: credit = premium * 3 / 2.
pub const PAYOUT_CREDIT_NUMERATOR: u64 = 3;
pub const PAYOUT_CREDIT_DENOMINATOR: u64 = 2;

/// Funding threshold as a [`Value`].
pub const fn min_airline_funding() -> Value {
    Value::from_units(MIN_AIRLINE_FUNDING_UNITS)
}

/// Insurance cap as a [`Value`].
pub const fn max_insurance_value() -> Value {
    Value::from_units(MAX_INSURANCE_UNITS)
}

// ============================================================================
// Admission consensus
// ============================================================================

/// Below this many registered airlines, admission needs a single vote from
/// an existing member; at or above it, 50% of the membership must approve.
pub const MULTIPARTY_CONSENSUS_THRESHOLD: usize = 4;

// ============================================================================
// Oracle protocol
// ============================================================================

/// Fee an oracle pays at registration (1 unit).
pub const ORACLE_REGISTRATION_FEE_UNITS: u64 = 1;

/// Indices assigned to each oracle at registration.
pub const INDEXES_PER_ORACLE: usize = 3;

/// Exclusive upper bound of the oracle index range; indices are 0..10.
pub const ORACLE_INDEX_RANGE: u8 = 10;

/// Distinct oracles that must report the same status to finalize a flight.
pub const ORACLE_QUORUM: usize = 3;

/// Registration fee as a [`Value`].
pub const fn oracle_registration_fee() -> Value {
    Value::from_units(ORACLE_REGISTRATION_FEE_UNITS)
}
