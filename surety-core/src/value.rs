//! Fixed-point monetary values.
//!
//! Amounts are held as `u64` counts of micro-units (see
//! [`MICROS_PER_UNIT`](crate::constants::MICROS_PER_UNIT)) with `u128`
//! intermediates for multiplication, so no fractional micro-unit is ever
//! lost on the payout multiply for cap-admissible premiums. Odd micro-unit
//! counts floor.

use crate::constants::{
    MICROS_PER_UNIT, PAYOUT_CREDIT_DENOMINATOR, PAYOUT_CREDIT_NUMERATOR,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-negative monetary amount in micro-units of the native value unit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Value(u64);

impl Value {
    pub const ZERO: Value = Value(0);

    /// Amount from whole native units.
    pub const fn from_units(units: u64) -> Self {
        Value(units * MICROS_PER_UNIT)
    }

    /// Amount from micro-units.
    pub const fn from_micros(micros: u64) -> Self {
        Value(micros)
    }

    /// The raw micro-unit count.
    pub const fn micros(self) -> u64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Value) -> Option<Value> {
        self.0.checked_add(other.0).map(Value)
    }

    pub fn checked_sub(self, other: Value) -> Option<Value> {
        self.0.checked_sub(other.0).map(Value)
    }

    /// The smaller of two amounts; used to apply purchase caps.
    pub fn min(self, other: Value) -> Value {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }

    /// Sum of amounts, `None` on overflow.
    pub fn checked_sum<I: IntoIterator<Item = Value>>(amounts: I) -> Option<Value> {
        amounts
            .into_iter()
            .try_fold(Value::ZERO, |acc, v| acc.checked_add(v))
    }

    /// Payout credit owed on an insured premium: `premium * 3 / 2`, widened
    /// through `u128` and floored on odd micro-unit counts.
    pub fn payout_credit(self) -> Value {
        let credit = self.0 as u128 * PAYOUT_CREDIT_NUMERATOR as u128
            / PAYOUT_CREDIT_DENOMINATOR as u128;
        Value(credit as u64)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:06}",
            self.0 / MICROS_PER_UNIT,
            self.0 % MICROS_PER_UNIT
        )
    }
}
