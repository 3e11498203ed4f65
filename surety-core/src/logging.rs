//! Logging conventions.
//!
//! All services log through `tracing` with structured fields:
//!
//! | Level | Usage |
//! |-------|-------|
//! | WARN  | Rejected operations that suggest misbehaving callers |
//! | INFO  | Committed state transitions |
//! | DEBUG | Tolerated no-ops (index mismatches, duplicate reports) |
//!
//! Key information goes in structured fields, not the message: `operation`
//! (a constant from [`operations`]), the acting identity, the flight key,
//! and amounts in micro-units.

/// Operation names used as the `operation` field value.
pub mod operations {
    pub const SET_OPERATING_STATUS: &str = "set_operating_status";
    pub const REGISTER_AIRLINE: &str = "register_airline";
    pub const FUND_AIRLINE: &str = "fund_airline";
    pub const REGISTER_FLIGHT: &str = "register_flight";
    pub const BUY_INSURANCE: &str = "buy_insurance";
    pub const CREDIT_INSUREES: &str = "credit_insurees";
    pub const PAY_INSUREE: &str = "pay_insuree";
    pub const REGISTER_ORACLE: &str = "register_oracle";
    pub const FETCH_FLIGHT_STATUS: &str = "fetch_flight_status";
    pub const SUBMIT_ORACLE_RESPONSE: &str = "submit_oracle_response";
}
