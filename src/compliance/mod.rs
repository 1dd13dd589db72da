//! PDF/UA compliance validation.
//!
//! Validates a finished document against PDF/UA (ISO 14289-1)
//! accessibility requirements: a fixed battery of ten independent checks,
//! aggregated into a structured pass/fail report.

pub mod types;
pub mod validator;

pub use types::{CheckKind, CheckOutcome, ComplianceReport};
pub use validator::ComplianceValidator;
