//! Core of the TePrestamos admin dashboard
//!
//! Normalizes backend JSON into typed leads, lenders, analytics and fraud
//! signals, and computes everything the dashboard derives from them: risk
//! score, whitelist filtering, date ranges and CSV exports. No I/O.

#![forbid(unsafe_code)]

pub mod analytics;
pub mod calendar;
pub mod date_range;
pub mod error;
pub mod export;
pub mod fraud;
pub mod guard;
pub mod lead;
pub mod lender;
pub mod lenient;

pub use date_range::{DateRange, Preset, Window};
pub use error::{Error, Result};
pub use fraud::{FraudReport, FraudSummary, IpWhitelist, RiskAssessment, RiskLevel, RiskScore};
pub use guard::{Applied, Generation, Ticket, ViewState};
pub use lead::{Lead, LeadDetail, LeadPage, LeadQuery, LeadStatus};
pub use lender::{Lender, LenderInput};
