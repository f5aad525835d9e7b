//! Fraud signals, scoring, whitelist filtering and report assembly

pub mod report;
pub mod scoring;
pub mod severity;
pub mod signals;
pub mod whitelist;

pub use report::FraudReport;
pub use scoring::{RiskAssessment, RiskLevel, RiskScore};
pub use severity::Severity;
pub use signals::{FraudSummary, IpTagged};
pub use whitelist::IpWhitelist;
