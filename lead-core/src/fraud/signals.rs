//! Fraud signal sets returned by `GET /fraud/summary`
//!
//! All aggregates are computed server-side. Every array defaults to empty
//! when missing or `null`, so downstream scoring never has to check.

use crate::lenient;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Records that carry the submitting IP address
pub trait IpTagged {
    /// IP the record was submitted from, if known
    fn ip_address(&self) -> Option<&str>;
}

/// Several leads submitted from one IP
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IpCluster {
    #[serde(default, deserialize_with = "lenient::string")]
    pub ip_address: String,
    #[serde(default, deserialize_with = "lenient::int")]
    pub lead_count: i64,
    #[serde(default, deserialize_with = "lenient::int")]
    pub unique_emails: i64,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub emails: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub names: Vec<String>,
    #[serde(default, deserialize_with = "lenient::int_list")]
    pub lead_ids: Vec<i64>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub first_seen: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub last_seen: Option<DateTime<Utc>>,
}

impl IpTagged for IpCluster {
    fn ip_address(&self) -> Option<&str> {
        Some(&self.ip_address)
    }
}

/// Pair of leads submitted close together with a shared identifier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RapidSubmission {
    #[serde(default, deserialize_with = "lenient::int")]
    pub lead_id: i64,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub ip_address: Option<String>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub related_lead_id: i64,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub related_first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub related_last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub seconds_apart: f64,
}

impl IpTagged for RapidSubmission {
    fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }
}

/// One phone number used on several applications
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhoneReuse {
    #[serde(default, deserialize_with = "lenient::string")]
    pub phone: String,
    #[serde(default, deserialize_with = "lenient::int")]
    pub use_count: i64,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub names: Vec<String>,
}

/// Email domain concentration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuspiciousEmail {
    #[serde(default, deserialize_with = "lenient::string")]
    pub domain: String,
    #[serde(default, deserialize_with = "lenient::int")]
    pub count: i64,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub names: Vec<String>,
}

/// Leads per UTC hour of day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlyBucket {
    #[serde(default, deserialize_with = "lenient::int")]
    pub hour: i64,
    #[serde(default, deserialize_with = "lenient::int")]
    pub lead_count: i64,
    #[serde(default, deserialize_with = "lenient::int")]
    pub unique_ips: i64,
}

/// Lender rejection reason with its frequency
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RejectionReason {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub rejection_reason: Option<String>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub count: i64,
}

/// Lead whose IP field holds a proxy chain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NonStandardIp {
    #[serde(default, deserialize_with = "lenient::int")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub ip_address: Option<String>,
}

impl IpTagged for NonStandardIp {
    fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }
}

/// Form session completed suspiciously fast
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeedSample {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub session_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub ip_address: Option<String>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub completion_seconds: f64,
}

impl IpTagged for SpeedSample {
    fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }
}

/// Completion-time histogram over all sessions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeedDistribution {
    #[serde(default, deserialize_with = "lenient::int")]
    pub total_sessions: i64,
    /// Under 30 seconds
    #[serde(default, deserialize_with = "lenient::int")]
    pub critical_count: i64,
    /// 30 to 60 seconds
    #[serde(default, deserialize_with = "lenient::int")]
    pub high_count: i64,
    /// 1 to 2 minutes
    #[serde(default, deserialize_with = "lenient::int")]
    pub amber_count: i64,
    /// Over 2 minutes
    #[serde(default, deserialize_with = "lenient::int")]
    pub normal_count: i64,
    #[serde(default, deserialize_with = "lenient::float")]
    pub avg_seconds: f64,
    #[serde(default, deserialize_with = "lenient::float")]
    pub min_seconds: f64,
}

impl SpeedDistribution {
    /// Sessions under one minute
    pub fn fast_sessions(&self) -> i64 {
        self.critical_count + self.high_count
    }
}

/// Session with heavy clipboard pasting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PasteSession {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub session_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub paste_count: i64,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub pasted_fields: Vec<String>,
}

/// Period totals attached to the fraud summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FraudStats {
    #[serde(default, deserialize_with = "lenient::int")]
    pub total_leads: i64,
    #[serde(default, deserialize_with = "lenient::int")]
    pub rejected_leads: i64,
    #[serde(default, deserialize_with = "lenient::int")]
    pub duplicate_emails: i64,
    #[serde(default, deserialize_with = "lenient::int")]
    pub duplicate_phones: i64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Full `GET /fraud/summary` payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudSummary {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub success: bool,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub stats: FraudStats,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub ip_clusters: Vec<IpCluster>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub rapid_submissions: Vec<RapidSubmission>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub phone_reuse: Vec<PhoneReuse>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub suspicious_emails: Vec<SuspiciousEmail>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub hourly_pattern: Vec<HourlyBucket>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub rejection_reasons: Vec<RejectionReason>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub non_standard_ips: Vec<NonStandardIp>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub speed_analysis: Vec<SpeedSample>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub speed_distribution: SpeedDistribution,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub paste_analysis: Vec<PasteSession>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_and_missing_arrays_are_empty() {
        let summary: FraudSummary = serde_json::from_value(serde_json::json!({
            "success": true,
            "stats": null,
            "ipClusters": null,
            "speedDistribution": null
        }))
        .unwrap();

        assert!(summary.success);
        assert!(summary.ip_clusters.is_empty());
        assert!(summary.rapid_submissions.is_empty());
        assert_eq!(summary.stats.total_leads, 0);
        assert_eq!(summary.speed_distribution.fast_sessions(), 0);
    }

    #[test]
    fn test_cluster_fields_normalize() {
        let summary: FraudSummary = serde_json::from_value(serde_json::json!({
            "success": true,
            "ipClusters": [{
                "ip_address": "1.2.3.4",
                "lead_count": "6",
                "unique_emails": "4",
                "lead_ids": [10, "11", null],
                "first_seen": "2024-03-15T10:00:00Z",
                "last_seen": "2024-03-15T12:30:00Z"
            }],
            "rapidSubmissions": [{"lead_id": "5", "seconds_apart": "-42.0"}]
        }))
        .unwrap();

        let cluster = &summary.ip_clusters[0];
        assert_eq!(cluster.lead_count, 6);
        assert_eq!(cluster.lead_ids, vec![10, 11]);
        assert_eq!(summary.rapid_submissions[0].seconds_apart, -42.0);
    }
}
