//! Lead records as served by the backend

use crate::date_range::Window;
use crate::lenient;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Lead lifecycle status
///
/// Transitions happen server-side; the dashboard only reads them. Wire
/// values that do not match a known status normalize to `Unknown` here,
/// once, instead of at every render site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeadStatus {
    /// Received, not yet offered to a lender
    Pending,
    /// Posted to a lender, awaiting decision
    Submitted,
    /// Accepted and paid by a lender
    Sold,
    /// Customer sent to the lender's landing page
    Redirected,
    /// Lender page confirmed the redirect landed
    Confirmed,
    /// Lender declined the lead
    Rejected,
    /// Same applicant already on file
    Duplicate,
    /// Delivery failed
    Error,
    /// Status the dashboard does not know about
    Unknown,
}

/// Display metadata for a status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusMeta {
    /// Short label
    pub label: &'static str,
    /// Badge color
    pub color: &'static str,
    /// Explanation shown on hover
    pub tooltip: &'static str,
}

impl LeadStatus {
    /// All known statuses in pipeline order
    pub const ALL: [LeadStatus; 8] = [
        LeadStatus::Pending,
        LeadStatus::Submitted,
        LeadStatus::Sold,
        LeadStatus::Redirected,
        LeadStatus::Confirmed,
        LeadStatus::Rejected,
        LeadStatus::Duplicate,
        LeadStatus::Error,
    ];

    /// Normalize a wire value
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" | "new" => LeadStatus::Pending,
            "submitted" | "submitted_to_lender" => LeadStatus::Submitted,
            "sold" | "accepted" => LeadStatus::Sold,
            "redirected" => LeadStatus::Redirected,
            "confirmed" | "redirect_confirmed" => LeadStatus::Confirmed,
            "rejected" => LeadStatus::Rejected,
            "duplicate" => LeadStatus::Duplicate,
            "error" | "failed" => LeadStatus::Error,
            _ => LeadStatus::Unknown,
        }
    }

    /// Canonical wire value
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::Pending => "pending",
            LeadStatus::Submitted => "submitted",
            LeadStatus::Sold => "sold",
            LeadStatus::Redirected => "redirected",
            LeadStatus::Confirmed => "confirmed",
            LeadStatus::Rejected => "rejected",
            LeadStatus::Duplicate => "duplicate",
            LeadStatus::Error => "error",
            LeadStatus::Unknown => "unknown",
        }
    }

    /// Badge metadata
    pub fn meta(&self) -> StatusMeta {
        match self {
            LeadStatus::Pending => StatusMeta {
                label: "Pending",
                color: "#94A3B8",
                tooltip: "Received and waiting to be offered to a lender",
            },
            LeadStatus::Submitted => StatusMeta {
                label: "Submitted",
                color: "#3b82f6",
                tooltip: "Posted to a lender, awaiting a decision",
            },
            LeadStatus::Sold => StatusMeta {
                label: "Sold",
                color: "#22c55e",
                tooltip: "Accepted by a lender; revenue recorded",
            },
            LeadStatus::Redirected => StatusMeta {
                label: "Redirected",
                color: "#a855f7",
                tooltip: "Applicant sent to the lender's site",
            },
            LeadStatus::Confirmed => StatusMeta {
                label: "Confirmed",
                color: "#34D399",
                tooltip: "Lender site confirmed the applicant arrived",
            },
            LeadStatus::Rejected => StatusMeta {
                label: "Rejected",
                color: "#ef4444",
                tooltip: "Lender declined the lead",
            },
            LeadStatus::Duplicate => StatusMeta {
                label: "Duplicate",
                color: "#eab308",
                tooltip: "Applicant already submitted recently",
            },
            LeadStatus::Error => StatusMeta {
                label: "Error",
                color: "#f97316",
                tooltip: "Delivery to the lender failed",
            },
            LeadStatus::Unknown => StatusMeta {
                label: "Unknown",
                color: "#475569",
                tooltip: "Status not recognized by this dashboard",
            },
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LeadStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LeadStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(raw) => LeadStatus::from_wire(&raw),
            _ => LeadStatus::Unknown,
        })
    }
}

impl Default for LeadStatus {
    fn default() -> Self {
        LeadStatus::Unknown
    }
}

/// Applicant's submitted loan request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    #[serde(default, deserialize_with = "lenient::int")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub dni: Option<String>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub loan_amount: Decimal,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub loan_period: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub loan_purpose: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub employment_status: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub monthly_income: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub postal_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub province: Option<String>,
    #[serde(default)]
    pub status: LeadStatus,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub fiesta_lead_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub redirect_url: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub response_time_ms: Option<i64>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub revenue: Decimal,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub rejection_reason: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub ip_address: Option<String>,
}

impl Lead {
    /// "First Last", skipping missing parts
    pub fn full_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Lender postback received for a lead
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Postback {
    #[serde(default, deserialize_with = "lenient::int")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub event: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub payout: Decimal,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub received_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// One delivery attempt of a lead to a lender
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    #[serde(default, deserialize_with = "lenient::int")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub lender_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub lender_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub response_time_ms: Option<i64>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub price: Decimal,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Browser-side redirect confirmation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedirectLog {
    #[serde(default, deserialize_with = "lenient::int")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub redirect_url: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub confirmed: bool,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub user_agent: Option<String>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// `GET /leads/:id` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadDetail {
    pub lead: Lead,
    #[serde(default)]
    pub postbacks: Vec<Postback>,
    #[serde(default)]
    pub distributions: Vec<Distribution>,
    #[serde(default)]
    pub redirect_logs: Vec<RedirectLog>,
}

/// Pagination block of a lead listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default, deserialize_with = "lenient::int")]
    pub page: i64,
    #[serde(default, deserialize_with = "lenient::int")]
    pub total_pages: i64,
    #[serde(default, deserialize_with = "lenient::int")]
    pub total_count: i64,
}

/// `GET /leads` payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadPage {
    #[serde(default)]
    pub leads: Vec<Lead>,
    #[serde(default)]
    pub pagination: Pagination,
}

impl LeadPage {
    /// Number of leads whose status did not normalize
    pub fn unknown_statuses(&self) -> usize {
        self.leads
            .iter()
            .filter(|lead| lead.status == LeadStatus::Unknown)
            .count()
    }
}

/// Lead listing filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadQuery {
    pub page: u32,
    pub limit: u32,
    pub status: Option<LeadStatus>,
    pub source: Option<String>,
    pub window: Option<Window>,
}

impl Default for LeadQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 50,
            status: None,
            source: None,
            window: None,
        }
    }
}

impl LeadQuery {
    /// Query pairs in backend order
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.max(1).to_string()),
            ("limit".to_string(), self.limit.clamp(1, 500).to_string()),
        ];
        if let Some(status) = self.status {
            pairs.push(("status".to_string(), status.as_str().to_string()));
        }
        if let Some(source) = self.source.as_ref().filter(|s| !s.is_empty()) {
            pairs.push(("source".to_string(), source.clone()));
        }
        if let Some(window) = &self.window {
            pairs.extend(window.query_pairs());
        }
        pairs
    }
}
