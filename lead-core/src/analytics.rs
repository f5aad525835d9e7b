//! Conversion analytics payloads and derived rates

use crate::lenient;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Headline counters from `GET /analytics/summary`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    #[serde(default, deserialize_with = "lenient::int")]
    pub total_leads: i64,
    #[serde(default, deserialize_with = "lenient::int")]
    pub sold_leads: i64,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub total_revenue: Decimal,
    #[serde(default, deserialize_with = "lenient::int")]
    pub leads_today: i64,
    #[serde(default, deserialize_with = "lenient::int")]
    pub leads_this_week: i64,
    #[serde(default, deserialize_with = "lenient::int")]
    pub leads_this_month: i64,
    #[serde(default, deserialize_with = "lenient::float")]
    pub avg_response_time_ms: f64,
    #[serde(default, deserialize_with = "lenient::int")]
    pub submitted_to_lender: i64,
    #[serde(default, deserialize_with = "lenient::int")]
    pub redirected_leads: i64,
    #[serde(default, deserialize_with = "lenient::int")]
    pub confirmed_redirects: i64,
    #[serde(rename = "rejected_leads", default, deserialize_with = "lenient::int")]
    pub rejected_leads: i64,
    #[serde(rename = "duplicate_emails", default, deserialize_with = "lenient::int")]
    pub duplicate_emails: i64,
    #[serde(rename = "duplicate_phones", default, deserialize_with = "lenient::int")]
    pub duplicate_phones: i64,
    /// Counters this dashboard does not interpret, passed through as-is
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl SummaryStats {
    /// Sold share of all leads, percent
    pub fn conversion_rate(&self) -> f64 {
        percent(self.sold_leads, self.total_leads)
    }

    /// Confirmed share of redirected leads, percent
    pub fn redirect_confirmation_rate(&self) -> f64 {
        percent(self.confirmed_redirects, self.redirected_leads)
    }

    /// Rejected share of all leads, percent
    pub fn rejection_rate(&self) -> f64 {
        percent(self.rejected_leads, self.total_leads)
    }

    /// Average revenue per sold lead
    pub fn revenue_per_sale(&self) -> Decimal {
        if self.sold_leads == 0 {
            return Decimal::ZERO;
        }
        (self.total_revenue / Decimal::from(self.sold_leads)).round_dp(2)
    }
}

/// Wrapper of the summary endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryResponse {
    #[serde(default)]
    pub stats: SummaryStats,
}

/// One day of `GET /analytics/daily`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyRow {
    #[serde(default, deserialize_with = "lenient::string")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient::int")]
    pub total_leads: i64,
    #[serde(default, deserialize_with = "lenient::int")]
    pub sold_leads: i64,
    #[serde(default, deserialize_with = "lenient::int")]
    pub rejected_leads: i64,
    #[serde(default, deserialize_with = "lenient::int")]
    pub duplicate_leads: i64,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub total_revenue: Decimal,
    #[serde(default, deserialize_with = "lenient::float")]
    pub avg_response_time: f64,
}

impl DailyRow {
    /// Calendar day; the backend sends either `YYYY-MM-DD` or a midnight timestamp
    pub fn day(&self) -> Option<NaiveDate> {
        let head = self.date.get(..10).unwrap_or(&self.date);
        NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
    }

    /// Sold share of the day's leads, percent
    pub fn conversion_rate(&self) -> f64 {
        percent(self.sold_leads, self.total_leads)
    }
}

/// Wrapper of the daily endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyResponse {
    #[serde(default)]
    pub analytics: Vec<DailyRow>,
}

/// Sessions reaching one form step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunnelStep {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub step: Option<String>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub sessions: i64,
}

/// `GET /analytics/funnel` payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Funnel {
    #[serde(default)]
    pub steps: Vec<FunnelStep>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub total_sessions: i64,
    /// Step number to abandoned-session count
    #[serde(default)]
    pub dropoff: BTreeMap<String, serde_json::Value>,
}

/// Derived view of one funnel step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelStage {
    pub step: String,
    pub sessions: i64,
    /// Percent of all sessions that reached this step
    pub share_of_total: f64,
    /// Percent of the previous step's sessions that continued here
    pub retained_from_previous: f64,
    /// Sessions abandoned at this step, as reported by the backend
    pub dropoff: i64,
}

impl Funnel {
    /// Per-step conversion; zero denominators yield 0
    pub fn conversion(&self) -> Vec<FunnelStage> {
        let total = if self.total_sessions > 0 {
            self.total_sessions
        } else {
            self.steps.first().map(|s| s.sessions).unwrap_or(0)
        };

        let mut previous: Option<i64> = None;
        self.steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let number = (index + 1).to_string();
                let label = step.step.clone().unwrap_or_else(|| number.clone());
                let dropoff = self
                    .dropoff
                    .get(&label)
                    .or_else(|| self.dropoff.get(&number))
                    .and_then(|v| match v {
                        serde_json::Value::Number(n) => n.as_i64(),
                        serde_json::Value::String(s) => lenient::parse_int(s),
                        _ => None,
                    })
                    .unwrap_or(0);

                let retained = match previous {
                    Some(prev) => percent(step.sessions, prev),
                    None => 100.0,
                };
                previous = Some(step.sessions);

                FunnelStage {
                    step: label,
                    sessions: step.sessions,
                    share_of_total: percent(step.sessions, total),
                    retained_from_previous: retained,
                    dropoff,
                }
            })
            .collect()
    }
}

/// Percentage rounded to one decimal, 0 when the denominator is not positive
pub fn percent(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    ((part as f64 / whole as f64) * 1000.0).round() / 10.0
}
