//! Per-row severity tiers and display helpers for fraud signals

use super::scoring::RiskLevel;
use super::signals::HourlyBucket;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Badge tier shown next to a signal row or section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    /// Badge text
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Info => "INFO",
        }
    }
}

impl From<RiskLevel> for Severity {
    fn from(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Critical => Severity::Critical,
            RiskLevel::High => Severity::High,
            RiskLevel::Medium => Severity::Medium,
            RiskLevel::Low => Severity::Low,
        }
    }
}

/// Throwaway-mailbox providers
pub const DISPOSABLE_DOMAINS: [&str; 12] = [
    "guerrillamail.com",
    "tempmail.com",
    "throwaway.email",
    "mailinator.com",
    "yopmail.com",
    "temp-mail.org",
    "fakeinbox.com",
    "sharklasers.com",
    "guerrillamailblock.com",
    "grr.la",
    "dispostable.com",
    "10minutemail.com",
];

/// UTC hours (inclusive) treated as overnight bot activity
pub const ANOMALY_HOURS_UTC: std::ops::RangeInclusive<i64> = 1..=5;

pub fn ip_cluster(lead_count: i64) -> Severity {
    match lead_count {
        n if n >= 5 => Severity::Critical,
        n if n >= 3 => Severity::High,
        _ => Severity::Medium,
    }
}

pub fn rapid_submission(seconds_apart: f64) -> Severity {
    let secs = seconds_apart.abs();
    if secs < 30.0 {
        Severity::Critical
    } else if secs < 120.0 {
        Severity::High
    } else {
        Severity::Medium
    }
}

pub fn phone_reuse(use_count: i64) -> Severity {
    match use_count {
        n if n >= 4 => Severity::Critical,
        n if n >= 3 => Severity::High,
        _ => Severity::Medium,
    }
}

pub fn email_domain(domain: &str, count: i64) -> Severity {
    if is_disposable(domain) {
        Severity::Critical
    } else if count >= 5 {
        Severity::High
    } else {
        Severity::Medium
    }
}

pub fn speed(completion_seconds: f64) -> Severity {
    if completion_seconds < 30.0 {
        Severity::Critical
    } else if completion_seconds < 60.0 {
        Severity::High
    } else {
        Severity::Medium
    }
}

pub fn paste(paste_count: i64) -> Severity {
    match paste_count {
        n if n >= 6 => Severity::Critical,
        n if n >= 4 => Severity::High,
        _ => Severity::Medium,
    }
}

/// Case-insensitive disposable-domain check
pub fn is_disposable(domain: &str) -> bool {
    let domain = domain.trim().to_ascii_lowercase();
    DISPOSABLE_DOMAINS.contains(&domain.as_str())
}

/// `42s` under a minute, `1.5m` otherwise
pub fn format_seconds(seconds: f64) -> String {
    let secs = seconds.abs();
    if secs < 60.0 {
        format!("{}s", secs.round() as i64)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

/// Time between first and last lead of a cluster: `35m` or `3h`
pub fn format_span(first: Option<DateTime<Utc>>, last: Option<DateTime<Utc>>) -> Option<String> {
    let (first, last) = (first?, last?);
    let minutes = ((last - first).num_milliseconds() as f64 / 60_000.0).round() as i64;
    Some(if minutes < 60 {
        format!("{}m", minutes)
    } else {
        format!("{}h", (minutes as f64 / 60.0).round() as i64)
    })
}

/// Rejection reasons arrive as JSON objects or plain text
pub fn rejection_display(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "Unknown".to_string();
    };
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(map)) => map
            .iter()
            .map(|(k, v)| format!("{}: {}", k, plain(v)))
            .collect::<Vec<_>>()
            .join(", "),
        Ok(serde_json::Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, v)| format!("{}: {}", i, plain(v)))
            .collect::<Vec<_>>()
            .join(", "),
        Ok(other) => plain(&other),
        Err(_) => raw.to_string(),
    }
}

fn plain(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One bar of the hour-of-day chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourBar {
    /// UTC hour
    pub hour: i64,
    /// Hour shown to operators, shifted by the display offset
    pub label_hour: i64,
    pub lead_count: i64,
    pub unique_ips: i64,
    /// Bar height relative to the busiest hour, 0..=1
    pub relative: f64,
    pub anomalous: bool,
}

/// 24 bars, missing hours filled with zero
pub fn hourly_bars(buckets: &[HourlyBucket], label_offset: i64) -> Vec<HourBar> {
    if buckets.is_empty() {
        return Vec::new();
    }
    let max = buckets.iter().map(|b| b.lead_count).max().unwrap_or(0).max(1);

    (0..24)
        .map(|hour| {
            let bucket = buckets.iter().find(|b| b.hour == hour);
            let lead_count = bucket.map(|b| b.lead_count).unwrap_or(0);
            HourBar {
                hour,
                label_hour: (hour + label_offset).rem_euclid(24),
                lead_count,
                unique_ips: bucket.map(|b| b.unique_ips).unwrap_or(0),
                relative: lead_count as f64 / max as f64,
                anomalous: lead_count > 0 && ANOMALY_HOURS_UTC.contains(&hour),
            }
        })
        .collect()
}
