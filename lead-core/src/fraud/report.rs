//! Assembled fraud report served to the dashboard

use super::scoring::{RiskAssessment, BIG_CLUSTER_LEADS};
use super::severity::{self, HourBar, Severity};
use super::signals::FraudSummary;
use serde::Serialize;

/// Lead ids listed per cluster before truncating
const CLUSTER_LEAD_IDS_SHOWN: usize = 10;

/// Headline counters above the sections
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Headline {
    pub total_leads: i64,
    pub rejected_leads: i64,
    /// One decimal, "0.0" when there are no leads
    pub rejection_rate: String,
    pub ip_clusters: usize,
    pub duplicate_emails: i64,
    pub duplicate_phones: i64,
    pub duplicate_contacts: i64,
    pub fast_sessions: i64,
}

/// Collapsible report section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section<T> {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub count: usize,
    pub severity: Severity,
    pub default_open: bool,
    pub rows: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    pub name: Option<String>,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IpClusterRow {
    pub ip_address: String,
    pub lead_count: i64,
    pub unique_emails: i64,
    pub span: Option<String>,
    pub severity: Severity,
    pub identities: Vec<Identity>,
    pub lead_ids: Vec<i64>,
    pub more_lead_ids: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RapidRow {
    pub lead_id: i64,
    pub applicant: String,
    pub email: Option<String>,
    pub related_lead_id: i64,
    pub related_applicant: String,
    pub gap: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeedRow {
    /// Applicant name, falling back to IP, then "Unknown"
    pub who: String,
    /// Email, "—" with identity but no email, "No lead submitted" without identity
    pub email: String,
    pub time: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PasteRow {
    pub session: String,
    pub paste_count: i64,
    pub fields: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhoneRow {
    pub phone: String,
    pub use_count: i64,
    pub names: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailDomainRow {
    pub domain: String,
    pub count: i64,
    pub names: String,
    pub disposable: bool,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiIpRow {
    pub lead_id: i64,
    pub applicant: String,
    pub email: Option<String>,
    pub ip_address: Option<String>,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectionRow {
    pub reason: String,
    pub count: i64,
}

/// Everything the fraud page renders, derived from one summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FraudReport {
    pub range_label: String,
    pub whitelist_applied: bool,
    pub risk: RiskAssessment,
    pub headline: Headline,
    pub hourly: Vec<HourBar>,
    pub ip_clusters: Section<IpClusterRow>,
    pub rapid_submissions: Section<RapidRow>,
    pub speed: Section<SpeedRow>,
    pub paste: Section<PasteRow>,
    pub phone_reuse: Section<PhoneRow>,
    pub email_domains: Section<EmailDomainRow>,
    /// Omitted when no lead carries a proxy chain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi_ip: Option<Section<MultiIpRow>>,
    pub rejections: Section<RejectionRow>,
}

impl FraudReport {
    /// Build from an already whitelist-filtered summary
    pub fn build(
        summary: &FraudSummary,
        whitelist_applied: bool,
        range_label: impl Into<String>,
        hour_label_offset: i64,
    ) -> Self {
        let risk = RiskAssessment::assess(summary);
        let stats = &summary.stats;
        let dist = &summary.speed_distribution;
        let fast_sessions = dist.fast_sessions();

        let headline = Headline {
            total_leads: stats.total_leads,
            rejected_leads: stats.rejected_leads,
            rejection_rate: rejection_rate(stats.rejected_leads, stats.total_leads),
            ip_clusters: summary.ip_clusters.len(),
            duplicate_emails: stats.duplicate_emails,
            duplicate_phones: stats.duplicate_phones,
            duplicate_contacts: stats.duplicate_emails + stats.duplicate_phones,
            fast_sessions,
        };

        let ip_clusters = Section {
            title: "IP Address Clusters",
            subtitle: if whitelist_applied {
                "Multiple leads from same IP (whitelist applied)"
            } else {
                "Multiple leads from same IP"
            },
            count: summary.ip_clusters.len(),
            severity: if summary
                .ip_clusters
                .iter()
                .any(|c| c.lead_count >= BIG_CLUSTER_LEADS)
            {
                Severity::Critical
            } else {
                Severity::High
            },
            default_open: true,
            rows: summary
                .ip_clusters
                .iter()
                .map(|c| IpClusterRow {
                    ip_address: c.ip_address.clone(),
                    lead_count: c.lead_count,
                    unique_emails: c.unique_emails,
                    span: severity::format_span(c.first_seen, c.last_seen),
                    severity: severity::ip_cluster(c.lead_count),
                    identities: c
                        .emails
                        .iter()
                        .enumerate()
                        .map(|(i, email)| Identity {
                            name: c.names.get(i).cloned(),
                            email: email.clone(),
                        })
                        .collect(),
                    lead_ids: c.lead_ids.iter().take(CLUSTER_LEAD_IDS_SHOWN).copied().collect(),
                    more_lead_ids: c.lead_ids.len() > CLUSTER_LEAD_IDS_SHOWN,
                })
                .collect(),
        };

        let rapid_submissions = Section {
            title: "Rapid Submissions",
            subtitle: "Leads within 5 min of each other (same IP, email, or phone)",
            count: summary.rapid_submissions.len(),
            severity: if summary
                .rapid_submissions
                .iter()
                .any(|r| r.seconds_apart.abs() < 30.0)
            {
                Severity::Critical
            } else {
                Severity::High
            },
            default_open: true,
            rows: summary
                .rapid_submissions
                .iter()
                .map(|r| RapidRow {
                    lead_id: r.lead_id,
                    applicant: join_name(r.first_name.as_deref(), r.last_name.as_deref()),
                    email: r.email.clone(),
                    related_lead_id: r.related_lead_id,
                    related_applicant: join_name(
                        r.related_first_name.as_deref(),
                        r.related_last_name.as_deref(),
                    ),
                    gap: severity::format_seconds(r.seconds_apart),
                    severity: severity::rapid_submission(r.seconds_apart),
                })
                .collect(),
        };

        let speed = Section {
            title: "Speed Analysis",
            subtitle: "Suspiciously fast form completions",
            count: fast_sessions.max(0) as usize,
            severity: if fast_sessions > 0 {
                if dist.critical_count > 0 {
                    Severity::Critical
                } else {
                    Severity::High
                }
            } else {
                Severity::Info
            },
            default_open: true,
            rows: summary
                .speed_analysis
                .iter()
                .map(|s| {
                    let name = join_name(s.first_name.as_deref(), s.last_name.as_deref());
                    let has_identity = !name.is_empty() || s.email.is_some();
                    SpeedRow {
                        who: if !name.is_empty() {
                            name
                        } else {
                            s.ip_address.clone().unwrap_or_else(|| "Unknown".to_string())
                        },
                        email: match (&s.email, has_identity) {
                            (Some(email), _) => email.clone(),
                            (None, true) => "—".to_string(),
                            (None, false) => "No lead submitted".to_string(),
                        },
                        time: severity::format_seconds(s.completion_seconds),
                        severity: severity::speed(s.completion_seconds),
                    }
                })
                .collect(),
        };

        let paste = Section {
            title: "Behavioral Signals — Paste Detection",
            subtitle: "Sessions with high paste activity (3+ fields)",
            count: summary.paste_analysis.len(),
            severity: if summary.paste_analysis.iter().any(|p| p.paste_count >= 6) {
                Severity::High
            } else {
                Severity::Medium
            },
            default_open: !summary.paste_analysis.is_empty(),
            rows: summary
                .paste_analysis
                .iter()
                .map(|p| PasteRow {
                    session: p
                        .session_id
                        .as_deref()
                        .map(|id| format!("{}…", id.chars().take(16).collect::<String>()))
                        .unwrap_or_default(),
                    paste_count: p.paste_count,
                    fields: p.pasted_fields.join(", "),
                    severity: severity::paste(p.paste_count),
                })
                .collect(),
        };

        let phone_reuse = Section {
            title: "Phone Number Reuse",
            subtitle: "Same phone across multiple applications",
            count: summary.phone_reuse.len(),
            severity: if summary.phone_reuse.iter().any(|p| p.use_count >= 4) {
                Severity::High
            } else {
                Severity::Medium
            },
            default_open: false,
            rows: summary
                .phone_reuse
                .iter()
                .map(|p| PhoneRow {
                    phone: p.phone.clone(),
                    use_count: p.use_count,
                    names: truncated_names(&p.names, 4, false),
                    severity: severity::phone_reuse(p.use_count),
                })
                .collect(),
        };

        let email_domains = Section {
            title: "Email Domain Concentration",
            subtitle: "Domains with 3+ applications",
            count: summary.suspicious_emails.len(),
            severity: Severity::Medium,
            default_open: false,
            rows: summary
                .suspicious_emails
                .iter()
                .map(|e| EmailDomainRow {
                    domain: e.domain.clone(),
                    count: e.count,
                    names: truncated_names(&e.names, 3, true),
                    disposable: severity::is_disposable(&e.domain),
                    severity: severity::email_domain(&e.domain, e.count),
                })
                .collect(),
        };

        let multi_ip = (!summary.non_standard_ips.is_empty()).then(|| Section {
            title: "Multi-IP Submissions",
            subtitle: "Leads with comma-separated IPs (proxy/CDN detected)",
            count: summary.non_standard_ips.len(),
            severity: Severity::Low,
            default_open: false,
            rows: summary
                .non_standard_ips
                .iter()
                .map(|l| MultiIpRow {
                    lead_id: l.id,
                    applicant: join_name(l.first_name.as_deref(), l.last_name.as_deref()),
                    email: l.email.clone(),
                    ip_address: l.ip_address.clone(),
                    severity: Severity::Low,
                })
                .collect(),
        });

        let rejections = Section {
            title: "Rejection Reasons",
            subtitle: "Why lenders rejected leads",
            count: summary.rejection_reasons.len(),
            severity: Severity::Info,
            default_open: false,
            rows: summary
                .rejection_reasons
                .iter()
                .map(|r| RejectionRow {
                    reason: severity::rejection_display(r.rejection_reason.as_deref()),
                    count: r.count,
                })
                .collect(),
        };

        Self {
            range_label: range_label.into(),
            whitelist_applied,
            risk,
            headline,
            hourly: severity::hourly_bars(&summary.hourly_pattern, hour_label_offset),
            ip_clusters,
            rapid_submissions,
            speed,
            paste,
            phone_reuse,
            email_domains,
            multi_ip,
            rejections,
        }
    }
}

/// Percent with one decimal, "0.0" without leads
pub fn rejection_rate(rejected: i64, total: i64) -> String {
    if total <= 0 {
        return "0.0".to_string();
    }
    format!("{:.1}", rejected as f64 / total as f64 * 100.0)
}

fn join_name(first: Option<&str>, last: Option<&str>) -> String {
    [first, last]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncated_names(names: &[String], shown: usize, ellipsis: bool) -> String {
    let mut out = names.iter().take(shown).cloned().collect::<Vec<_>>().join(", ");
    if ellipsis && names.len() > shown {
        out.push('…');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fraud::scoring::RiskLevel;
    use crate::fraud::signals::{
        FraudStats, IpCluster, PasteSession, SpeedDistribution, SpeedSample, SuspiciousEmail,
    };

    fn summary() -> FraudSummary {
        FraudSummary {
            success: true,
            stats: FraudStats {
                total_leads: 40,
                rejected_leads: 13,
                duplicate_emails: 2,
                duplicate_phones: 1,
                ..Default::default()
            },
            ip_clusters: vec![IpCluster {
                ip_address: "8.8.4.4".to_string(),
                lead_count: 6,
                emails: vec!["a@x.es".to_string(), "b@x.es".to_string()],
                names: vec!["Ana".to_string()],
                lead_ids: (1..=12).collect(),
                ..Default::default()
            }],
            speed_distribution: SpeedDistribution {
                total_sessions: 100,
                high_count: 3,
                ..Default::default()
            },
            speed_analysis: vec![SpeedSample {
                ip_address: Some("7.7.7.7".to_string()),
                completion_seconds: 41.0,
                ..Default::default()
            }],
            paste_analysis: vec![PasteSession {
                session_id: Some("0123456789abcdefXYZ".to_string()),
                paste_count: 7,
                pasted_fields: vec!["dni".to_string(), "iban".to_string()],
            }],
            suspicious_emails: vec![SuspiciousEmail {
                domain: "yopmail.com".to_string(),
                count: 3,
                names: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_headline() {
        let report = FraudReport::build(&summary(), true, "Last 30 days", 1);
        assert_eq!(report.headline.rejection_rate, "32.5");
        assert_eq!(report.headline.duplicate_contacts, 3);
        assert_eq!(report.headline.fast_sessions, 3);
        assert_eq!(report.risk.score.score(), 23);
        assert_eq!(report.risk.level, RiskLevel::Medium);
    }

    #[test]
    fn test_sections() {
        let report = FraudReport::build(&summary(), true, "Last 30 days", 1);

        let cluster = &report.ip_clusters.rows[0];
        assert_eq!(report.ip_clusters.severity, Severity::Critical);
        assert_eq!(cluster.lead_ids.len(), 10);
        assert!(cluster.more_lead_ids);
        assert_eq!(cluster.identities[1].name, None);

        assert_eq!(report.speed.severity, Severity::High);
        assert_eq!(report.speed.rows[0].who, "7.7.7.7");
        assert_eq!(report.speed.rows[0].email, "No lead submitted");

        assert_eq!(report.paste.rows[0].session, "0123456789abcdef…");
        assert_eq!(report.paste.severity, Severity::High);
        assert!(report.paste.default_open);

        assert_eq!(report.email_domains.rows[0].names, "A, B, C…");
        assert!(report.email_domains.rows[0].disposable);

        assert!(report.multi_ip.is_none());
        assert!(report.hourly.is_empty());
    }

    #[test]
    fn test_empty_summary_never_panics() {
        let report = FraudReport::build(&FraudSummary::default(), false, "All time", 0);
        assert_eq!(report.headline.rejection_rate, "0.0");
        assert_eq!(report.speed.severity, Severity::Info);
        assert_eq!(report.ip_clusters.severity, Severity::High);
        assert_eq!(report.risk.level, RiskLevel::Low);
    }
}
