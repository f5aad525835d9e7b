//! IP whitelist applied to fraud signals before scoring and display
//!
//! Exact string match only; no CIDR ranges. Filtering never touches the
//! source summary, it returns a filtered copy with record order preserved.

use super::signals::{FraudSummary, IpTagged};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// IPs excluded from fraud analysis, plus an on/off switch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpWhitelist {
    ips: Vec<String>,
    enabled: bool,
}

impl Default for IpWhitelist {
    fn default() -> Self {
        Self {
            ips: Vec::new(),
            enabled: true,
        }
    }
}

impl IpWhitelist {
    /// Build from configured entries; entries are trimmed, blanks and repeats dropped
    pub fn new<I, S>(ips: I, enabled: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut whitelist = Self {
            ips: Vec::new(),
            enabled,
        };
        for ip in ips {
            whitelist.add(ip.as_ref());
        }
        whitelist
    }

    /// Add an IP; returns false for blanks and entries already present
    pub fn add(&mut self, ip: &str) -> bool {
        let ip = ip.trim();
        if ip.is_empty() || self.contains(ip) {
            return false;
        }
        self.ips.push(ip.to_string());
        true
    }

    /// Remove an IP; returns false when it was not listed
    pub fn remove(&mut self, ip: &str) -> bool {
        let ip = ip.trim();
        let before = self.ips.len();
        self.ips.retain(|listed| listed != ip);
        self.ips.len() != before
    }

    /// Whether the IP is listed (exact match)
    pub fn contains(&self, ip: &str) -> bool {
        self.ips.iter().any(|listed| listed == ip)
    }

    /// Listed IPs in insertion order
    pub fn ips(&self) -> &[String] {
        &self.ips
    }

    /// Whether filtering is active
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Switch filtering on or off
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Filtered copy of a summary
    ///
    /// Covers every signal set whose records carry an IP: clusters, rapid
    /// submissions, multi-IP leads and speed samples. When disabled or empty
    /// the summary is returned unchanged.
    pub fn apply(&self, summary: &FraudSummary) -> FraudSummary {
        if !self.enabled || self.ips.is_empty() {
            return summary.clone();
        }

        let listed: HashSet<&str> = self.ips.iter().map(String::as_str).collect();
        let filtered = FraudSummary {
            ip_clusters: retain_unlisted(&summary.ip_clusters, &listed),
            rapid_submissions: retain_unlisted(&summary.rapid_submissions, &listed),
            non_standard_ips: retain_unlisted(&summary.non_standard_ips, &listed),
            speed_analysis: retain_unlisted(&summary.speed_analysis, &listed),
            ..summary.clone()
        };

        debug!(
            ip_clusters = summary.ip_clusters.len() - filtered.ip_clusters.len(),
            rapid_submissions = summary.rapid_submissions.len() - filtered.rapid_submissions.len(),
            "Whitelisted records removed"
        );
        filtered
    }
}

fn retain_unlisted<T: IpTagged + Clone>(records: &[T], listed: &HashSet<&str>) -> Vec<T> {
    records
        .iter()
        .filter(|record| record.ip_address().map_or(true, |ip| !listed.contains(ip)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fraud::signals::{IpCluster, NonStandardIp, PhoneReuse, RapidSubmission};

    fn cluster(ip: &str, lead_count: i64) -> IpCluster {
        IpCluster {
            ip_address: ip.to_string(),
            lead_count,
            ..Default::default()
        }
    }

    fn summary() -> FraudSummary {
        FraudSummary {
            success: true,
            ip_clusters: vec![
                cluster("9.9.9.9", 2),
                cluster("1.2.3.4", 7),
                cluster("5.6.7.8", 3),
            ],
            rapid_submissions: vec![
                RapidSubmission {
                    lead_id: 1,
                    ip_address: Some("1.2.3.4".to_string()),
                    ..Default::default()
                },
                RapidSubmission {
                    lead_id: 2,
                    ip_address: None,
                    ..Default::default()
                },
            ],
            non_standard_ips: vec![NonStandardIp {
                id: 3,
                ip_address: Some("1.2.3.4, 10.0.0.1".to_string()),
                ..Default::default()
            }],
            phone_reuse: vec![PhoneReuse::default()],
            ..Default::default()
        }
    }

    #[test]
    fn test_whitelisted_ip_removed_order_kept() {
        let whitelist = IpWhitelist::new([" 1.2.3.4 "], true);
        let source = summary();
        let filtered = whitelist.apply(&source);

        let ips: Vec<&str> = filtered
            .ip_clusters
            .iter()
            .map(|c| c.ip_address.as_str())
            .collect();
        assert_eq!(ips, vec!["9.9.9.9", "5.6.7.8"]);
        assert_eq!(filtered.rapid_submissions.len(), 1);
        assert_eq!(filtered.rapid_submissions[0].lead_id, 2);
        assert_eq!(filtered.phone_reuse.len(), 1);

        // source untouched
        assert_eq!(source.ip_clusters.len(), 3);
    }

    #[test]
    fn test_exact_match_only() {
        let whitelist = IpWhitelist::new(["1.2.3.4"], true);
        let filtered = whitelist.apply(&summary());
        // "1.2.3.4, 10.0.0.1" is a proxy chain, not the listed IP
        assert_eq!(filtered.non_standard_ips.len(), 1);
    }

    #[test]
    fn test_disabled_passes_through() {
        let whitelist = IpWhitelist::new(["1.2.3.4"], false);
        assert_eq!(whitelist.apply(&summary()), summary());
    }

    #[test]
    fn test_add_and_remove() {
        let mut whitelist = IpWhitelist::default();
        assert!(whitelist.add("73.138.132.140"));
        assert!(!whitelist.add(" 73.138.132.140 "));
        assert!(!whitelist.add("   "));
        assert!(whitelist.remove("73.138.132.140"));
        assert!(!whitelist.remove("73.138.132.140"));
        assert!(whitelist.ips().is_empty());
    }
}
