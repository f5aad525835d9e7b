//! Fraud risk scoring
//!
//! Weighted, capped sum over the server-computed signal sets:
//!
//! | component                         | weight | cap |
//! |-----------------------------------|--------|-----|
//! | IP clusters                       | 8      | 30  |
//! | IP clusters with 5+ leads         | 15     | 30  |
//! | rapid submissions                 | 5      | 25  |
//! | phone reuse                       | 4      | 15  |
//!
//! The total is clamped to 100. Pure function of already-fetched data.

use super::signals::{FraudSummary, IpCluster, PhoneReuse, RapidSubmission};
use serde::{Deserialize, Serialize};

const CLUSTER_WEIGHT: usize = 8;
const CLUSTER_CAP: usize = 30;
const BIG_CLUSTER_WEIGHT: usize = 15;
const BIG_CLUSTER_CAP: usize = 30;
const RAPID_WEIGHT: usize = 5;
const RAPID_CAP: usize = 25;
const PHONE_WEIGHT: usize = 4;
const PHONE_CAP: usize = 15;

/// Lead count at which an IP cluster counts as big
pub const BIG_CLUSTER_LEADS: i64 = 5;

/// Risk score (0-100)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskScore(u8);

impl RiskScore {
    /// Create new risk score, clamped to 100
    pub fn new(score: u8) -> Self {
        Self(score.min(100))
    }

    /// Get raw score
    pub fn score(&self) -> u8 {
        self.0
    }
}

/// Risk tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Below 15
    Low,
    /// 15 to 39
    Medium,
    /// 40 to 69
    High,
    /// 70 and above
    Critical,
}

impl From<RiskScore> for RiskLevel {
    fn from(score: RiskScore) -> Self {
        match score.score() {
            s if s >= 70 => RiskLevel::Critical,
            s if s >= 40 => RiskLevel::High,
            s if s >= 15 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }
}

impl RiskLevel {
    /// Lowercase identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

/// Score plus its tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: RiskScore,
    pub level: RiskLevel,
}

impl Default for RiskAssessment {
    fn default() -> Self {
        Self::from_score(RiskScore::default())
    }
}

impl RiskAssessment {
    fn from_score(score: RiskScore) -> Self {
        Self {
            score,
            level: RiskLevel::from(score),
        }
    }

    /// Score the three signal sets that carry weight
    pub fn from_signals(
        ip_clusters: &[IpCluster],
        rapid_submissions: &[RapidSubmission],
        phone_reuse: &[PhoneReuse],
    ) -> Self {
        let big_clusters = ip_clusters
            .iter()
            .filter(|c| c.lead_count >= BIG_CLUSTER_LEADS)
            .count();

        let total = capped(ip_clusters.len(), CLUSTER_WEIGHT, CLUSTER_CAP)
            + capped(big_clusters, BIG_CLUSTER_WEIGHT, BIG_CLUSTER_CAP)
            + capped(rapid_submissions.len(), RAPID_WEIGHT, RAPID_CAP)
            + capped(phone_reuse.len(), PHONE_WEIGHT, PHONE_CAP);

        // caps sum to 100
        Self::from_score(RiskScore::new(total.min(100) as u8))
    }

    /// Score a whole summary; call after whitelist filtering
    pub fn assess(summary: &FraudSummary) -> Self {
        Self::from_signals(
            &summary.ip_clusters,
            &summary.rapid_submissions,
            &summary.phone_reuse,
        )
    }

    /// Score an optional summary; nothing fetched yet scores zero
    pub fn assess_opt(summary: Option<&FraudSummary>) -> Self {
        summary.map(Self::assess).unwrap_or_default()
    }
}

fn capped(count: usize, weight: usize, cap: usize) -> usize {
    count.saturating_mul(weight).min(cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clusters(counts: &[i64]) -> Vec<IpCluster> {
        counts
            .iter()
            .enumerate()
            .map(|(i, &lead_count)| IpCluster {
                ip_address: format!("10.0.0.{}", i),
                lead_count,
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_empty_signals_score_zero() {
        let risk = RiskAssessment::from_signals(&[], &[], &[]);
        assert_eq!(risk.score.score(), 0);
        assert_eq!(risk.level, RiskLevel::Low);
        assert_eq!(RiskAssessment::assess_opt(None), risk);
    }

    #[test]
    fn test_reference_example_scores_high() {
        let risk = RiskAssessment::from_signals(
            &clusters(&[6, 2, 2, 3]),
            &vec![RapidSubmission::default(); 3],
            &vec![PhoneReuse::default(); 2],
        );
        // 30 + 15 + 15 + 8
        assert_eq!(risk.score.score(), 68);
        assert_eq!(risk.level, RiskLevel::High);
    }

    #[test]
    fn test_everything_capped_at_100() {
        let risk = RiskAssessment::from_signals(
            &clusters(&[9; 12]),
            &vec![RapidSubmission::default(); 40],
            &vec![PhoneReuse::default(); 40],
        );
        assert_eq!(risk.score.score(), 100);
        assert_eq!(risk.level, RiskLevel::Critical);
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(RiskLevel::from(RiskScore::new(14)), RiskLevel::Low);
        assert_eq!(RiskLevel::from(RiskScore::new(15)), RiskLevel::Medium);
        assert_eq!(RiskLevel::from(RiskScore::new(39)), RiskLevel::Medium);
        assert_eq!(RiskLevel::from(RiskScore::new(40)), RiskLevel::High);
        assert_eq!(RiskLevel::from(RiskScore::new(70)), RiskLevel::Critical);
        assert_eq!(RiskScore::new(250).score(), 100);
    }

    #[test]
    fn test_assessment_serializes_flat() {
        let risk = RiskAssessment::from_signals(&clusters(&[2, 2]), &[], &[]);
        let json = serde_json::to_value(risk).unwrap();
        assert_eq!(json, serde_json::json!({"score": 16, "level": "medium"}));
    }
}
