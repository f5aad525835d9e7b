//! Property-based tests for dashboard invariants
//!
//! - Risk score stays within 0..=100 and never drops when a signal set grows
//! - Whitelist filtering keeps order and removes only exact matches
//! - Resolved date ranges are half-open, non-empty and never end past tomorrow

use chrono::{Duration, NaiveDate};
use lead_core::fraud::signals::{FraudSummary, IpCluster, PhoneReuse, RapidSubmission};
use lead_core::{DateRange, IpWhitelist, Preset, RiskAssessment, RiskLevel};
use proptest::prelude::*;

/// Strategy for IP clusters with realistic lead counts
fn cluster_strategy() -> impl Strategy<Value = IpCluster> {
    ("[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}", 2i64..20).prop_map(
        |(ip_address, lead_count)| IpCluster {
            ip_address,
            lead_count,
            ..Default::default()
        },
    )
}

fn rapid(n: usize) -> Vec<RapidSubmission> {
    vec![RapidSubmission::default(); n]
}

fn phones(n: usize) -> Vec<PhoneReuse> {
    vec![PhoneReuse::default(); n]
}

/// Strategy for a day between 2000 and 2099
fn day_strategy() -> impl Strategy<Value = NaiveDate> {
    (0i64..36_500).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2000, 1, 1).unwrap() + Duration::days(offset)
    })
}

/// Strategy for presets that resolve without picked dates
fn preset_strategy() -> impl Strategy<Value = Preset> {
    prop_oneof![
        Just(Preset::Today),
        Just(Preset::Yesterday),
        (1u32..366).prop_map(Preset::LastDays),
        Just(Preset::ThisMonth),
        Just(Preset::LastMonth),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: score is always within 0..=100 and its tier matches
    #[test]
    fn prop_score_bounded(
        clusters in prop::collection::vec(cluster_strategy(), 0..30),
        rapid_count in 0usize..40,
        phone_count in 0usize..40,
    ) {
        let risk = RiskAssessment::from_signals(&clusters, &rapid(rapid_count), &phones(phone_count));
        prop_assert!(risk.score.score() <= 100);
        prop_assert_eq!(risk.level, RiskLevel::from(risk.score));
    }

    /// Property: adding a record to any set never lowers the score
    #[test]
    fn prop_score_monotonic(
        clusters in prop::collection::vec(cluster_strategy(), 0..10),
        extra in cluster_strategy(),
        rapid_count in 0usize..10,
        phone_count in 0usize..10,
    ) {
        let base = RiskAssessment::from_signals(&clusters, &rapid(rapid_count), &phones(phone_count));

        let mut more_clusters = clusters.clone();
        more_clusters.push(extra);
        let grown = [
            RiskAssessment::from_signals(&more_clusters, &rapid(rapid_count), &phones(phone_count)),
            RiskAssessment::from_signals(&clusters, &rapid(rapid_count + 1), &phones(phone_count)),
            RiskAssessment::from_signals(&clusters, &rapid(rapid_count), &phones(phone_count + 1)),
        ];
        for risk in grown {
            prop_assert!(risk.score >= base.score);
        }
    }

    /// Property: whitelisted IPs vanish, everything else keeps its order
    #[test]
    fn prop_whitelist_filters_exact_matches(
        clusters in prop::collection::vec(cluster_strategy(), 0..20),
        pick in any::<prop::sample::Index>(),
    ) {
        let blocked = if clusters.is_empty() {
            "10.0.0.1".to_string()
        } else {
            clusters[pick.index(clusters.len())].ip_address.clone()
        };
        let summary = FraudSummary { ip_clusters: clusters.clone(), ..Default::default() };
        let filtered = IpWhitelist::new([blocked.clone()], true).apply(&summary);

        let expected: Vec<_> = clusters.into_iter().filter(|c| c.ip_address != blocked).collect();
        prop_assert_eq!(filtered.ip_clusters, expected);
    }

    /// Property: presets resolve to non-empty half-open ranges ending by tomorrow
    #[test]
    fn prop_range_well_formed(preset in preset_strategy(), today in day_strategy()) {
        let range = DateRange::resolve(preset, today).unwrap();
        let (from, to) = (range.from.unwrap(), range.to.unwrap());
        prop_assert!(from < to);
        prop_assert!(to <= today + Duration::days(1));
        prop_assert!(range.days.unwrap() >= 1);
    }

    /// Property: navigation keeps the span and never passes tomorrow
    #[test]
    fn prop_navigation_keeps_span(
        preset in preset_strategy(),
        today in day_strategy(),
        steps in -5i32..5,
    ) {
        let range = DateRange::resolve(preset, today).unwrap();
        let moved = range.navigate(steps, today).unwrap();
        prop_assert_eq!(moved.span_days(), range.span_days());
        prop_assert!(moved.to.unwrap() <= today + Duration::days(1));
    }
}
