use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use lazy_static::lazy_static;

lazy_static! {
    // Backend API metrics
    pub static ref BACKEND_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("dashboard_backend_requests_total", "Backend API requests"),
        &["path", "outcome"]
    ).expect("metric can be created");

    pub static ref STALE_RESPONSES_TOTAL: IntCounter = IntCounter::new(
        "dashboard_stale_responses_total",
        "Responses discarded because a newer request was issued"
    ).expect("metric can be created");

    pub static ref UNKNOWN_STATUSES_TOTAL: IntCounter = IntCounter::new(
        "dashboard_unknown_lead_statuses_total",
        "Leads whose status did not normalize"
    ).expect("metric can be created");

    // Auth metrics
    pub static ref LOGIN_ATTEMPTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("dashboard_login_attempts_total", "Login attempts"),
        &["outcome"]
    ).expect("metric can be created");

    // Fraud monitor
    pub static ref FRAUD_RISK_SCORE: IntGauge = IntGauge::new(
        "dashboard_fraud_risk_score",
        "Risk score of the latest monitored fraud summary"
    ).expect("metric can be created");

    pub static ref REGISTRY: Registry = {
        let registry = Registry::new();
        register_metrics(&registry).expect("metrics can be registered");
        registry
    };
}

/// Register all metrics with the given registry
pub fn register_metrics(registry: &Registry) -> Result<(), prometheus::Error> {
    registry.register(Box::new(BACKEND_REQUESTS_TOTAL.clone()))?;
    registry.register(Box::new(STALE_RESPONSES_TOTAL.clone()))?;
    registry.register(Box::new(UNKNOWN_STATUSES_TOTAL.clone()))?;
    registry.register(Box::new(LOGIN_ATTEMPTS_TOTAL.clone()))?;
    registry.register(Box::new(FRAUD_RISK_SCORE.clone()))?;
    Ok(())
}

/// Record one backend call by path and outcome (`ok`, `http_error`, `unreachable`)
pub fn record_backend(path: &str, outcome: &str) {
    BACKEND_REQUESTS_TOTAL.with_label_values(&[path, outcome]).inc();
}

/// Generate metrics output in Prometheus text format
pub fn render() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        let registry = Registry::new();
        assert!(register_metrics(&registry).is_ok());
    }

    #[test]
    fn test_render() {
        LOGIN_ATTEMPTS_TOTAL.with_label_values(&["success"]).inc();
        let output = render().unwrap();
        assert!(output.contains("dashboard_login_attempts_total"));
    }
}
