//! Client for the lead brokerage backend API
//!
//! Single failure surface for every view: transport failures become
//! [`DashboardError::Unreachable`], non-2xx answers become
//! [`DashboardError::Backend`] carrying the backend's `error`/`message` or
//! `HTTP <status>`. Payloads go through the lenient models of `lead_core`.

use crate::errors::{DashboardError, Result};
use crate::metrics::{self, UNKNOWN_STATUSES_TOTAL};
use lead_core::analytics::{DailyResponse, DailyRow, Funnel, SummaryResponse, SummaryStats};
use lead_core::lender::{Lender, LenderInput, LenderTestResult};
use lead_core::{FraudSummary, LeadDetail, LeadPage, LeadQuery, Window};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct LendersResponse {
    #[serde(default)]
    lenders: Vec<Lender>,
}

pub struct BackendClient {
    base_url: String,
    client: Client,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| DashboardError::Misconfigured(format!("HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Headline counters
    pub async fn summary(&self, window: Option<&Window>) -> Result<SummaryStats> {
        let query = window.map(Window::query_pairs).unwrap_or_default();
        let response: SummaryResponse = self
            .get("/analytics/summary", "/analytics/summary", &query)
            .await?;
        Ok(response.stats)
    }

    /// Per-day counters
    pub async fn daily(&self, days: u32, window: Option<&Window>) -> Result<Vec<DailyRow>> {
        let query = days_and_window(days, window);
        let response: DailyResponse = self
            .get("/analytics/daily", "/analytics/daily", &query)
            .await?;
        Ok(response.analytics)
    }

    /// Form funnel
    pub async fn funnel(&self, days: u32, window: Option<&Window>) -> Result<Funnel> {
        let query = days_and_window(days, window);
        self.get("/analytics/funnel", "/analytics/funnel", &query).await
    }

    /// One page of leads; statuses outside the known set are counted and logged
    pub async fn leads(&self, query: &LeadQuery) -> Result<LeadPage> {
        let page: LeadPage = self.get("/leads", "/leads", &query.query_pairs()).await?;

        let unknown = page.unknown_statuses();
        if unknown > 0 {
            warn!(count = unknown, page = page.pagination.page, "Leads with unrecognized status");
            UNKNOWN_STATUSES_TOTAL.inc_by(unknown as u64);
        }
        Ok(page)
    }

    /// Lead with postbacks, distributions and redirect logs
    pub async fn lead(&self, id: i64) -> Result<LeadDetail> {
        self.get(&format!("/leads/{}", id), "/leads/:id", &[]).await
    }

    pub async fn lenders(&self) -> Result<Vec<Lender>> {
        let response: LendersResponse = self.get("/lenders", "/lenders", &[]).await?;
        Ok(response.lenders)
    }

    pub async fn create_lender(&self, input: &LenderInput) -> Result<serde_json::Value> {
        let body = serde_json::to_value(input).map_err(internal)?;
        self.send(Method::POST, "/lenders", "/lenders", &[], Some(body))
            .await
    }

    pub async fn update_lender(&self, id: i64, input: &LenderInput) -> Result<serde_json::Value> {
        let body = serde_json::to_value(input).map_err(internal)?;
        self.send(Method::PUT, &format!("/lenders/{}", id), "/lenders/:id", &[], Some(body))
            .await
    }

    pub async fn delete_lender(&self, id: i64) -> Result<serde_json::Value> {
        self.send(Method::DELETE, &format!("/lenders/{}", id), "/lenders/:id", &[], None)
            .await
    }

    /// Ask the backend to send a test lead to the lender
    pub async fn test_lender(&self, id: i64) -> Result<LenderTestResult> {
        self.send(
            Method::POST,
            &format!("/lenders/{}/test", id),
            "/lenders/:id/test",
            &[],
            None,
        )
        .await
    }

    /// Fraud signal sets; `success: false` is an error even with a 2xx status
    pub async fn fraud_summary(&self, days: u32, window: Option<&Window>) -> Result<FraudSummary> {
        let query = match window {
            Some(window) => window.query_pairs(),
            None => vec![("days".to_string(), days.to_string())],
        };
        let summary: FraudSummary = self.get("/fraud/summary", "/fraud/summary", &query).await?;

        if !summary.success {
            let message = summary
                .error
                .clone()
                .unwrap_or_else(|| "Unknown error".to_string());
            warn!(error = %message, "Fraud summary reported failure");
            return Err(DashboardError::Backend {
                status: 502,
                message,
            });
        }
        Ok(summary)
    }

    /// Connectivity probe
    pub async fn health(&self) -> Result<serde_json::Value> {
        self.get("/health", "/health", &[]).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        label: &'static str,
        query: &[(String, String)],
    ) -> Result<T> {
        self.send(Method::GET, path, label, query, None).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        label: &'static str,
        query: &[(String, String)],
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, url = %url, "Backend request");

        let mut request = self.client.request(method, &url).query(query);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| {
            metrics::record_backend(label, "unreachable");
            warn!(path = label, error = %e, "Backend unreachable");
            DashboardError::Unreachable(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message =
                error_message(&body).unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            metrics::record_backend(label, "http_error");
            warn!(path = label, status = status.as_u16(), error = %message, "Backend error");
            return Err(DashboardError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        metrics::record_backend(label, "ok");
        response.json::<T>().await.map_err(|e| {
            warn!(path = label, error = %e, "Malformed backend response");
            DashboardError::Backend {
                status: 502,
                message: format!("Malformed backend response: {}", e),
            }
        })
    }
}

/// `error`, then `message`, from a JSON error body
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "message"].iter().find_map(|key| match value.get(key)? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Null => None,
        serde_json::Value::String(_) => None,
        other => Some(other.to_string()),
    })
}

fn days_and_window(days: u32, window: Option<&Window>) -> Vec<(String, String)> {
    let mut query = vec![("days".to_string(), days.to_string())];
    if let Some(window) = window {
        query.extend(window.query_pairs());
    }
    query
}

fn internal(err: serde_json::Error) -> DashboardError {
    DashboardError::Internal(err.to_string())
}
