//! Background fraud monitor
//!
//! Re-fetches the fraud summary for its current date range on a fixed
//! interval, on demand, and whenever the range changes. Relative presets
//! ("Last 30 days") are re-resolved against the current day on every fetch.
//! Overlapping fetches resolve last-issued-wins through the view's
//! generation guard.

use crate::backend_client::BackendClient;
use crate::metrics::{FRAUD_RISK_SCORE, STALE_RESPONSES_TOTAL};
use chrono::{DateTime, Local, NaiveDate, Utc};
use lead_core::{Applied, DateRange, FraudSummary, IpWhitelist, RiskAssessment, ViewState};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Point-in-time copy of the monitor state
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorSnapshot {
    pub range: DateRange,
    pub data: Option<FraudSummary>,
    pub error: Option<String>,
    pub loading: bool,
    pub refreshing: bool,
    pub last_refresh: Option<DateTime<Utc>>,
}

struct MonitorInner {
    backend: Arc<BackendClient>,
    whitelist: Arc<RwLock<IpWhitelist>>,
    view: Mutex<ViewState<FraudSummary>>,
    range: RwLock<DateRange>,
    /// Period requested when the range is unbounded
    fallback_days: u32,
}

impl MonitorInner {
    async fn refresh(&self, today: NaiveDate) -> Applied {
        let (ticket, range) = {
            let mut view = self.view.lock();
            let ticket = view.begin();
            let mut range = self.range.write();
            match range.rebase(today) {
                Ok(current) => *range = current,
                Err(e) => warn!(error = %e, range = %range.label, "Keeping stale fraud range"),
            }
            (ticket, range.clone())
        };

        let window = range.window(&Local);
        let result = self
            .backend
            .fraud_summary(self.fallback_days, window.as_ref())
            .await;

        let mut view = self.view.lock();
        let applied = view.complete(ticket, result, Utc::now());
        match applied {
            Applied::Stale => {
                STALE_RESPONSES_TOTAL.inc();
                debug!(ticket = ticket.id(), "Discarded stale fraud summary");
            }
            Applied::Current => {
                if let Some(error) = &view.error {
                    warn!(error = %error, range = %range.label, "Fraud monitor refresh failed");
                }
                if let Some(summary) = &view.data {
                    let filtered = self.whitelist.read().apply(summary);
                    let risk = RiskAssessment::assess(&filtered);
                    FRAUD_RISK_SCORE.set(i64::from(risk.score.score()));
                }
            }
        }
        applied
    }
}

pub struct FraudMonitor {
    inner: Arc<MonitorInner>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl FraudMonitor {
    pub fn new(
        backend: Arc<BackendClient>,
        whitelist: Arc<RwLock<IpWhitelist>>,
        range: DateRange,
        fallback_days: u32,
    ) -> Self {
        Self {
            inner: Arc::new(MonitorInner {
                backend,
                whitelist,
                view: Mutex::new(ViewState::new()),
                range: RwLock::new(range),
                fallback_days,
            }),
            task: Mutex::new(None),
        }
    }

    /// Start polling; the first tick fetches immediately. Restarting replaces
    /// the previous task.
    pub fn start(&self, every: Duration) {
        info!(interval_secs = every.as_secs(), "Starting fraud monitor");

        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                inner.refresh(Local::now().date_naive()).await;
            }
        });

        if let Some(previous) = self.task.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Fetch now
    pub async fn refresh(&self) -> Applied {
        self.refresh_on(Local::now().date_naive()).await
    }

    /// Fetch with relative presets resolved against `today`
    pub async fn refresh_on(&self, today: NaiveDate) -> Applied {
        self.inner.refresh(today).await
    }

    /// Switch to a new range and fetch it
    pub async fn set_range(&self, range: DateRange) -> Applied {
        info!(range = %range.label, "Fraud monitor range changed");
        *self.inner.range.write() = range;
        self.refresh().await
    }

    pub fn range(&self) -> DateRange {
        self.inner.range.read().clone()
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        let view = self.inner.view.lock();
        MonitorSnapshot {
            range: self.range(),
            data: view.data.clone(),
            error: view.error.clone(),
            loading: view.loading,
            refreshing: view.refreshing,
            last_refresh: view.last_refresh,
        }
    }
}

impl Drop for FraudMonitor {
    fn drop(&mut self) {
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
    }
}
