use crate::backend_client::BackendClient;
use crate::config::Config;
use crate::errors::Result;
use crate::monitor::FraudMonitor;
use chrono::Local;
use lead_core::{DateRange, IpWhitelist, Preset};
use parking_lot::RwLock;
use std::sync::Arc;

/// Shared across all workers
pub struct AppState {
    pub config: Config,
    pub backend: Arc<BackendClient>,
    pub whitelist: Arc<RwLock<IpWhitelist>>,
    pub monitor: FraudMonitor,
}

impl AppState {
    /// Wire the backend client, whitelist and (not yet started) fraud monitor
    pub fn new(config: Config) -> Result<Self> {
        let backend = Arc::new(BackendClient::new(
            &config.backend.base_url,
            config.backend.timeout_secs,
        )?);
        let whitelist = Arc::new(RwLock::new(IpWhitelist::new(
            &config.fraud.whitelist,
            config.fraud.whitelist_enabled,
        )));

        let range = DateRange::resolve(
            Preset::LastDays(config.fraud.default_days),
            Local::now().date_naive(),
        )?;
        let monitor = FraudMonitor::new(
            backend.clone(),
            whitelist.clone(),
            range,
            config.fraud.default_days,
        );

        Ok(Self {
            config,
            backend,
            whitelist,
            monitor,
        })
    }
}
