use config::{ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub auth: AuthConfig,
    pub fraud: FraudConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthConfig {
    /// Shared admin password; login answers 500 while unset
    #[serde(default)]
    pub admin_password: Option<String>,
    pub cookie_name: String,
    pub max_age_days: i64,
    pub secure: bool,
    pub login_attempts_per_minute: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FraudConfig {
    pub poll_interval_secs: u64,
    pub default_days: u32,
    pub whitelist: Vec<String>,
    pub whitelist_enabled: bool,
    /// Hours added to UTC for hourly-chart labels
    pub hour_label_offset: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let mut builder = config::Config::builder()
            // Server defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.workers", 2)?
            // Backend API
            .set_default("backend.base_url", "http://localhost:4000/api")?
            .set_default("backend.timeout_secs", 15)?
            // Session gate
            .set_default("auth.cookie_name", "tp_admin_auth")?
            .set_default("auth.max_age_days", 7)?
            .set_default("auth.secure", environment == "production")?
            .set_default("auth.login_attempts_per_minute", 10)?
            // Fraud monitor
            .set_default("fraud.poll_interval_secs", 30)?
            .set_default("fraud.default_days", 30)?
            .set_default("fraud.whitelist", vec!["73.138.132.140", "72.14.201.235"])?
            .set_default("fraud.whitelist_enabled", true)?
            .set_default("fraud.hour_label_offset", 1)?;

        builder = builder
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            .add_source(
                Environment::with_prefix("ADMIN_DASHBOARD")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("fraud.whitelist")
                    .try_parsing(true),
            );

        // Override from environment variables
        if let Ok(port) = env::var("PORT") {
            builder = builder.set_override("server.port", port)?;
        }

        if let Ok(url) = env::var("BACKEND_URL") {
            builder = builder.set_override("backend.base_url", url)?;
        }

        if let Ok(password) = env::var("ADMIN_PASSWORD") {
            builder = builder.set_override("auth.admin_password", password)?;
        }

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("server.port must be non-zero".to_string()));
        }
        if self.backend.base_url.trim().is_empty() {
            return Err(ConfigError::Message("backend.base_url is required".to_string()));
        }
        if self.fraud.poll_interval_secs == 0 {
            return Err(ConfigError::Message(
                "fraud.poll_interval_secs must be non-zero".to_string(),
            ));
        }
        if self.auth.login_attempts_per_minute == 0 {
            return Err(ConfigError::Message(
                "auth.login_attempts_per_minute must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a non-empty admin password is configured
    pub fn password_configured(&self) -> bool {
        self.auth
            .admin_password
            .as_deref()
            .map_or(false, |p| !p.is_empty())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                workers: 1,
            },
            backend: BackendConfig {
                base_url: "http://localhost:4000/api".to_string(),
                timeout_secs: 15,
            },
            auth: AuthConfig {
                admin_password: None,
                cookie_name: "tp_admin_auth".to_string(),
                max_age_days: 7,
                secure: false,
                login_attempts_per_minute: 10,
            },
            fraud: FraudConfig {
                poll_interval_secs: 30,
                default_days: 30,
                whitelist: vec!["73.138.132.140".to_string(), "72.14.201.235".to_string()],
                whitelist_enabled: true,
                hour_label_offset: 1,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(!config.password_configured());
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let mut config = Config::default();
        config.fraud.poll_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_env_validates() {
        env::set_var("ADMIN_DASHBOARD__FRAUD__POLL_INTERVAL_SECS", "0");
        let result = Config::from_env();
        env::remove_var("ADMIN_DASHBOARD__FRAUD__POLL_INTERVAL_SECS");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_backend_rejected() {
        let mut config = Config::default();
        config.backend.base_url = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
