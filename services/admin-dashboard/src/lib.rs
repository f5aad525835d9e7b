pub mod auth;
pub mod backend_client;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod monitor;
pub mod state;

// Re-exports for convenience
pub use backend_client::BackendClient;
pub use monitor::FraudMonitor;
pub use state::AppState;
