use actix_web::{middleware, web, App, HttpServer};
use admin_dashboard::{
    config::Config,
    handlers,
    middleware::{LoginRateLimiter, SessionGate},
    state::AppState,
};
use anyhow::Context;
use dotenv::dotenv;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .json()
        .init();

    info!("Starting Admin Dashboard...");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(backend = %config.backend.base_url, "Configuration loaded successfully");

    if !config.password_configured() {
        warn!("ADMIN_PASSWORD is not set; every login attempt will fail");
    }

    let state = web::Data::new(AppState::new(config).context("Failed to build app state")?);

    // Fraud monitor polls in the background for the life of the server
    let poll = Duration::from_secs(state.config.fraud.poll_interval_secs);
    state.monitor.start(poll);
    info!(interval_secs = poll.as_secs(), "Fraud monitor started");

    let server_config = state.config.server.clone();
    let cookie_name = state.config.auth.cookie_name.clone();
    let limiter = LoginRateLimiter::new(state.config.auth.login_attempts_per_minute);

    info!(
        "Starting HTTP server on {}:{}",
        server_config.host, server_config.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(SessionGate::new(&cookie_name))
            .wrap(limiter.clone())
            .wrap(middleware::Logger::default())
            .configure(handlers::configure_routes)
    })
    .workers(server_config.workers)
    .bind((server_config.host, server_config.port))?
    .run()
    .await?;

    Ok(())
}
