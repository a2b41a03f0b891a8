use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use flitzap::config::AppConfig;
use flitzap::db;
use flitzap::handlers;
use flitzap::services::notify::brevo::BrevoTransport;
use flitzap::services::notify::{Notifier, NotifierSettings};
use flitzap::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    if config.brevo_api_key.is_empty() {
        tracing::warn!("BREVO_API_KEY not set, booking notifications will not be sent");
    }
    let notifier = Notifier::new(
        Box::new(BrevoTransport::new(config.brevo_api_key.clone())),
        NotifierSettings::from_config(&config),
    );

    let state = Arc::new(AppState::new(conn, config.clone(), notifier));
    let loaded = state.refresh_view()?;
    tracing::info!(bookings = loaded.len(), "booking view loaded");

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
