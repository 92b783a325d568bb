//! healthboard - uptime monitoring dashboard
//!
//! Polls a metrics backend for availability, latency and status code
//! aggregates, and serves the resulting widgets along with a form to register
//! new targets.

mod api;
mod config;
mod poller;
mod web;
mod widgets;

use api::MetricsClient;
use config::DashboardConfig;
use poller::Poller;
use web::Server;
use widgets::Dashboard;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("healthboard=info".parse()?))
        .init();

    // Load configuration
    let cfg = DashboardConfig::load();
    tracing::info!("Starting healthboard on port {}...", cfg.http_port);
    tracing::info!("Using metrics backend at {}", cfg.backend_url);

    // A refresh never outlives the next one, so the period doubles as timeout.
    let client = MetricsClient::new(&cfg.backend_url, cfg.refresh_interval)?;
    let dashboard = Dashboard::new(&cfg, client.clone());

    // Start polling
    let poller = Poller::new(client, cfg.duration.clone(), cfg.refresh_interval);
    poller.add_widget(dashboard.availability.clone()).await;
    poller.add_widget(dashboard.latency.clone()).await;
    poller.add_widget(dashboard.latency_distribution.clone()).await;
    poller.add_widget(dashboard.status_codes.clone()).await;

    // Start web server
    let server = Server::new(cfg, dashboard);
    server.start().await?;

    poller.stop_all().await;

    Ok(())
}
