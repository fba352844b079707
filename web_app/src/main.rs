//! # LINE Echo Webhook
//!
//! Main entry point of the webhook server. Loads the configuration, sets up
//! logging and metrics, and serves the LINE webhook routes.

pub mod config;
pub mod consts;
pub mod errors;
pub mod metric;
pub mod webhook;

use envconfig::Envconfig;
use logfire::config::{MetricsOptions, SendToLogfire};
use ntex::web;

#[ntex::main]
async fn main() -> anyhow::Result<()> {
    // Initialize configuration
    let app_config = config::AppConfig::init_from_env()?;

    // Initialize logging and metrics
    let mut logfire_config = logfire::configure()
        .install_panic_handler()
        .with_metrics(Some(MetricsOptions::default()))
        .send_to_logfire(SendToLogfire::IfTokenPresent);
    if let Some(token) = &app_config.logfire_token {
        logfire_config = logfire_config.with_token(token);
    }
    let shutdown_handler = logfire_config.finish()?;

    for name in app_config.missing_credentials() {
        logfire::warn!(
            "{name} is not set, LINE webhook requests will fail",
            name = name
        );
    }

    configure_and_run_server(app_config).await?;

    shutdown_handler.shutdown()?;

    Ok(())
}

/// Creates application state from the loaded configuration
fn create_app_state(app_config: &config::AppConfig) -> webhook::AppState {
    webhook::AppState {
        config: app_config.clone(),
        line_client: Box::new(webhook::line::client::LineClient::from_config(app_config)),
    }
}

/// Configures and starts the web server
async fn configure_and_run_server(app_config: config::AppConfig) -> anyhow::Result<()> {
    let server_addr = app_config.server_addr();

    logfire::info!(
        "Starting LINE webhook server on {host}:{port} ({env})",
        host = server_addr.0.clone(),
        port = i64::from(server_addr.1),
        env = app_config.env.clone()
    );

    web::server(move || {
        web::App::new()
            .wrap(web::middleware::Logger::default())
            .state(create_app_state(&app_config))
            .configure(webhook::routes::line)
    })
    .bind(server_addr)?
    .run()
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
