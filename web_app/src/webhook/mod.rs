//! Webhook handlers for external integrations
//!
//! ## Modules
//!
//! - [`line`] - LINE Messaging API webhook handlers

pub mod line;
pub mod routes;

use crate::config::AppConfig;

/// Shared, read-only state of every webhook request
pub struct AppState {
    pub config: AppConfig,
    pub line_client: line::client::ImplReplyClient,
}
