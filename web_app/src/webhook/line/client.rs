//! # LINE API Client
//!
//! Sends reply messages to the LINE Messaging API. The handler talks to the
//! [`ReplyClient`] trait so tests can swap the HTTP client for a mock.

use super::outgoing_schemas::ReplyMessageRequest;
use crate::config::AppConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;

/// Sends replies correlated to a webhook event
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReplyClient {
    /// Replies to the event identified by `reply_token` with a single text message
    async fn reply_text(&self, reply_token: &str, text: &str) -> Result<()>;
}

pub type ImplReplyClient = Box<dyn ReplyClient>;

/// LINE Messaging API client
#[derive(Clone)]
pub struct LineClient {
    /// HTTP client for making API requests
    client: reqwest::Client,
    /// Reply endpoint
    endpoint: String,
    /// Channel access token
    access_token: String,
}

impl LineClient {
    /// Creates a new LINE client
    pub fn new(endpoint: String, access_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            access_token,
        }
    }

    /// Creates a LINE client from the application configuration
    pub fn from_config(app_config: &AppConfig) -> Self {
        Self::new(
            app_config.line_reply_endpoint.clone(),
            app_config.line_access_token.clone(),
        )
    }

    /// Posts a reply request to LINE
    ///
    /// # Returns
    /// * `Err` with the status and response body when LINE answers non-2xx
    pub async fn send_reply(&self, message: &ReplyMessageRequest) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.access_token)
            .header("Content-Type", "application/json")
            .json(message)
            .send()
            .await
            .context("Failed to send request to LINE reply API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());

            anyhow::bail!("LINE reply API returned error status {}: {}", status, body);
        }

        Ok(())
    }
}

#[async_trait]
impl ReplyClient for LineClient {
    async fn reply_text(&self, reply_token: &str, text: &str) -> Result<()> {
        let message = ReplyMessageRequest::text(reply_token.to_string(), text.to_string());
        self.send_reply(&message).await
    }
}
