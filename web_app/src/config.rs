//! Application configuration loaded from the process environment.
//!
//! The configuration is read once at startup and handed to the web server as
//! part of the application state, so request handlers never touch the
//! environment themselves.
//!
//! # Security Notes
//! - Sensitive fields are clearly marked and should never be logged
//! - An empty channel secret makes every signature check fail
//! - An empty access token makes the platform reject every reply

use crate::consts;
use envconfig::Envconfig;

/// Environment variables used to configure the webhook server.
#[derive(Envconfig, Clone)]
pub struct AppConfig {
    /// Environment name to deploy the app (NON-SENSITIVE)
    /// Values: "local", "dev", "staging", "prod"
    #[envconfig(default = "local")]
    pub env: String,

    /// Host address for web server binding (NON-SENSITIVE)
    #[envconfig(default = "0.0.0.0")]
    pub web_server_host: String,

    /// Port for web server binding (NON-SENSITIVE)
    #[envconfig(default = "8080")]
    pub web_server_port: u16,

    /// 🔒 SENSITIVE: LINE channel secret, the HMAC key of `X-Line-Signature`
    #[envconfig(default = "")]
    pub line_channel_secret: String,

    /// 🔒 SENSITIVE: LINE channel access token used as bearer credential
    #[envconfig(default = "")]
    pub line_access_token: String,

    /// LINE Messaging API reply endpoint (NON-SENSITIVE)
    #[envconfig(default = "https://api.line.me/v2/bot/message/reply")]
    pub line_reply_endpoint: String,

    /// Upper bound for the raw webhook body in bytes (NON-SENSITIVE)
    #[envconfig(default = "1048576")]
    pub webhook_max_body_bytes: usize,

    /// 🔒 SENSITIVE: Logfire write token, logs stay on the console when unset
    pub logfire_token: Option<String>,
}

impl AppConfig {
    /// Address the web server binds to
    pub fn server_addr(&self) -> (String, u16) {
        (self.web_server_host.clone(), self.web_server_port)
    }

    /// Returns the names of required credentials that are empty.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.line_channel_secret.is_empty() {
            missing.push(consts::ENV_CHANNEL_SECRET);
        }
        if self.line_access_token.is_empty() {
            missing.push(consts::ENV_ACCESS_TOKEN);
        }
        missing
    }
}

#[cfg(test)]
impl AppConfig {
    /// Builds a configuration for tests without reading the environment.
    pub fn for_tests(channel_secret: &str) -> Self {
        Self {
            env: "local".into(),
            web_server_host: "127.0.0.1".into(),
            web_server_port: 8080,
            line_channel_secret: channel_secret.into(),
            line_access_token: "test-access-token".into(),
            line_reply_endpoint: "https://api.line.me/v2/bot/message/reply".into(),
            webhook_max_body_bytes: 1_048_576,
            logfire_token: None,
        }
    }
}
