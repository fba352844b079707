//! LINE webhook integration module
//!
//! This module provides webhook handling for the LINE Messaging API: the
//! HTTP route handlers and the logic that echoes incoming text messages.
//!
//! ## Submodules
//!
//! - [`handler`] - Per-event processing of a verified webhook delivery
//! - [`routes`] - HTTP endpoint handlers (GET liveness, POST receiver, 405 fallback)
//! - [`schemas`] - Incoming webhook envelope and event kinds
//! - [`outgoing_schemas`] - Reply request payloads
//! - [`client`] - LINE API client for sending replies
//! - [`security`] - `X-Line-Signature` verification

pub mod client;
pub mod handler;
pub mod outgoing_schemas;
pub mod routes;
pub mod schemas;
pub mod security;

// Re-export commonly used items for convenience
pub use routes::{health, method_not_allowed, receive};
