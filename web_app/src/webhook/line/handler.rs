//! # LINE Webhook Handler
//!
//! Business logic for a verified and parsed webhook delivery: every event is
//! handled on its own and produces an [`EventOutcome`]. Failures stay inside
//! their outcome, so one bad event never stops the rest of the batch.

use super::{
    client::ReplyClient,
    schemas::{TextMessageEvent, WebhookEvent, WebhookPayload},
};
use crate::metric;
use derive_more::{Display, Error};

/// Why a single event could not be handled
#[derive(Debug, Display, Error, PartialEq)]
pub enum EventError {
    #[display("invalid event: {_0}")]
    InvalidEvent(#[error(not(source))] String),
    #[display("reply delivery failed: {_0}")]
    ReplyDeliveryFailed(#[error(not(source))] String),
}

/// Result of handling one event
#[derive(Debug, PartialEq)]
pub enum EventOutcome {
    Replied { user_id: Option<String> },
    Unhandled { event_type: String },
    Failed(EventError),
}

impl EventOutcome {
    /// Label used for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            EventOutcome::Replied { .. } => "replied",
            EventOutcome::Unhandled { .. } => "unhandled",
            EventOutcome::Failed(_) => "failed",
        }
    }
}

/// Builds the echo text sent back for a user's text message
pub fn reply_text_for(text: &str) -> String {
    format!("你說了：「{text}」\n（部署成功 🎉）")
}

async fn reply_to_text_message(
    event: &TextMessageEvent,
    client: &dyn ReplyClient,
) -> EventOutcome {
    let reply = reply_text_for(&event.text);

    match client.reply_text(&event.reply_token, &reply).await {
        Ok(()) => {
            logfire::info!(
                "Replied to user: {user_id}",
                user_id = event.user_id.clone().unwrap_or_default()
            );
            EventOutcome::Replied {
                user_id: event.user_id.clone(),
            }
        }
        Err(e) => {
            let error = format!("{e:#}");
            logfire::error!("LINE reply failed: {error}", error = error.clone());
            EventOutcome::Failed(EventError::ReplyDeliveryFailed(error))
        }
    }
}

/// Handles one raw event
///
/// Text messages are echoed back through `client`, every other event is only
/// logged.
pub async fn handle_event(event: serde_json::Value, client: &dyn ReplyClient) -> EventOutcome {
    let event = match WebhookEvent::try_from(event) {
        Ok(event) => event,
        Err(e) => {
            logfire::error!("Handle event error: {error}", error = e.clone());
            return EventOutcome::Failed(EventError::InvalidEvent(e));
        }
    };

    match event {
        WebhookEvent::TextMessage(text_event) => reply_to_text_message(&text_event, client).await,
        WebhookEvent::Other { event_type } => {
            logfire::info!("Unhandled event: {event_type}", event_type = event_type.clone());
            EventOutcome::Unhandled { event_type }
        }
    }
}

/// Main webhook processor
///
/// Handles the events of `payload` one after the other, awaiting each reply
/// before moving on.
///
/// # Returns
///
/// One outcome per event, in delivery order
#[tracing::instrument(skip_all, fields(events = payload.events.len()))]
pub async fn process_webhook(
    payload: WebhookPayload,
    client: &dyn ReplyClient,
) -> Vec<EventOutcome> {
    let event_types = payload
        .event_types()
        .into_iter()
        .map(|t| t.unwrap_or("<missing>"))
        .collect::<Vec<_>>()
        .join(", ");
    logfire::info!("Incoming events: [{event_types}]", event_types = event_types);

    let mut outcomes = Vec::with_capacity(payload.events.len());
    for event in payload.events {
        let outcome = handle_event(event, client).await;
        metric::incr_event_outcome_statds(outcome.label());
        outcomes.push(outcome);
    }

    outcomes
}
