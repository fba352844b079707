//! # LINE Webhook Schemas
//!
//! Data structures for the JSON envelope LINE posts to the webhook. The
//! envelope is read in two steps: the envelope itself, whose events are kept
//! as raw JSON values, then every event on its own into a [`WebhookEvent`].
//! A malformed event therefore never invalidates its siblings, and only the
//! fields that decide dispatch are required to have the expected shape.

use serde_json::Value;

/// Root webhook payload from LINE
#[derive(Debug, Default)]
pub struct WebhookPayload {
    /// User ID of the bot that should receive the events
    pub destination: Option<String>,
    /// Events of this delivery
    pub events: Vec<Value>,
}

impl From<Value> for WebhookPayload {
    /// Reads the envelope from any JSON value.
    ///
    /// A missing or `null` `events` field means no events. Any other non-array
    /// `events` is logged and treated as empty.
    fn from(mut body: Value) -> Self {
        let destination = body
            .get("destination")
            .and_then(Value::as_str)
            .map(str::to_string);

        let events = match body.get_mut("events").map(Value::take) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(events)) => events,
            Some(other) => {
                logfire::warn!(
                    "Ignoring non-array events field: {events}",
                    events = other.to_string()
                );
                Vec::new()
            }
        };

        Self {
            destination,
            events,
        }
    }
}

impl WebhookPayload {
    /// Event type tags in delivery order, `None` when an event has no string `type`
    pub fn event_types(&self) -> Vec<Option<&str>> {
        self.events
            .iter()
            .map(|event| event.get("type").and_then(Value::as_str))
            .collect()
    }
}

/// Text message the bot can reply to
#[derive(Debug, Clone, PartialEq)]
pub struct TextMessageEvent {
    pub reply_token: String,
    pub text: String,
    pub user_id: Option<String>,
}

/// Closed set of event kinds the bot distinguishes
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    TextMessage(TextMessageEvent),
    /// Every other event, kept only for logging
    Other { event_type: String },
}

/// Renders `message.text` the way it is echoed: missing or `null` is empty,
/// non-string values are echoed as their JSON text.
fn message_text(text: Option<&Value>) -> String {
    match text {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

impl TryFrom<Value> for WebhookEvent {
    type Error = String;

    fn try_from(event: Value) -> Result<Self, Self::Error> {
        let event_type = event
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| "malformed event: missing string type".to_string())?;

        let message = event.get("message");
        let is_text_message = event_type == "message"
            && message
                .and_then(|m| m.get("type"))
                .and_then(Value::as_str)
                == Some("text");

        if !is_text_message {
            return Ok(WebhookEvent::Other {
                event_type: event_type.to_string(),
            });
        }

        let reply_token = event
            .get("replyToken")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| "text message event without replyToken".to_string())?;

        Ok(WebhookEvent::TextMessage(TextMessageEvent {
            reply_token: reply_token.to_string(),
            text: message_text(message.and_then(|m| m.get("text"))),
            user_id: event
                .get("source")
                .and_then(|source| source.get("userId"))
                .and_then(Value::as_str)
                .map(str::to_string),
        }))
    }
}
