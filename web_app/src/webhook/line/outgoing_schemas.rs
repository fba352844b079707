//! # LINE Outgoing Message Schemas
//!
//! JSON payloads sent to the LINE Messaging API reply endpoint.

use serde::{Deserialize, Serialize};

/// Body of `POST /v2/bot/message/reply`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyMessageRequest {
    /// Reply token received with the webhook event
    pub reply_token: String,
    /// Messages to send, LINE accepts up to five
    pub messages: Vec<OutgoingTextMessage>,
}

impl ReplyMessageRequest {
    /// Creates a reply carrying a single text message
    pub fn text(reply_token: String, text: String) -> Self {
        Self {
            reply_token,
            messages: vec![OutgoingTextMessage::new(text)],
        }
    }
}

/// Text message to send to LINE
#[derive(Debug, Serialize, Deserialize)]
pub struct OutgoingTextMessage {
    /// Message type, always "text"
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Message text
    pub text: String,
}

impl OutgoingTextMessage {
    /// Creates a new text message
    pub fn new(text: String) -> Self {
        Self {
            msg_type: "text".to_string(),
            text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reply_text_serialization() {
        let request = ReplyMessageRequest::text("token123".into(), "hello".into());

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "replyToken": "token123",
                "messages": [{"type": "text", "text": "hello"}]
            })
        );
    }
}
