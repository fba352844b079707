//! LINE webhook endpoint handlers
//!
//! - `GET` answers a static liveness string
//! - `POST` verifies `X-Line-Signature`, parses the event envelope and echoes
//!   text messages back
//! - any other method is rejected with 405
//!
//! # Security
//!
//! The POST body is verified against the channel secret before it is parsed.
//! Requests with a missing or wrong signature are rejected with 401.

use super::{handler, schemas, security};
use crate::{consts, errors::WebhookError, metric, webhook::AppState};
use ntex::{
    http,
    util::{Bytes, BytesMut},
    web,
};
use tracing::Instrument;

/// Liveness endpoint (GET)
///
/// Lets a browser or uptime monitor check that the webhook is deployed.
pub async fn health() -> Result<impl web::Responder, web::Error> {
    Ok(web::HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(consts::HEALTH_BODY))
}

/// Fallback for every method other than GET and POST
pub async fn method_not_allowed() -> Result<web::HttpResponse, web::Error> {
    Err(WebhookError::MethodNotAllowed.into())
}

/// Reads the request body, failing as soon as it grows past `limit` bytes.
///
/// A declared `Content-Length` over the limit is rejected before any byte is
/// read.
async fn read_limited_body(
    req: &web::HttpRequest,
    payload: &mut web::types::Payload,
    limit: usize,
) -> Result<Bytes, WebhookError> {
    let declared_len = req
        .headers()
        .get(http::header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok());
    if declared_len.is_some_and(|len| len > limit) {
        return Err(WebhookError::PayloadTooLarge);
    }

    let mut body = BytesMut::new();
    while let Some(chunk) = payload.recv().await {
        let chunk = chunk.map_err(|e| WebhookError::BadRequest(e.to_string()))?;
        if body.len() + chunk.len() > limit {
            return Err(WebhookError::PayloadTooLarge);
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body.freeze())
}

/// Webhook receiver endpoint (POST)
///
/// Receives webhook events from the LINE platform.
///
/// # Returns
/// - 200 once every event has been handled, whatever the per-event outcome
/// - 413 if the body is larger than `WEBHOOK_MAX_BODY_BYTES`
/// - 401 if the signature does not match
/// - 400 if the verified body is not valid JSON
pub async fn receive(
    req: web::HttpRequest,
    payload: web::types::Payload,
    app_state: web::types::State<AppState>,
) -> Result<web::HttpResponse, web::Error> {
    receive_webhook(req, payload, app_state)
        .instrument(logfire::span!("line_webhook"))
        .await
}

async fn receive_webhook(
    req: web::HttpRequest,
    mut payload: web::types::Payload,
    app_state: web::types::State<AppState>,
) -> Result<web::HttpResponse, web::Error> {
    let body = read_limited_body(
        &req,
        &mut payload,
        app_state.config.webhook_max_body_bytes,
    )
    .await?;

    let signature_header = match req.headers().get(consts::LINE_SIGNATURE_HEADER) {
        Some(header_value) => match header_value.to_str() {
            Ok(s) => Some(s),
            Err(_) => {
                logfire::warn!("Invalid X-Line-Signature header: not valid UTF-8");
                None
            }
        },
        None => None,
    };

    if !security::verify_signature(
        signature_header,
        &body,
        &app_state.config.line_channel_secret,
    ) {
        metric::incr_signature_statds("rejected");
        return Err(WebhookError::Unauthorized.into());
    }

    let envelope: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
        logfire::error!("JSON parse error: {error}", error = e.to_string());
        WebhookError::BadRequest(e.to_string())
    })?;

    let outcomes = handler::process_webhook(
        schemas::WebhookPayload::from(envelope),
        app_state.line_client.as_ref(),
    )
    .await;

    let failed = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, handler::EventOutcome::Failed(_)))
        .count();
    logfire::info!(
        "Webhook processed: {total} events, {failed} failed",
        total = outcomes.len() as i64,
        failed = failed as i64
    );

    Ok(web::HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(consts::ACK_BODY))
}

#[cfg(test)]
mod tests {
    use crate::{
        config::AppConfig,
        consts,
        webhook::{
            AppState,
            line::{client::MockReplyClient, security},
            routes,
        },
    };
    use mockall::predicate::{always, eq};
    use ntex::{
        http::{Method, StatusCode},
        util::Bytes,
        web::{self, test},
    };
    use serde_json::json;

    const SECRET: &str = "channel-secret";

    fn app_state(mock_client: MockReplyClient) -> AppState {
        AppState {
            config: AppConfig::for_tests(SECRET),
            line_client: Box::new(mock_client),
        }
    }

    fn signed_post(body: &str, secret: &str) -> test::TestRequest {
        let signature = security::compute_signature(body.as_bytes(), secret).unwrap();
        test::TestRequest::post()
            .uri("/webhook")
            .header(consts::LINE_SIGNATURE_HEADER, signature)
            .set_payload(body.to_string())
    }

    fn text_event(reply_token: &str, text: &str) -> serde_json::Value {
        json!({
            "type": "message",
            "replyToken": reply_token,
            "source": {"type": "user", "userId": "U42"},
            "message": {"id": "1", "type": "text", "text": text}
        })
    }

    #[ntex::test]
    async fn test_get_returns_health_body() {
        let app = test::init_service(
            web::App::new()
                .state(app_state(MockReplyClient::new()))
                .configure(routes::line),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/webhook")
            .header(consts::LINE_SIGNATURE_HEADER, "garbage")
            .set_payload("not json")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            test::read_body(resp).await,
            Bytes::from_static(consts::HEALTH_BODY.as_bytes())
        );
    }

    #[ntex::test]
    async fn test_other_methods_not_allowed() {
        let app = test::init_service(
            web::App::new()
                .state(app_state(MockReplyClient::new()))
                .configure(routes::line),
        )
        .await;

        for method in [Method::PUT, Method::DELETE, Method::PATCH] {
            let req = test::TestRequest::default()
                .method(method)
                .uri("/webhook")
                .to_request();
            let resp = test::call_service(&app, req).await;

            assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        }
    }

    #[ntex::test]
    async fn test_post_empty_events_makes_no_calls() {
        let app = test::init_service(
            web::App::new()
                .state(app_state(MockReplyClient::new()))
                .configure(routes::line),
        )
        .await;

        let req = signed_post(r#"{"destination":"U0","events":[]}"#, SECRET).to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            test::read_body(resp).await,
            Bytes::from_static(consts::ACK_BODY.as_bytes())
        );
    }

    #[ntex::test]
    async fn test_post_wrong_signature_is_unauthorized() {
        let app = test::init_service(
            web::App::new()
                .state(app_state(MockReplyClient::new()))
                .configure(routes::line),
        )
        .await;

        let body = json!({"events": [text_event("t", "hi")]}).to_string();
        let req = signed_post(&body, "another-secret").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[ntex::test]
    async fn test_post_missing_signature_is_unauthorized_before_parsing() {
        let app = test::init_service(
            web::App::new()
                .state(app_state(MockReplyClient::new()))
                .configure(routes::line),
        )
        .await;

        // an unparsable body still answers 401, not 400
        let req = test::TestRequest::post()
            .uri("/webhook")
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[ntex::test]
    async fn test_post_empty_secret_is_unauthorized() {
        let mut state = app_state(MockReplyClient::new());
        state.config.line_channel_secret = String::new();
        let app = test::init_service(web::App::new().state(state).configure(routes::line)).await;

        let req = signed_post(r#"{"events":[]}"#, "").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[ntex::test]
    async fn test_post_invalid_json_is_bad_request() {
        let app = test::init_service(
            web::App::new()
                .state(app_state(MockReplyClient::new()))
                .configure(routes::line),
        )
        .await;

        let req = signed_post("{\"events\": [", SECRET).to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[ntex::test]
    async fn test_post_text_message_replies_once() {
        let mut mock_client = MockReplyClient::new();
        mock_client
            .expect_reply_text()
            .with(eq("reply-token"), eq("你說了：「早安」\n（部署成功 🎉）"))
            .times(1)
            .returning(|_, _| Ok(()));
        let app = test::init_service(
            web::App::new()
                .state(app_state(mock_client))
                .configure(routes::line),
        )
        .await;

        let body = json!({"events": [text_event("reply-token", "早安")]}).to_string();
        let resp = test::call_service(&app, signed_post(&body, SECRET).to_request()).await;

        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[ntex::test]
    async fn test_post_first_reply_failure_still_ok() {
        let mut mock_client = MockReplyClient::new();
        mock_client
            .expect_reply_text()
            .with(eq("first"), always())
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("LINE reply API returned error status 400")));
        mock_client
            .expect_reply_text()
            .with(eq("second"), always())
            .times(1)
            .returning(|_, _| Ok(()));
        let app = test::init_service(
            web::App::new()
                .state(app_state(mock_client))
                .configure(routes::line),
        )
        .await;

        let body = json!({"events": [text_event("first", "a"), text_event("second", "b")]})
            .to_string();
        let resp = test::call_service(&app, signed_post(&body, SECRET).to_request()).await;

        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[ntex::test]
    async fn test_post_follow_event_makes_no_calls() {
        let app = test::init_service(
            web::App::new()
                .state(app_state(MockReplyClient::new()))
                .configure(routes::line),
        )
        .await;

        let body = json!({"events": [{
            "type": "follow",
            "replyToken": "follow-token",
            "source": {"type": "user", "userId": "U42"}
        }]})
        .to_string();
        let resp = test::call_service(&app, signed_post(&body, SECRET).to_request()).await;

        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[ntex::test]
    async fn test_post_body_over_limit_is_rejected() {
        let mut state = app_state(MockReplyClient::new());
        state.config.webhook_max_body_bytes = 16;
        let app = test::init_service(web::App::new().state(state).configure(routes::line)).await;

        let body = json!({"events": [text_event("reply-token", "a long enough text")]}).to_string();
        let resp = test::call_service(&app, signed_post(&body, SECRET).to_request()).await;

        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[ntex::test]
    async fn test_post_body_over_limit_without_signature_is_rejected_first() {
        let mut state = app_state(MockReplyClient::new());
        state.config.webhook_max_body_bytes = 8;
        let app = test::init_service(web::App::new().state(state).configure(routes::line)).await;

        let req = test::TestRequest::post()
            .uri("/webhook")
            .set_payload("{\"events\": [], \"padding\": true}")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[ntex::test]
    async fn test_post_body_at_limit_is_accepted() {
        let body = r#"{"events":[]}"#;
        let mut state = app_state(MockReplyClient::new());
        state.config.webhook_max_body_bytes = body.len();
        let app = test::init_service(web::App::new().state(state).configure(routes::line)).await;

        let resp = test::call_service(&app, signed_post(body, SECRET).to_request()).await;

        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[ntex::test]
    async fn test_post_valid_json_without_event_list_is_ok() {
        let app = test::init_service(
            web::App::new()
                .state(app_state(MockReplyClient::new()))
                .configure(routes::line),
        )
        .await;

        for body in [r#"{"events":null}"#, r#""hello""#, "42", r#"{"events":"x"}"#] {
            let resp = test::call_service(&app, signed_post(body, SECRET).to_request()).await;

            assert_eq!(resp.status(), StatusCode::OK, "body: {body}");
            assert_eq!(
                test::read_body(resp).await,
                Bytes::from_static(consts::ACK_BODY.as_bytes())
            );
        }
    }

    #[ntex::test]
    async fn test_post_non_string_destination_still_replies() {
        let mut mock_client = MockReplyClient::new();
        mock_client
            .expect_reply_text()
            .with(eq("reply-token"), eq("你說了：「hi」\n（部署成功 🎉）"))
            .times(1)
            .returning(|_, _| Ok(()));
        let app = test::init_service(
            web::App::new()
                .state(app_state(mock_client))
                .configure(routes::line),
        )
        .await;

        let body = json!({"destination": 123, "events": [text_event("reply-token", "hi")]})
            .to_string();
        let resp = test::call_service(&app, signed_post(&body, SECRET).to_request()).await;

        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[ntex::test]
    async fn test_post_odd_user_id_still_replies() {
        let mut mock_client = MockReplyClient::new();
        mock_client
            .expect_reply_text()
            .with(eq("reply-token"), eq("你說了：「5」\n（部署成功 🎉）"))
            .times(1)
            .returning(|_, _| Ok(()));
        let app = test::init_service(
            web::App::new()
                .state(app_state(mock_client))
                .configure(routes::line),
        )
        .await;

        let body = json!({"events": [{
            "type": "message",
            "replyToken": "reply-token",
            "source": {"type": "user", "userId": 7},
            "message": {"type": "text", "text": 5}
        }]})
        .to_string();
        let resp = test::call_service(&app, signed_post(&body, SECRET).to_request()).await;

        assert_eq!(resp.status(), StatusCode::OK);
    }
}
