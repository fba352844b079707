use derive_more::{Display, Error};
use ntex::{http, web};

/// Request-level failures, returned to the caller before any event is handled.
#[derive(Debug, Display, Error)]
pub enum WebhookError {
    #[display("Method Not Allowed")]
    MethodNotAllowed,
    #[display("Invalid signature")]
    Unauthorized,
    #[display("Bad Request")]
    BadRequest(#[error(not(source))] String),
    #[display("Payload Too Large")]
    PayloadTooLarge,
}

impl web::error::WebResponseError for WebhookError {
    fn error_response(&self, _: &web::HttpRequest) -> web::HttpResponse {
        logfire::warn!(
            "webhook request rejected: {error}",
            error = format!("{:?}", self)
        );

        web::HttpResponse::build(self.status_code())
            .set_header("content-type", "text/plain; charset=utf-8")
            .body(self.to_string())
    }

    fn status_code(&self) -> http::StatusCode {
        match *self {
            WebhookError::MethodNotAllowed => http::StatusCode::METHOD_NOT_ALLOWED,
            WebhookError::Unauthorized => http::StatusCode::UNAUTHORIZED,
            WebhookError::BadRequest(_) => http::StatusCode::BAD_REQUEST,
            WebhookError::PayloadTooLarge => http::StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}
