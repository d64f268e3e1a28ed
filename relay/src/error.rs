//! Per-request error taxonomy and its HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Every way processing of a single webhook request can end early.
///
/// None of these are fatal to the process.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("request is not a GitLab webhook event")]
    NotAWebhookEvent,

    #[error("webhook authentication failed")]
    AuthenticationFailed,

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("event {kind} {action} is not in the interest set")]
    UninterestingEvent { kind: String, action: String },

    #[error("no report template for {kind} {action}")]
    UnrenderableEvent { kind: String, action: String },

    #[error("sink delivery failed: {0}")]
    SinkDeliveryFailure(String),
}

impl RelayError {
    /// Status returned to the webhook caller.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::AuthenticationFailed => StatusCode::UNAUTHORIZED,
            RelayError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            RelayError::NotAWebhookEvent
            | RelayError::UninterestingEvent { .. }
            | RelayError::UnrenderableEvent { .. }
            | RelayError::SinkDeliveryFailure(_) => StatusCode::NO_CONTENT,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        self.status().into_response()
    }
}

/// Why the renderer could not produce a report.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("no renderer for event kind {kind}")]
    NoRenderer { kind: String },

    #[error("required field {0} is missing")]
    MissingField(&'static str),
}
