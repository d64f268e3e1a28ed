//! Webhook endpoint handlers.
//!
//! One request goes through a single pass:
//! 1. Check it is a GitLab event and the body length matches
//! 2. Authenticate against the shared secret
//! 3. Decode the payload and filter it against the interest set
//! 4. Render a report and hand it to the sink
//!
//! Every handled or ignored request gets `204 No Content`. Only bad
//! authentication (401) and malformed input (400) are answered differently.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_LENGTH, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::error::{RelayError, RenderError};
use crate::event::WebhookEvent;
use crate::filter::is_interesting;
use crate::report::render;
use crate::sink::{OutboundMessage, Sink};
use crate::web::signature::authenticate;
use crate::Config;

/// Header GitLab sets on every hook delivery, e.g. `Issue Hook`.
pub const EVENT_HEADER: &str = "X-Gitlab-Event";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sink: Arc<dyn Sink>,
}

impl AppState {
    pub fn new(config: Config, sink: Arc<dyn Sink>) -> Self {
        Self {
            config: Arc::new(config),
            sink,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// GitLab Webhook
// =============================================================================

/// GitLab webhook endpoint.
pub async fn gitlab_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match ingest(&state, &headers, &body).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

/// Run one request through the pipeline.
///
/// `Ok` means a report was delivered. Every early exit is a [`RelayError`]
/// that has already been logged at the point it occurred.
pub async fn ingest(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<(), RelayError> {
    let config = &state.config;

    let Some(hook) = headers.get(EVENT_HEADER) else {
        info!("non_gitlab_request_ignored");
        return Err(RelayError::NotAWebhookEvent);
    };

    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<usize>().ok());

    match declared {
        Some(length) if length == body.len() => {}
        Some(length) => {
            warn!(declared = length, received = body.len(), "webhook_body_length_mismatch");
            return Err(RelayError::MalformedPayload(format!(
                "expected {} bytes, received {}",
                length,
                body.len()
            )));
        }
        None => {
            warn!("webhook_content_length_missing");
            return Err(RelayError::MalformedPayload(
                "missing or invalid Content-Length".to_string(),
            ));
        }
    }

    if !authenticate(headers, &config.secret, config.signature_mode, body) {
        warn!(hook = ?hook, "webhook_authentication_failed");
        return Err(RelayError::AuthenticationFailed);
    }

    // TODO: honour the charset parameter of Content-Type instead of assuming UTF-8.
    let event = WebhookEvent::decode(body).map_err(|e| {
        warn!(error = %e, "webhook_payload_malformed");
        RelayError::MalformedPayload(e.to_string())
    })?;

    let kind = event.kind();
    let action = event.action();

    debug!(kind = kind, action = action, "webhook_event_received");

    if !is_interesting(kind, action, &config.events) {
        debug!(kind = kind, action = action, "webhook_event_uninteresting");
        return Err(RelayError::UninterestingEvent {
            kind: kind.to_string(),
            action: action.to_string(),
        });
    }

    let report = match render(&event) {
        Ok(Some(report)) => report,
        Ok(None) | Err(RenderError::NoRenderer { .. }) => {
            warn!(kind = kind, action = action, "report_template_missing");
            return Err(RelayError::UnrenderableEvent {
                kind: kind.to_string(),
                action: action.to_string(),
            });
        }
        Err(e @ RenderError::MissingField(_)) => {
            warn!(kind = kind, action = action, error = %e, "webhook_payload_malformed");
            return Err(RelayError::MalformedPayload(e.to_string()));
        }
    };

    let message = OutboundMessage::new(report, &config.destinations);

    debug!(destinations = ?message.destinations, "report_dispatching");

    match timeout(config.sink_timeout(), state.sink.send(&message)).await {
        Ok(Ok(())) => {
            info!(kind = kind, action = action, "report_dispatched");
            Ok(())
        }
        Ok(Err(e)) => {
            error!(kind = kind, action = action, error = %e, "report_dispatch_failed");
            Err(RelayError::SinkDeliveryFailure(e.to_string()))
        }
        Err(_) => {
            error!(
                kind = kind,
                action = action,
                timeout_ms = config.sink_timeout_ms,
                "report_dispatch_timeout"
            );
            Err(RelayError::SinkDeliveryFailure("timed out".to_string()))
        }
    }
}
