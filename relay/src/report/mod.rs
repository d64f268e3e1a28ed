//! Report rendering: turns a decoded event into a one-line sentence.
//!
//! ## Rendering Flow
//!
//! ```text
//! WebhookEvent → render() → Report
//! ```
//!
//! Dispatch is a match on the event variant. Kinds without a typed payload
//! have no renderer; known kinds return `Ok(None)` for actions without a
//! template.

pub mod issues;
pub mod merge_request;

use tracing::debug;

use crate::error::RenderError;
use crate::event::WebhookEvent;

pub use issues::render_issue;
pub use merge_request::render_merge_request;

/// Author tag attached to every report.
pub const REPORT_AUTHOR: &str = "system";

/// A rendered sentence ready for the outbound sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub body: String,
    pub author: &'static str,
}

impl Report {
    pub fn new(body: String) -> Self {
        Self {
            body,
            author: REPORT_AUTHOR,
        }
    }
}

/// Render a report for an event.
pub fn render(event: &WebhookEvent) -> Result<Option<Report>, RenderError> {
    let body = match event {
        WebhookEvent::Issue(issue) => render_issue(issue)?,
        WebhookEvent::MergeRequest(mr) => render_merge_request(mr)?,
        WebhookEvent::Other { kind, .. } => {
            return Err(RenderError::NoRenderer { kind: kind.clone() })
        }
    };

    debug!(
        kind = event.kind(),
        action = event.action(),
        rendered = body.is_some(),
        "report_render_complete"
    );

    Ok(body.map(Report::new))
}
