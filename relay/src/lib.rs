//! GitLab relay - turns GitLab webhooks into chat reports.
//!
//! ## Architecture
//!
//! ```text
//! GitLab → Web Server → authenticate → decode → filter → render → Sink
//! ```
//!
//! The handler is stateless across requests: it only reads the immutable
//! [`Config`] and the request's own bytes.

pub mod config;
pub mod error;
pub mod event;
pub mod filter;
pub mod report;
pub mod sink;
pub mod web;

// Re-export commonly used types
pub use config::{Config, SignatureMode, SinkKind};
pub use error::{RelayError, RenderError};
pub use event::WebhookEvent;
pub use filter::{is_interesting, InterestConfig};
pub use report::{render, Report};
pub use sink::{build_sink, OutboundMessage, Sink};
pub use web::{AppState, RelayServer};
