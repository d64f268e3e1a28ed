//! Web server module for receiving GitLab webhooks.
//!
//! This module provides:
//! - The ingestion handler that authenticates, filters, renders and dispatches
//! - Shared-secret and HMAC signature checks
//! - The listener lifecycle (start, graceful stop)

pub mod handlers;
pub mod server;
pub mod signature;

pub use handlers::{gitlab_webhook, health, ingest, AppState, HealthResponse, EVENT_HEADER};
pub use server::{router, RelayServer};
pub use signature::{authenticate, is_auth_enabled, verify_hmac_sha256};
