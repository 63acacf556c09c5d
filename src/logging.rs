//! Tracing setup for page dispatch.
//!
//! Every dispatch runs inside a `page` span carrying the request id and
//! method, so events from hooks and collaborators are tied to their
//! request without passing ids around by hand.

use tracing_subscriber::EnvFilter;

use crate::request::RequestContext;

/// Initialize tracing/logging for the process.
///
/// Filters come from `RUST_LOG`, defaulting to `info`.
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Creates the span a single dispatch runs in.
pub fn request_span(request: &RequestContext) -> tracing::Span {
    tracing::info_span!(
        "page",
        request_id = %request.request_id(),
        method = %request.method(),
    )
}
