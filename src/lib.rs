//! Request dispatch for CMS page controllers.
//!
//! This crate standardizes how a page receives one HTTP request and hands
//! it to page-specific code:
//! - **Per-verb hooks**: implement [`Page`] and override the verbs you serve
//! - **JSON payloads**: a `json` form field and a raw JSON body are merged
//!   into one mapping, form input first
//! - **Forwarding**: [`PageCtx::forward`] ends the request with a redirect,
//!   expressed as a [`Flow`] value rather than an abrupt exit
//! - **Explicit context**: sessions, tokens, templates and configuration are
//!   borrowed collaborators in a [`Site`], and the outgoing [`Response`] is
//!   passed in by the caller
//!
//! # Core Types
//!
//! - [`PageController`]: GET/POST/PUT/DELETE entry points and their XHR variants
//! - [`Page`]: the hooks pages override
//! - [`PageCtx`]: per-request helpers (`data`, `get_input`, `set_response`,
//!   `gatekeeper`, `forward`)
//! - [`Outcome`]: what a dispatch did, including skipped hooks and payload errors
//!
//! # Examples
//!
//! ```
//! use page_core::memory::{MemorySession, MemoryTemplates, MemoryTokens};
//! use page_core::{
//!     Flow, HttpMethod, Page, PageController, PageCtx, RequestContext, Response, Site,
//!     SiteConfig,
//! };
//!
//! struct Dashboard;
//!
//! impl Page for Dashboard {
//!     fn handle_get(&mut self, ctx: &mut PageCtx<'_>) -> Flow {
//!         ctx.gatekeeper()?;
//!         Flow::Continue(())
//!     }
//! }
//!
//! let (session, tokens, templates) =
//!     (MemorySession::anonymous(), MemoryTokens::accepting(), MemoryTemplates::new());
//! let config = SiteConfig::with_url("https://example.com/");
//! let controller = PageController::new(Site::new(&session, &tokens, &templates, &config));
//!
//! let request = RequestContext::new("req-1".to_string(), HttpMethod::Get);
//! let mut response = Response::new();
//! let outcome = controller.dispatch(&mut Dashboard, request, &mut response);
//!
//! // Anonymous visitors are sent to the front page
//! assert_eq!(outcome.pending_status, 401);
//! assert_eq!(response.location(), Some("https://example.com/"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod controller;
mod error;
mod input;
pub mod logging;
pub mod memory;
mod page;
pub mod payload;
mod request;
mod response;
mod site;

pub use config::SiteConfig;
pub use controller::{HandlerOutcome, Outcome, PageController, FALLBACK_LOCATION};
pub use error::{Error, PayloadError, Violation, ViolationKind};
pub use input::Input;
pub use page::{Page, PageCtx};
pub use payload::{Payload, PayloadReport, SourceOutcome};
pub use request::{HttpMethod, RequestContext};
pub use response::{final_code, Flow, Redirect, RenderMode, Response, DEFAULT_STATUS};
pub use site::{SessionService, Site, TemplateSelector, TokenValidator};
