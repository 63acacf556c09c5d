//! Response-side state shared between the controller and its hooks.

use std::ops::ControlFlow;

/// Status every response starts with.
pub const DEFAULT_STATUS: u16 = 200;

/// Status written alongside a `Location` header when none was chosen.
pub const REDIRECT_STATUS: u16 = 302;

/// How the template layer should render the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Regular HTML pages
    #[default]
    Default,
    /// JSON for XHR and API callers
    StructuredData,
}

/// A redirect emitted by [`PageCtx::forward`](crate::PageCtx::forward).
///
/// Returning one up the call chain ends the dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    location: String,
}

impl Redirect {
    pub(crate) fn new(location: String) -> Self {
        Self { location }
    }

    /// Returns the redirect target.
    pub fn location(&self) -> &str {
        &self.location
    }
}

/// Control flow for hooks and helpers.
///
/// `Continue(())` carries on with the dispatch; `Break(redirect)` stops it.
/// Use `?` to propagate a redirect out of a hook.
pub type Flow = ControlFlow<Redirect>;

/// The outgoing response as seen by the transport layer.
///
/// Outer layers may change the status before or after the page runs. The
/// page's own pending status is folded in at the end with [`final_code`].
///
/// # Examples
///
/// ```
/// use page_core::Response;
///
/// let mut response = Response::new();
/// assert_eq!(response.status(), 200);
///
/// response.redirect("/login");
/// assert_eq!(response.status(), 302);
/// assert_eq!(response.location(), Some("/login"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    location: Option<String>,
}

impl Response {
    /// Creates a response with status 200 and no redirect.
    pub fn new() -> Self {
        Self {
            status: DEFAULT_STATUS,
            location: None,
        }
    }

    /// Returns the current status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Overwrites the status code.
    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    /// Returns the redirect target, if one was written.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Writes a `Location` header.
    ///
    /// The status becomes 302 unless it is already 201 or a 3xx code.
    pub fn redirect(&mut self, location: &str) {
        self.location = Some(location.to_string());
        if self.status != 201 && !(300..400).contains(&self.status) {
            self.status = REDIRECT_STATUS;
        }
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

/// Reconciles the page's pending status with the ambient one.
///
/// An ambient status still at 200 is kept. Once an outer layer has moved
/// it away from 200, the page's pending status replaces it.
pub fn final_code(pending: u16, ambient: u16) -> u16 {
    if ambient != DEFAULT_STATUS {
        pending
    } else {
        ambient
    }
}
