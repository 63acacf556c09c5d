//! The page extension point and the per-request context hooks work with.

use crate::input::Input;
use crate::payload::{Payload, PayloadReport, SourceOutcome};
use crate::request::RequestContext;
use crate::response::{final_code, Flow, Redirect, Response, DEFAULT_STATUS};
use crate::site::Site;

/// A page that handles requests for one route.
///
/// Every hook defaults to doing nothing. Override the verbs the page
/// supports. Hooks return [`Flow`]: `Flow::Continue(())` hands control back
/// to the controller, and a redirect from [`PageCtx::forward`] or
/// [`PageCtx::gatekeeper`] can be propagated with `?` to end the request.
///
/// # Examples
///
/// ```
/// use page_core::{Flow, Page, PageCtx};
///
/// struct Profile;
///
/// impl Page for Profile {
///     fn handle_get(&mut self, ctx: &mut PageCtx<'_>) -> Flow {
///         ctx.gatekeeper()?;
///         ctx.data_mut().insert("section".to_string(), "profile".into());
///         Flow::Continue(())
///     }
/// }
/// ```
pub trait Page {
    /// Handles a GET request.
    fn handle_get(&mut self, _ctx: &mut PageCtx<'_>) -> Flow {
        Flow::Continue(())
    }

    /// Handles a POST request that carried a valid token.
    fn handle_post(&mut self, _ctx: &mut PageCtx<'_>) -> Flow {
        Flow::Continue(())
    }

    /// Handles a PUT request that carried a valid token.
    fn handle_put(&mut self, _ctx: &mut PageCtx<'_>) -> Flow {
        Flow::Continue(())
    }

    /// Handles a DELETE request that carried a valid token.
    fn handle_delete(&mut self, _ctx: &mut PageCtx<'_>) -> Flow {
        Flow::Continue(())
    }
}

/// Per-request state available to page hooks.
///
/// Owns the request for the duration of the dispatch, borrows the outgoing
/// [`Response`] and the [`Site`] collaborators, and tracks the page's
/// pending status code and forward directive.
#[derive(Debug)]
pub struct PageCtx<'a> {
    request: RequestContext,
    response: &'a mut Response,
    site: Site<'a>,
    pending_status: u16,
    forward: bool,
}

impl<'a> PageCtx<'a> {
    /// Creates a context with status 200 pending and forwarding enabled.
    pub fn new(request: RequestContext, response: &'a mut Response, site: Site<'a>) -> Self {
        Self {
            request,
            response,
            site,
            pending_status: DEFAULT_STATUS,
            forward: true,
        }
    }

    /// Returns the request being handled.
    pub fn request(&self) -> &RequestContext {
        &self.request
    }

    /// Returns the site collaborators.
    pub fn site(&self) -> Site<'a> {
        self.site
    }

    /// Returns the outgoing response.
    pub fn response(&self) -> &Response {
        &*self.response
    }

    /// Returns the outgoing response for direct edits.
    pub fn response_mut(&mut self) -> &mut Response {
        &mut *self.response
    }

    /// Returns the status code the page wants to send.
    pub fn pending_status(&self) -> u16 {
        self.pending_status
    }

    /// Sets the status code the page wants to send.
    ///
    /// Nothing is written to the response until the controller reconciles
    /// it after the hook returns; see [`final_code`](crate::final_code).
    pub fn set_response(&mut self, code: u16) {
        self.pending_status = code;
    }

    /// Sets the forward directive for the whole dispatch.
    pub(crate) fn with_forward(mut self, forward: bool) -> Self {
        self.forward = forward;
        self
    }

    /// Returns whether [`forward`](Self::forward) emits redirects.
    ///
    /// The directive is chosen by the entry point and hooks cannot change it:
    ///
    /// ```compile_fail
    /// # use page_core::PageCtx;
    /// fn reenable(ctx: &mut PageCtx<'_>) {
    ///     ctx.set_forward(true);
    /// }
    /// ```
    pub fn forward_enabled(&self) -> bool {
        self.forward
    }

    /// Redirects to `location` and ends the request, if forwarding is on.
    ///
    /// An empty `location` means the site's base URL. With forwarding off
    /// this does nothing and returns `Flow::Continue(())`.
    ///
    /// # Examples
    ///
    /// ```
    /// use page_core::memory::{MemorySession, MemoryTemplates, MemoryTokens};
    /// use page_core::{HttpMethod, PageCtx, RequestContext, Response, Site, SiteConfig};
    /// use std::ops::ControlFlow;
    ///
    /// let (session, tokens, templates) =
    ///     (MemorySession::anonymous(), MemoryTokens::accepting(), MemoryTemplates::new());
    /// let config = SiteConfig::with_url("https://example.com/");
    /// let site = Site::new(&session, &tokens, &templates, &config);
    ///
    /// let mut response = Response::new();
    /// let request = RequestContext::new("req-1".to_string(), HttpMethod::Post);
    /// let mut ctx = PageCtx::new(request, &mut response, site);
    ///
    /// match ctx.forward("/foo") {
    ///     ControlFlow::Break(redirect) => assert_eq!(redirect.location(), "/foo"),
    ///     ControlFlow::Continue(()) => unreachable!("forwarding is on by default"),
    /// }
    /// ```
    pub fn forward(&mut self, location: &str) -> Flow {
        let location = if location.is_empty() {
            self.site.config().default_url()
        } else {
            location
        };

        if !self.forward {
            tracing::debug!(location, "forwarding disabled, staying on page");
            return Flow::Continue(());
        }

        tracing::info!(location, "forwarding");
        self.response.redirect(location);
        Flow::Break(Redirect::new(location.to_string()))
    }

    /// Rejects requests without an authenticated session.
    ///
    /// Sets the pending status to 401 and forwards to the site's base URL.
    pub fn gatekeeper(&mut self) -> Flow {
        if self.site.session().is_authenticated() {
            return Flow::Continue(());
        }

        tracing::info!("unauthenticated request rejected by gatekeeper");
        self.set_response(401);
        self.forward("")
    }

    /// Returns the parsed payload mapping.
    pub fn data(&self) -> &Payload {
        self.request.payload()
    }

    /// Returns the parsed payload mapping for in-place edits.
    pub fn data_mut(&mut self) -> &mut Payload {
        self.request.payload_mut()
    }

    /// Merges JSON from the payload form field and the request body.
    ///
    /// Keys already in the mapping are kept. Sources that fail to parse are
    /// skipped; the report says which ones.
    pub fn parse_json_payload(&mut self) -> PayloadReport {
        let field = self.site.config().payload_field.as_str();
        let report = self.request.parse_json_payload(field);

        if let SourceOutcome::Rejected(err) = &report.form {
            tracing::debug!(field, error = %err, "ignoring JSON form field");
        }
        if let SourceOutcome::Rejected(err) = &report.body {
            tracing::debug!(error = %err, "ignoring JSON request body");
        }
        report
    }

    /// Looks up a named input.
    ///
    /// A non-empty request parameter wins over the payload. Payload values
    /// are returned unless they are JSON `null`. `filter` is reserved for
    /// input sanitising and currently changes nothing.
    pub fn get_input(&self, name: &str, filter: bool) -> Option<Input<'_>> {
        if name.is_empty() {
            return None;
        }
        if filter {
            tracing::trace!(name, "input filtering requested; no filter is applied");
        }

        if let Some(value) = self.request.param(name).filter(|v| !v.is_empty()) {
            return Some(Input::Param(value));
        }

        self.request
            .payload()
            .get(name)
            .filter(|v| !v.is_null())
            .map(Input::Payload)
    }

    /// Folds the pending status into the response.
    pub(crate) fn reconcile(&mut self) {
        let ambient = self.response.status();
        let status = final_code(self.pending_status, ambient);
        if status != ambient {
            tracing::debug!(ambient, status, "status replaced by page");
        }
        self.response.set_status(status);
    }

    /// Ends the context, returning the request.
    pub(crate) fn into_request(self) -> RequestContext {
        self.request
    }
}
