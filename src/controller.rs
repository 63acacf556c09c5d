//! Request dispatch: the verb entry points that drive a [`Page`].
//!
//! Each entry point follows the same lifecycle:
//!
//! ```text
//! created -> auth attached -> payload parsed -> hook run -> status reconciled
//!                                                   \
//!                                                    -> forwarded (request ends)
//! ```
//!
//! Mutating verbs (POST, PUT, DELETE) first check the anti-forgery token.
//! A request with a bad token skips the hook without an error, then still
//! attempts the closing forward to `/`. XHR entry points switch the
//! template layer to structured data first, and the mutating ones turn
//! forwarding off so API callers get a body rather than a redirect.

use crate::error::{Violation, ViolationKind};
use crate::logging;
use crate::page::{Page, PageCtx};
use crate::payload::{Payload, PayloadReport};
use crate::request::{HttpMethod, RequestContext};
use crate::response::{Flow, Redirect, RenderMode, Response};
use crate::site::Site;

/// Where mutating requests forward to once their hook has run.
pub const FALLBACK_LOCATION: &str = "/";

/// Whether the page's hook ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// The hook for the request's verb was called
    Invoked,
    /// The hook was skipped; the violation says why
    Skipped(Violation),
}

impl HandlerOutcome {
    /// Returns `true` if the hook ran.
    pub fn is_invoked(&self) -> bool {
        matches!(self, HandlerOutcome::Invoked)
    }
}

/// Everything a dispatch decided, for the transport layer and for tests.
#[derive(Debug)]
pub struct Outcome {
    /// Request ID for tracing
    pub request_id: String,
    /// Verb whose entry point handled the request
    pub method: HttpMethod,
    /// Render mode selected for the response
    pub render_mode: RenderMode,
    /// Forward directive at the end of the dispatch
    pub forward: bool,
    /// Status the page asked for via `set_response`
    pub pending_status: u16,
    /// Status left on the response
    pub status: u16,
    /// Redirect that ended the request, if any
    pub redirect: Option<Redirect>,
    /// Whether the page hook ran
    pub handler: HandlerOutcome,
    /// Payload parse results; `None` when the payload was never parsed
    pub payload: Option<PayloadReport>,
    /// Final payload mapping
    pub data: Payload,
}

impl Outcome {
    fn finish(
        ctx: PageCtx<'_>,
        method: HttpMethod,
        render_mode: RenderMode,
        handler: HandlerOutcome,
        payload: Option<PayloadReport>,
        redirect: Option<Redirect>,
    ) -> Self {
        let request_id = ctx.request().request_id().to_string();
        let forward = ctx.forward_enabled();
        let pending_status = ctx.pending_status();
        let status = ctx.response().status();
        let data = ctx.into_request().into_payload();

        tracing::debug!(
            status,
            handled = handler.is_invoked(),
            redirected = redirect.is_some(),
            "page dispatched"
        );

        Self {
            request_id,
            method,
            render_mode,
            forward,
            pending_status,
            status,
            redirect,
            handler,
            payload,
            data,
        }
    }

    /// Returns `true` if the request ended in a redirect.
    pub fn is_redirect(&self) -> bool {
        self.redirect.is_some()
    }
}

/// Drives pages through the request lifecycle against one [`Site`].
///
/// # Examples
///
/// ```
/// use page_core::memory::{MemorySession, MemoryTemplates, MemoryTokens};
/// use page_core::{
///     Flow, HttpMethod, Page, PageController, PageCtx, RequestContext, Response, Site,
///     SiteConfig,
/// };
///
/// struct Comments {
///     saved: Vec<String>,
/// }
///
/// impl Page for Comments {
///     fn handle_post(&mut self, ctx: &mut PageCtx<'_>) -> Flow {
///         if let Some(body) = ctx.get_input("body", false) {
///             self.saved.push(body.to_string());
///         }
///         ctx.set_response(201);
///         Flow::Continue(())
///     }
/// }
///
/// let (session, tokens, templates) =
///     (MemorySession::authenticated(), MemoryTokens::accepting(), MemoryTemplates::new());
/// let config = SiteConfig::default();
/// let controller = PageController::new(Site::new(&session, &tokens, &templates, &config));
///
/// let mut request = RequestContext::new("req-42".to_string(), HttpMethod::Post);
/// request.set_body(r#"{"body": "first!"}"#);
///
/// let mut page = Comments { saved: Vec::new() };
/// let mut response = Response::new();
/// let outcome = controller.post_xhr(&mut page, request, &mut response);
///
/// assert_eq!(page.saved, vec!["first!".to_string()]);
/// assert!(!outcome.is_redirect());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PageController<'a> {
    site: Site<'a>,
}

impl<'a> PageController<'a> {
    /// Creates a controller for the given site.
    pub fn new(site: Site<'a>) -> Self {
        Self { site }
    }

    /// Returns the site this controller dispatches against.
    pub fn site(&self) -> Site<'a> {
        self.site
    }

    /// Routes a request to the entry point for its method.
    ///
    /// XHR requests go to the `*_xhr` entry points. Plain POST, PUT and
    /// DELETE requests forward when done.
    pub fn dispatch<P: Page + ?Sized>(
        &self,
        page: &mut P,
        request: RequestContext,
        response: &mut Response,
    ) -> Outcome {
        match (request.method(), request.is_xhr()) {
            (HttpMethod::Get, false) => self.get(page, request, response),
            (HttpMethod::Get, true) => self.get_xhr(page, request, response),
            (HttpMethod::Post, false) => self.post(page, request, response, true),
            (HttpMethod::Post, true) => self.post_xhr(page, request, response),
            (HttpMethod::Put, false) => self.put(page, request, response, true),
            (HttpMethod::Put, true) => self.put_xhr(page, request, response),
            (HttpMethod::Delete, false) => self.delete(page, request, response, true),
            (HttpMethod::Delete, true) => self.delete_xhr(page, request, response),
        }
    }

    /// Handles a GET request.
    pub fn get<P: Page + ?Sized>(
        &self,
        page: &mut P,
        request: RequestContext,
        response: &mut Response,
    ) -> Outcome {
        self.run_get(page, request, response, RenderMode::Default)
    }

    /// Handles a POST request; `forward` controls the closing redirect.
    pub fn post<P: Page + ?Sized>(
        &self,
        page: &mut P,
        request: RequestContext,
        response: &mut Response,
        forward: bool,
    ) -> Outcome {
        self.run_mutating(
            page,
            request,
            response,
            HttpMethod::Post,
            forward,
            RenderMode::Default,
        )
    }

    /// Handles a PUT request; `forward` controls the closing redirect.
    pub fn put<P: Page + ?Sized>(
        &self,
        page: &mut P,
        request: RequestContext,
        response: &mut Response,
        forward: bool,
    ) -> Outcome {
        self.run_mutating(
            page,
            request,
            response,
            HttpMethod::Put,
            forward,
            RenderMode::Default,
        )
    }

    /// Handles a DELETE request; `forward` controls the closing redirect.
    pub fn delete<P: Page + ?Sized>(
        &self,
        page: &mut P,
        request: RequestContext,
        response: &mut Response,
        forward: bool,
    ) -> Outcome {
        self.run_mutating(
            page,
            request,
            response,
            HttpMethod::Delete,
            forward,
            RenderMode::Default,
        )
    }

    /// Handles a GET request from a script, rendering structured data.
    pub fn get_xhr<P: Page + ?Sized>(
        &self,
        page: &mut P,
        request: RequestContext,
        response: &mut Response,
    ) -> Outcome {
        self.select_structured_data();
        self.run_get(page, request, response, RenderMode::StructuredData)
    }

    /// Handles a POST request from a script. Never forwards.
    pub fn post_xhr<P: Page + ?Sized>(
        &self,
        page: &mut P,
        request: RequestContext,
        response: &mut Response,
    ) -> Outcome {
        self.select_structured_data();
        self.run_mutating(
            page,
            request,
            response,
            HttpMethod::Post,
            false,
            RenderMode::StructuredData,
        )
    }

    /// Handles a PUT request from a script. Never forwards.
    pub fn put_xhr<P: Page + ?Sized>(
        &self,
        page: &mut P,
        request: RequestContext,
        response: &mut Response,
    ) -> Outcome {
        self.select_structured_data();
        self.run_mutating(
            page,
            request,
            response,
            HttpMethod::Put,
            false,
            RenderMode::StructuredData,
        )
    }

    /// Handles a DELETE request from a script. Never forwards.
    pub fn delete_xhr<P: Page + ?Sized>(
        &self,
        page: &mut P,
        request: RequestContext,
        response: &mut Response,
    ) -> Outcome {
        self.select_structured_data();
        self.run_mutating(
            page,
            request,
            response,
            HttpMethod::Delete,
            false,
            RenderMode::StructuredData,
        )
    }

    fn select_structured_data(&self) {
        self.site
            .templates()
            .set_render_mode(RenderMode::StructuredData);
    }

    fn run_get<P: Page + ?Sized>(
        &self,
        page: &mut P,
        request: RequestContext,
        response: &mut Response,
        mode: RenderMode,
    ) -> Outcome {
        let span = logging::request_span(&request);
        let _guard = span.enter();

        let mut ctx = PageCtx::new(request, response, self.site);
        self.site.session().attach_api_auth(ctx.request());
        let report = ctx.parse_json_payload();

        if let Flow::Break(redirect) = page.handle_get(&mut ctx) {
            return Outcome::finish(
                ctx,
                HttpMethod::Get,
                mode,
                HandlerOutcome::Invoked,
                Some(report),
                Some(redirect),
            );
        }

        ctx.reconcile();
        Outcome::finish(
            ctx,
            HttpMethod::Get,
            mode,
            HandlerOutcome::Invoked,
            Some(report),
            None,
        )
    }

    fn run_mutating<P: Page + ?Sized>(
        &self,
        page: &mut P,
        request: RequestContext,
        response: &mut Response,
        method: HttpMethod,
        forward: bool,
        mode: RenderMode,
    ) -> Outcome {
        let span = logging::request_span(&request);
        let _guard = span.enter();

        let mut ctx = PageCtx::new(request, response, self.site).with_forward(forward);

        let config = self.site.config();
        let token_ok = self.site.tokens().is_valid_token(
            ctx.request(),
            &config.token_name,
            config.strict_tokens,
        );

        let (handler, report) = if token_ok {
            self.site.session().attach_api_auth(ctx.request());
            let report = ctx.parse_json_payload();

            if let Flow::Break(redirect) = invoke_hook(page, method, &mut ctx) {
                return Outcome::finish(
                    ctx,
                    method,
                    mode,
                    HandlerOutcome::Invoked,
                    Some(report),
                    Some(redirect),
                );
            }
            (HandlerOutcome::Invoked, Some(report))
        } else {
            tracing::warn!(%method, "invalid token, skipping page handler");
            let violation = Violation::new(
                ViolationKind::InvalidToken,
                format!("{} request did not carry a valid token", method),
            );
            (HandlerOutcome::Skipped(violation), None)
        };

        if let Flow::Break(redirect) = ctx.forward(FALLBACK_LOCATION) {
            return Outcome::finish(ctx, method, mode, handler, report, Some(redirect));
        }

        ctx.reconcile();
        Outcome::finish(ctx, method, mode, handler, report, None)
    }
}

fn invoke_hook<P: Page + ?Sized>(page: &mut P, method: HttpMethod, ctx: &mut PageCtx<'_>) -> Flow {
    match method {
        HttpMethod::Get => page.handle_get(ctx),
        HttpMethod::Post => page.handle_post(ctx),
        HttpMethod::Put => page.handle_put(ctx),
        HttpMethod::Delete => page.handle_delete(ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::memory::{MemorySession, MemoryTemplates, MemoryTokens};
    use serde_json::json;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<HttpMethod>,
    }

    impl Page for Recorder {
        fn handle_get(&mut self, _ctx: &mut PageCtx<'_>) -> Flow {
            self.calls.push(HttpMethod::Get);
            Flow::Continue(())
        }

        fn handle_post(&mut self, _ctx: &mut PageCtx<'_>) -> Flow {
            self.calls.push(HttpMethod::Post);
            Flow::Continue(())
        }

        fn handle_put(&mut self, _ctx: &mut PageCtx<'_>) -> Flow {
            self.calls.push(HttpMethod::Put);
            Flow::Continue(())
        }

        fn handle_delete(&mut self, _ctx: &mut PageCtx<'_>) -> Flow {
            self.calls.push(HttpMethod::Delete);
            Flow::Continue(())
        }
    }

    struct Fixture {
        session: MemorySession,
        tokens: MemoryTokens,
        templates: MemoryTemplates,
        config: SiteConfig,
    }

    impl Fixture {
        fn new(tokens: MemoryTokens) -> Self {
            Self {
                session: MemorySession::authenticated(),
                tokens,
                templates: MemoryTemplates::new(),
                config: SiteConfig::with_url("https://example.com/"),
            }
        }

        fn controller(&self) -> PageController<'_> {
            PageController::new(Site::new(
                &self.session,
                &self.tokens,
                &self.templates,
                &self.config,
            ))
        }
    }

    fn request(method: HttpMethod) -> RequestContext {
        RequestContext::new("req-ctl".to_string(), method)
    }

    #[test]
    fn get_runs_hook_and_attaches_auth() {
        let fixture = Fixture::new(MemoryTokens::rejecting());
        let mut page = Recorder::default();
        let mut response = Response::new();

        let outcome = fixture
            .controller()
            .get(&mut page, request(HttpMethod::Get), &mut response);

        assert_eq!(page.calls, vec![HttpMethod::Get]);
        assert_eq!(fixture.session.api_auth_calls(), 1);
        assert!(fixture.tokens.checks().is_empty());
        assert!(outcome.handler.is_invoked());
        assert!(!outcome.is_redirect());
        assert_eq!(outcome.status, 200);
        assert_eq!(outcome.render_mode, RenderMode::Default);
    }

    #[test]
    fn post_with_valid_token_runs_hook_then_forwards_home() {
        let fixture = Fixture::new(MemoryTokens::accepting());
        let mut page = Recorder::default();
        let mut response = Response::new();

        let outcome =
            fixture
                .controller()
                .post(&mut page, request(HttpMethod::Post), &mut response, true);

        assert_eq!(page.calls, vec![HttpMethod::Post]);
        assert_eq!(outcome.redirect.as_ref().map(Redirect::location), Some("/"));
        assert_eq!(response.location(), Some("/"));
        assert_eq!(response.status(), 302);
    }

    #[test]
    fn token_check_uses_configured_name_and_strictness() {
        let mut fixture = Fixture::new(MemoryTokens::accepting());
        fixture.config.token_name = "edit-post".to_string();
        fixture.config.strict_tokens = true;
        let mut page = Recorder::default();
        let mut response = Response::new();

        fixture
            .controller()
            .put(&mut page, request(HttpMethod::Put), &mut response, false);

        let checks = fixture.tokens.checks();
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].name, "edit-post");
        assert!(checks[0].strict);
    }

    #[test]
    fn default_token_check_is_unnamed_and_lenient() {
        let fixture = Fixture::new(MemoryTokens::accepting());
        let mut page = Recorder::default();
        let mut response = Response::new();

        fixture
            .controller()
            .delete(&mut page, request(HttpMethod::Delete), &mut response, false);

        let checks = fixture.tokens.checks();
        assert_eq!(checks[0].name, "");
        assert!(!checks[0].strict);
    }

    #[test]
    fn invalid_token_skips_hook_auth_and_payload() {
        let fixture = Fixture::new(MemoryTokens::rejecting());
        let mut page = Recorder::default();
        let mut response = Response::new();
        let mut req = request(HttpMethod::Delete);
        req.set_body(r#"{"id": 9}"#);

        let outcome = fixture
            .controller()
            .delete(&mut page, req, &mut response, false);

        assert!(page.calls.is_empty());
        assert_eq!(fixture.session.api_auth_calls(), 0);
        assert!(outcome.payload.is_none());
        assert!(outcome.data.is_empty());
        match outcome.handler {
            HandlerOutcome::Skipped(v) => assert_eq!(v.kind, ViolationKind::InvalidToken),
            HandlerOutcome::Invoked => panic!("hook should have been skipped"),
        }
    }

    #[test]
    fn xhr_entry_points_select_structured_data() {
        let fixture = Fixture::new(MemoryTokens::accepting());
        let mut page = Recorder::default();
        let controller = fixture.controller();

        let mut response = Response::new();
        let outcome = controller.get_xhr(&mut page, request(HttpMethod::Get), &mut response);
        assert_eq!(outcome.render_mode, RenderMode::StructuredData);

        let mut response = Response::new();
        let outcome = controller.put_xhr(&mut page, request(HttpMethod::Put), &mut response);
        assert_eq!(outcome.render_mode, RenderMode::StructuredData);
        assert!(!outcome.forward);
        assert!(!outcome.is_redirect());

        assert_eq!(
            fixture.templates.modes(),
            vec![RenderMode::StructuredData, RenderMode::StructuredData]
        );
    }

    #[test]
    fn xhr_mutations_never_redirect() {
        let fixture = Fixture::new(MemoryTokens::accepting());
        let mut page = Recorder::default();
        let controller = fixture.controller();

        let mut response = Response::new();
        let outcome =
            controller.delete_xhr(&mut page, request(HttpMethod::Delete), &mut response);

        assert_eq!(page.calls, vec![HttpMethod::Delete]);
        assert!(!outcome.forward);
        assert_eq!(response.location(), None);
        assert_eq!(response.status(), 200);
    }

    #[test]
    fn payload_reaches_the_outcome() {
        let fixture = Fixture::new(MemoryTokens::accepting());
        let mut page = Recorder::default();
        let mut response = Response::new();
        let mut req = request(HttpMethod::Post);
        req.add_form_param("json".to_string(), r#"{"a": 1}"#.to_string());
        req.set_body(r#"{"a": 2, "b": 3}"#);

        let outcome = fixture.controller().post_xhr(&mut page, req, &mut response);

        assert_eq!(outcome.data["a"], json!(1));
        assert_eq!(outcome.data["b"], json!(3));
        assert!(!outcome.payload.unwrap().has_rejections());
    }

    #[test]
    fn pending_status_applied_when_ambient_diverged() {
        struct NotFound;
        impl Page for NotFound {
            fn handle_get(&mut self, ctx: &mut PageCtx<'_>) -> Flow {
                ctx.set_response(404);
                Flow::Continue(())
            }
        }

        let fixture = Fixture::new(MemoryTokens::accepting());
        let mut response = Response::new();
        response.set_status(500);

        let outcome = fixture
            .controller()
            .get(&mut NotFound, request(HttpMethod::Get), &mut response);

        assert_eq!(outcome.pending_status, 404);
        assert_eq!(outcome.status, 404);
        assert_eq!(response.status(), 404);
    }

    #[test]
    fn dispatch_routes_by_method_and_xhr() {
        let fixture = Fixture::new(MemoryTokens::accepting());
        let controller = fixture.controller();
        let mut page = Recorder::default();

        let mut response = Response::new();
        let outcome = controller.dispatch(&mut page, request(HttpMethod::Put), &mut response);
        assert_eq!(outcome.method, HttpMethod::Put);
        assert!(outcome.is_redirect());

        let mut xhr = request(HttpMethod::Post);
        xhr.add_header("X-Requested-With".to_string(), "XMLHttpRequest".to_string());
        let mut response = Response::new();
        let outcome = controller.dispatch(&mut page, xhr, &mut response);
        assert_eq!(outcome.method, HttpMethod::Post);
        assert_eq!(outcome.render_mode, RenderMode::StructuredData);
        assert!(!outcome.is_redirect());

        assert_eq!(page.calls, vec![HttpMethod::Put, HttpMethod::Post]);
    }

    #[test]
    fn dispatch_accepts_trait_objects() {
        let fixture = Fixture::new(MemoryTokens::accepting());
        let mut recorder = Recorder::default();
        let page: &mut dyn Page = &mut recorder;
        let mut response = Response::new();

        let outcome = fixture
            .controller()
            .dispatch(page, request(HttpMethod::Get), &mut response);

        assert!(outcome.handler.is_invoked());
        assert_eq!(recorder.calls, vec![HttpMethod::Get]);
    }
}
