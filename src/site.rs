//! Collaborator traits for the services a page relies on.
//!
//! Sessions, anti-forgery tokens and template selection are owned by the
//! surrounding framework. This module only defines the calls page dispatch
//! makes into them. Implementations receive the request explicitly; there
//! is no ambient "current request".
//!
//! See [`memory`](crate::memory) for in-memory implementations.

use crate::config::SiteConfig;
use crate::request::RequestContext;
use crate::response::RenderMode;

/// Session and authentication state for the current request.
pub trait SessionService {
    /// Attaches auth context derived from API credentials on the request.
    ///
    /// Called before every hook runs. Implementations that see no API
    /// credentials should leave the session as it is.
    fn attach_api_auth(&self, request: &RequestContext);

    /// Returns `true` if the session has an authenticated user.
    fn is_authenticated(&self) -> bool;
}

/// Anti-forgery token checks for state-changing requests.
pub trait TokenValidator {
    /// Returns `true` if `request` carries a valid token.
    ///
    /// `name` scopes the token to an action; an empty name accepts any
    /// site-wide token. `strict` asks for exact action matching.
    fn is_valid_token(&self, request: &RequestContext, name: &str, strict: bool) -> bool;
}

/// Selects how the template layer renders the page.
pub trait TemplateSelector {
    /// Switches the render mode for the rest of the request.
    fn set_render_mode(&self, mode: RenderMode);
}

/// The collaborators and configuration a dispatch runs against.
///
/// `Site` only borrows its parts, so one set of services can back many
/// dispatches and tests can inspect their doubles afterwards.
#[derive(Clone, Copy)]
pub struct Site<'a> {
    session: &'a dyn SessionService,
    tokens: &'a dyn TokenValidator,
    templates: &'a dyn TemplateSelector,
    config: &'a SiteConfig,
}

impl<'a> Site<'a> {
    /// Bundles the site's collaborators.
    pub fn new(
        session: &'a dyn SessionService,
        tokens: &'a dyn TokenValidator,
        templates: &'a dyn TemplateSelector,
        config: &'a SiteConfig,
    ) -> Self {
        Self {
            session,
            tokens,
            templates,
            config,
        }
    }

    /// Returns the session service.
    pub fn session(&self) -> &'a dyn SessionService {
        self.session
    }

    /// Returns the token validator.
    pub fn tokens(&self) -> &'a dyn TokenValidator {
        self.tokens
    }

    /// Returns the template selector.
    pub fn templates(&self) -> &'a dyn TemplateSelector {
        self.templates
    }

    /// Returns the site configuration.
    pub fn config(&self) -> &'a SiteConfig {
        self.config
    }
}

impl std::fmt::Debug for Site<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Site")
            .field("config", self.config)
            .finish_non_exhaustive()
    }
}
