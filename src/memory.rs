//! In-memory collaborators that record how they were called.
//!
//! These back the crate's own tests and are handy for testing pages in
//! downstream crates without a real session store or template engine.
//! Nothing here performs I/O.

use std::cell::{Cell, RefCell};

use crate::request::RequestContext;
use crate::response::RenderMode;
use crate::site::{SessionService, TemplateSelector, TokenValidator};

/// A session with a fixed authentication state.
#[derive(Debug, Default)]
pub struct MemorySession {
    authenticated: bool,
    api_auth_calls: Cell<usize>,
}

impl MemorySession {
    /// A session with a logged-in user.
    pub fn authenticated() -> Self {
        Self {
            authenticated: true,
            api_auth_calls: Cell::new(0),
        }
    }

    /// A session with nobody logged in.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Returns how many times API auth was attached.
    pub fn api_auth_calls(&self) -> usize {
        self.api_auth_calls.get()
    }
}

impl SessionService for MemorySession {
    fn attach_api_auth(&self, _request: &RequestContext) {
        self.api_auth_calls.set(self.api_auth_calls.get() + 1);
    }

    fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

/// One recorded call to [`TokenValidator::is_valid_token`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCheck {
    /// Request the token was checked for
    pub request_id: String,
    /// Token name passed by the caller
    pub name: String,
    /// Strict flag passed by the caller
    pub strict: bool,
}

/// A token validator that gives the same answer for every request.
#[derive(Debug)]
pub struct MemoryTokens {
    valid: bool,
    checks: RefCell<Vec<TokenCheck>>,
}

impl MemoryTokens {
    /// Accepts every token.
    pub fn accepting() -> Self {
        Self {
            valid: true,
            checks: RefCell::new(Vec::new()),
        }
    }

    /// Rejects every token.
    pub fn rejecting() -> Self {
        Self {
            valid: false,
            checks: RefCell::new(Vec::new()),
        }
    }

    /// Returns a snapshot of all recorded checks.
    pub fn checks(&self) -> Vec<TokenCheck> {
        self.checks.borrow().clone()
    }
}

impl TokenValidator for MemoryTokens {
    fn is_valid_token(&self, request: &RequestContext, name: &str, strict: bool) -> bool {
        self.checks.borrow_mut().push(TokenCheck {
            request_id: request.request_id().to_string(),
            name: name.to_string(),
            strict,
        });
        self.valid
    }
}

/// A template selector that remembers every mode it was switched to.
#[derive(Debug, Default)]
pub struct MemoryTemplates {
    modes: RefCell<Vec<RenderMode>>,
}

impl MemoryTemplates {
    /// Creates a selector with no recorded switches.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the most recent mode, if any switch happened.
    pub fn last_mode(&self) -> Option<RenderMode> {
        self.modes.borrow().last().copied()
    }

    /// Returns all recorded switches in order.
    pub fn modes(&self) -> Vec<RenderMode> {
        self.modes.borrow().clone()
    }
}

impl TemplateSelector for MemoryTemplates {
    fn set_render_mode(&self, mode: RenderMode) {
        self.modes.borrow_mut().push(mode);
    }
}
