//! Site configuration consumed by page dispatch.
//!
//! Values come from a TOML document; every field has a default, so an
//! empty file is a valid configuration.
//!
//! ```toml
//! url = "https://example.com/"
//! token_name = ""
//! strict_tokens = false
//! payload_field = "json"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Site-wide settings read by [`PageCtx`](crate::PageCtx) and
/// [`PageController`](crate::PageController).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Base URL of the site; the default forward target.
    #[serde(default = "default_url")]
    pub url: String,

    /// Token name passed to the token validator on mutating requests.
    #[serde(default)]
    pub token_name: String,

    /// Whether token validation runs in strict mode.
    #[serde(default)]
    pub strict_tokens: bool,

    /// Form field that may carry a JSON payload.
    #[serde(default = "default_payload_field")]
    pub payload_field: String,
}

fn default_url() -> String {
    "/".to_string()
}

fn default_payload_field() -> String {
    "json".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            token_name: String::new(),
            strict_tokens: false,
            payload_field: default_payload_field(),
        }
    }
}

impl SiteConfig {
    /// Creates a configuration with the given base URL and defaults elsewhere.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Toml`] if the text is not valid TOML or a field
    /// has the wrong type.
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and [`Error::Toml`]
    /// if it cannot be parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), url = %config.url, "loaded site config");
        Ok(config)
    }

    /// Returns the URL to forward to when no location is given.
    pub fn default_url(&self) -> &str {
        &self.url
    }
}
