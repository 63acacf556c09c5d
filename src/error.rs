use thiserror::Error;

/// Errors that can occur while configuring or routing pages.
#[derive(Debug, Error)]
pub enum Error {
    /// Site configuration file could not be read
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Site configuration is not valid TOML or has a mistyped field
    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// The request method has no page entry point
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),
}

/// A rejected request step, with details about what failed.
///
/// Violations do not abort a dispatch. They are recorded on the
/// [`Outcome`](crate::Outcome) so callers can see which work was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct Violation {
    /// The kind of violation that occurred
    pub kind: ViolationKind,
    /// Human-readable message explaining the violation
    pub message: String,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// The kind of violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ViolationKind {
    /// The anti-forgery token was missing or did not validate
    #[error("Invalid token")]
    InvalidToken,
}

/// Why a JSON payload source was not merged.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// The source was not valid JSON
    #[error("malformed JSON payload: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The source parsed, but not to a JSON object
    #[error("JSON payload is not an object")]
    NotAnObject,
}
