use std::fmt;

use serde_json::Value;

/// A value found by [`PageCtx::get_input`](crate::PageCtx::get_input).
///
/// Lookups that find nothing return `None`, so a legitimately falsy value
/// such as `0`, `false` or `""` in the payload is still distinguishable
/// from a missing one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input<'a> {
    /// A query string or form parameter
    Param(&'a str),
    /// A value from the parsed JSON payload
    Payload(&'a Value),
}

impl<'a> Input<'a> {
    /// Returns the value as a string slice when it is textual.
    pub fn as_str(&self) -> Option<&'a str> {
        match *self {
            Input::Param(s) => Some(s),
            Input::Payload(v) => v.as_str(),
        }
    }

    /// Returns `true` if the value came from the request parameters.
    pub fn is_param(&self) -> bool {
        matches!(self, Input::Param(_))
    }

    /// Converts the value to an owned JSON value.
    pub fn to_value(&self) -> Value {
        match *self {
            Input::Param(s) => Value::String(s.to_string()),
            Input::Payload(v) => v.clone(),
        }
    }
}

impl fmt::Display for Input<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Param(s) => f.write_str(s),
            Input::Payload(Value::String(s)) => f.write_str(s),
            Input::Payload(v) => write!(f, "{}", v),
        }
    }
}
