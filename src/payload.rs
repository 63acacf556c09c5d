//! JSON payload merging.
//!
//! A page can receive structured data two ways: a form field (named `json`
//! by default) holding a JSON document, or a raw JSON request body. Both are
//! parsed into one [`Payload`] mapping. Merging never overwrites a key that
//! is already present, so the form field wins over the body on collisions.
//!
//! Parse failures are not errors for the dispatch. They are reported per
//! source in a [`PayloadReport`] and the mapping is left untouched.

use serde_json::{Map, Value};

use crate::error::PayloadError;

/// Parsed payload mapping: string keys to arbitrary JSON values.
pub type Payload = Map<String, Value>;

/// What happened to one payload source.
#[derive(Debug)]
pub enum SourceOutcome {
    /// The source was missing, empty, or not consulted
    Absent,
    /// The source was a JSON object and was merged
    Merged {
        /// Number of keys the source added to the mapping
        added: usize,
    },
    /// The source could not be merged; the mapping is unchanged
    Rejected(PayloadError),
}

impl SourceOutcome {
    /// Returns `true` if the source was rejected.
    pub fn is_rejected(&self) -> bool {
        matches!(self, SourceOutcome::Rejected(_))
    }
}

/// Per-source results of a payload parse.
#[derive(Debug)]
pub struct PayloadReport {
    /// The JSON form field
    pub form: SourceOutcome,
    /// The raw request body
    pub body: SourceOutcome,
}

impl PayloadReport {
    /// Returns `true` if either source was rejected.
    pub fn has_rejections(&self) -> bool {
        self.form.is_rejected() || self.body.is_rejected()
    }
}

/// Parses `raw` and merges it into `payload` without overwriting keys.
///
/// Surrounding whitespace is ignored. Empty input is [`SourceOutcome::Absent`].
///
/// # Examples
///
/// ```
/// use page_core::payload::{merge_json_source, Payload, SourceOutcome};
/// use serde_json::json;
///
/// let mut payload = Payload::new();
/// payload.insert("a".to_string(), json!(1));
///
/// let outcome = merge_json_source(&mut payload, br#"{"a": 2, "b": 3}"#);
///
/// assert!(matches!(outcome, SourceOutcome::Merged { added: 1 }));
/// assert_eq!(payload["a"], json!(1));
/// assert_eq!(payload["b"], json!(3));
/// ```
pub fn merge_json_source(payload: &mut Payload, raw: &[u8]) -> SourceOutcome {
    let raw = raw.trim_ascii();
    if raw.is_empty() {
        return SourceOutcome::Absent;
    }

    let parsed = match serde_json::from_slice::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return SourceOutcome::Rejected(PayloadError::NotAnObject),
        Err(err) => return SourceOutcome::Rejected(PayloadError::Malformed(err)),
    };

    let mut added = 0;
    for (key, value) in parsed {
        if !payload.contains_key(&key) {
            payload.insert(key, value);
            added += 1;
        }
    }
    SourceOutcome::Merged { added }
}
