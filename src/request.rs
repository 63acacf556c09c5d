//! Inbound request data for a single page dispatch.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::payload::{merge_json_source, Payload, PayloadReport, SourceOutcome};

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// HTTP GET method
    Get,
    /// HTTP POST method
    Post,
    /// HTTP PUT method
    Put,
    /// HTTP DELETE method
    Delete,
}

impl HttpMethod {
    /// Returns `true` for methods that change state and require a token.
    pub fn is_mutating(self) -> bool {
        !matches!(self, HttpMethod::Get)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Put => write!(f, "PUT"),
            HttpMethod::Delete => write!(f, "DELETE"),
        }
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(Error::UnsupportedMethod(s.to_string())),
        }
    }
}

/// Everything a page sees about the request it is handling.
///
/// Framework integrations build one `RequestContext` per inbound request
/// and hand it to [`PageController`](crate::PageController), which owns it
/// for the rest of the dispatch. The payload mapping starts empty and is
/// filled by [`PageCtx::parse_json_payload`](crate::PageCtx::parse_json_payload).
///
/// # Examples
///
/// ```
/// use page_core::{HttpMethod, RequestContext};
///
/// let mut request = RequestContext::new("req-1".to_string(), HttpMethod::Post);
/// request.add_query_param("page".to_string(), "1".to_string());
/// request.add_form_param("page".to_string(), "2".to_string());
///
/// // Form input shadows the query string
/// assert_eq!(request.param("page"), Some("2"));
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: String,
    method: HttpMethod,
    query_params: HashMap<String, String>,
    form_params: HashMap<String, String>,
    // Keys are stored lowercased
    headers: HashMap<String, String>,
    body: Vec<u8>,
    payload: Payload,
}

impl RequestContext {
    /// Creates an empty request with the given id and method.
    pub fn new(request_id: String, method: HttpMethod) -> Self {
        Self {
            request_id,
            method,
            query_params: HashMap::new(),
            form_params: HashMap::new(),
            headers: HashMap::new(),
            body: Vec::new(),
            payload: Payload::new(),
        }
    }

    /// Adds a query string parameter.
    pub fn add_query_param(&mut self, key: String, value: String) {
        self.query_params.insert(key, value);
    }

    /// Adds a form field from a urlencoded or multipart body.
    pub fn add_form_param(&mut self, key: String, value: String) {
        self.form_params.insert(key, value);
    }

    /// Adds a request header. Header names are case-insensitive.
    pub fn add_header(&mut self, key: String, value: String) {
        self.headers.insert(key.to_ascii_lowercase(), value);
    }

    /// Replaces the raw request body.
    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = body.into();
    }

    /// Returns the request ID.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Looks up a request parameter, form fields first, then the query string.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.form_params
            .get(name)
            .or_else(|| self.query_params.get(name))
            .map(String::as_str)
    }

    /// Looks up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Returns the raw request body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns `true` if the request came from a script expecting data back.
    ///
    /// Matches `X-Requested-With: XMLHttpRequest` or an `Accept` header
    /// naming `application/json`.
    pub fn is_xhr(&self) -> bool {
        let requested_with = self
            .header("x-requested-with")
            .is_some_and(|v| v.eq_ignore_ascii_case("xmlhttprequest"));
        let wants_json = self
            .header("accept")
            .is_some_and(|v| v.to_ascii_lowercase().contains("application/json"));
        requested_with || wants_json
    }

    /// Returns the parsed payload mapping.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Returns the parsed payload mapping for in-place edits.
    pub fn payload_mut(&mut self) -> &mut Payload {
        &mut self.payload
    }

    /// Merges the JSON form field `field`, then the body, into the payload.
    ///
    /// The body is only consulted for mutating methods.
    pub(crate) fn parse_json_payload(&mut self, field: &str) -> PayloadReport {
        let form = match self
            .form_params
            .get(field)
            .or_else(|| self.query_params.get(field))
        {
            Some(raw) => merge_json_source(&mut self.payload, raw.as_bytes()),
            None => SourceOutcome::Absent,
        };

        let body = if self.method.is_mutating() {
            merge_json_source(&mut self.payload, &self.body)
        } else {
            SourceOutcome::Absent
        };

        PayloadReport { form, body }
    }

    /// Consumes the request and returns its payload mapping.
    pub(crate) fn into_payload(self) -> Payload {
        self.payload
    }
}
