//! Property tests for page dispatch invariants.

use page_core::memory::{MemorySession, MemoryTemplates, MemoryTokens};
use page_core::payload::merge_json_source;
use page_core::{
    final_code, Flow, HttpMethod, Input, Page, PageController, PageCtx, Payload, RequestContext,
    Response, Site, SiteConfig,
};
use proptest::prelude::*;
use serde_json::Value;

struct Noop;

impl Page for Noop {}

/// Page that reads one input and remembers what it saw.
struct Lookup {
    name: String,
    seen: Option<Value>,
    from_param: bool,
}

impl Page for Lookup {
    fn handle_post(&mut self, ctx: &mut PageCtx<'_>) -> Flow {
        if let Some(input) = ctx.get_input(&self.name, false) {
            self.from_param = matches!(input, Input::Param(_));
            self.seen = Some(input.to_value());
        }
        Flow::Continue(())
    }
}

// Strategy: flat JSON objects with small keys and scalar values
fn arb_object() -> impl Strategy<Value = Payload> {
    prop::collection::btree_map(
        "[a-e]{1,2}",
        prop_oneof![
            any::<i64>().prop_map(Value::from),
            any::<bool>().prop_map(Value::from),
            "[a-z]{0,6}".prop_map(Value::from),
        ],
        0..6,
    )
    .prop_map(|map| map.into_iter().collect::<Payload>())
}

fn arb_method() -> impl Strategy<Value = HttpMethod> {
    prop_oneof![
        Just(HttpMethod::Get),
        Just(HttpMethod::Post),
        Just(HttpMethod::Put),
        Just(HttpMethod::Delete),
    ]
}

proptest! {
    /// Property: merging never overwrites a key that is already present
    #[test]
    fn proptest_merge_is_first_writer_wins(first in arb_object(), second in arb_object()) {
        let mut payload = Payload::new();
        merge_json_source(&mut payload, Value::Object(first.clone()).to_string().as_bytes());
        merge_json_source(&mut payload, Value::Object(second.clone()).to_string().as_bytes());

        for (key, value) in &first {
            prop_assert_eq!(&payload[key], value);
        }
        for (key, value) in &second {
            if !first.contains_key(key) {
                prop_assert_eq!(&payload[key], value);
            }
        }
        prop_assert_eq!(
            payload.len(),
            first.keys().chain(second.keys()).collect::<std::collections::BTreeSet<_>>().len()
        );
    }

    /// Property: text that is not a JSON object leaves the payload unchanged
    #[test]
    fn proptest_invalid_json_leaves_payload_unchanged(
        existing in arb_object(),
        garbage in "[^{}]{1,40}",
    ) {
        let mut payload = existing.clone();
        merge_json_source(&mut payload, garbage.as_bytes());
        prop_assert_eq!(payload, existing);
    }

    /// Property: the page status is only applied once the ambient one has moved off 200
    #[test]
    fn proptest_final_code(pending in 100u16..600, ambient in 100u16..600) {
        let code = final_code(pending, ambient);
        if ambient == 200 {
            prop_assert_eq!(code, 200);
        } else {
            prop_assert_eq!(code, pending);
        }
    }

    /// Property: XHR mutations never redirect, whatever the token outcome
    #[test]
    fn proptest_xhr_mutations_never_redirect(
        method in arb_method().prop_filter("mutating", |m| m.is_mutating()),
        token_ok in any::<bool>(),
    ) {
        let session = MemorySession::authenticated();
        let tokens = if token_ok { MemoryTokens::accepting() } else { MemoryTokens::rejecting() };
        let templates = MemoryTemplates::new();
        let config = SiteConfig::default();
        let controller = PageController::new(Site::new(&session, &tokens, &templates, &config));

        let request = RequestContext::new("req-prop".to_string(), method);
        let mut response = Response::new();
        let outcome = match method {
            HttpMethod::Post => controller.post_xhr(&mut Noop, request, &mut response),
            HttpMethod::Put => controller.put_xhr(&mut Noop, request, &mut response),
            _ => controller.delete_xhr(&mut Noop, request, &mut response),
        };

        prop_assert!(!outcome.forward);
        prop_assert!(outcome.redirect.is_none());
        prop_assert_eq!(response.location(), None);
    }

    /// Property: a non-empty request parameter always shadows the payload
    #[test]
    fn proptest_param_shadows_payload(
        name in "[a-z]{1,8}",
        param in "[a-z0-9]{1,12}",
        payload_value in "[a-z0-9]{0,12}",
    ) {
        let session = MemorySession::authenticated();
        let tokens = MemoryTokens::accepting();
        let templates = MemoryTemplates::new();
        let config = SiteConfig::default();
        let controller = PageController::new(Site::new(&session, &tokens, &templates, &config));

        let mut request = RequestContext::new("req-prop".to_string(), HttpMethod::Post);
        request.add_query_param(name.clone(), param.clone());
        let mut body = Payload::new();
        body.insert(name.clone(), Value::String(payload_value));
        request.set_body(Value::Object(body).to_string());

        let mut page = Lookup { name, seen: None, from_param: false };
        let mut response = Response::new();
        controller.post_xhr(&mut page, request, &mut response);

        prop_assert!(page.from_param);
        prop_assert_eq!(page.seen, Some(Value::String(param)));
    }
}
