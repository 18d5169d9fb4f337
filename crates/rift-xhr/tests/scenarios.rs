//! End-to-end scenarios: request code driven through the public API the way a
//! test suite would use the simulator.

use parking_lot::Mutex;
use rift_xhr::predicate::{
    any_of, ends_with, equal_to, matches_pattern, predicate_fn, starts_with,
};
use rift_xhr::{
    MockXhr, OpenOptions, Predicates, ReadyState, ResponseSpec, RuleId, Scheduler, Simulator,
    TimerHandle,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Basic scenarios
// ============================================================================

fn send_sync(sim: &Simulator, method: &str, url: &str, options: OpenOptions) -> MockXhr {
    let xhr = sim.new_request();
    xhr.open_with(method, url, OpenOptions {
        asynchronous: false,
        ..options
    });
    xhr.send(None).unwrap();
    xhr
}

#[test]
fn test_prefix_rule_answers_synchronous_request() {
    let sim = Simulator::new();
    sim.register(Predicates::new().url(starts_with("/good")))
        .set_response(ResponseSpec::new().with_status(200).with_data("200-ok"));

    let xhr = send_sync(&sim, "GET", "/good/1", OpenOptions::default());

    assert_eq!(xhr.ready_state(), ReadyState::Done);
    assert_eq!(xhr.status(), 200);
    assert_eq!(xhr.response_text(), "200-ok");
}

#[test]
fn test_no_rules_yields_404() {
    let sim = Simulator::new();
    for (method, url) in [("GET", "/"), ("POST", "/api/items"), ("DELETE", "/x?y=z")] {
        let xhr = send_sync(&sim, method, url, OpenOptions::default());
        assert_eq!(xhr.status(), 404, "{method} {url}");
    }
}

#[test]
fn test_status_routing_by_prefix() {
    let sim = Simulator::new();
    sim.register(Predicates::new().url(starts_with("/good")))
        .set_response(ResponseSpec::new().with_status(200).with_data("200 - all good"));
    sim.register(Predicates::new().url(starts_with("/auth")))
        .set_response(ResponseSpec::new().with_status(401).with_data("401 - auth required!"));
    sim.register(Predicates::new().url(starts_with("/error")))
        .set_response(
            ResponseSpec::new()
                .with_status(500)
                .with_data("500 - internal server error"),
        );

    let cases = [
        ("/good/page", 200),
        ("/auth/login", 401),
        ("/error/now", 500),
        ("/unknown", 404),
    ];
    for (url, expected) in cases {
        let xhr = send_sync(&sim, "GET", url, OpenOptions::default());
        assert_eq!(xhr.status(), expected, "{url}");
    }
}

#[test]
fn test_multi_field_matching() {
    let sim = Simulator::new();
    sim.register(
        Predicates::new()
            .method(equal_to("HEAD"))
            .url(starts_with("/good")),
    )
    .set_response(ResponseSpec::new().with_data(""));
    sim.register(
        Predicates::new()
            .method(equal_to("GET"))
            .url(starts_with("/good")),
    )
    .set_response(ResponseSpec::new().with_data("200-ok"));
    sim.register(
        Predicates::new()
            .with("username", equal_to("me"))
            .with("password", equal_to("secret")),
    )
    .set_response(ResponseSpec::new().with_data("auth-ok"));
    sim.register(
        Predicates::new()
            .method(any_of(vec![
                Box::new(equal_to("GET")),
                Box::new(equal_to("POST")),
            ]))
            .url(ends_with("&pretty=true")),
    )
    .set_response(ResponseSpec::new().with_data("pretty-print"));
    sim.register(
        Predicates::new()
            .method(any_of(vec![
                Box::new(equal_to("PUT")),
                Box::new(equal_to("DELETE")),
            ]))
            .url(matches_pattern(r"blog/\d+").unwrap())
            .with("username", equal_to("admin")),
    )
    .set_response(ResponseSpec::new().with_data("manipulate-ok"));

    let head = send_sync(&sim, "HEAD", "/good?foo=bar", OpenOptions::default());
    assert_eq!(head.response_text(), "");
    assert_eq!(head.status(), 200);

    let get = send_sync(&sim, "GET", "/good/1", OpenOptions::default());
    assert_eq!(get.response_text(), "200-ok");
    let again = send_sync(&sim, "GET", "/good/1", OpenOptions::default());
    assert_eq!(again.response_text(), "200-ok");

    // Every constrained field must match
    let post = send_sync(&sim, "POST", "/good", OpenOptions::default());
    assert_eq!(post.status(), 404);

    let login = send_sync(
        &sim,
        "POST",
        "/session",
        OpenOptions::default().with_credentials("me", "secret"),
    );
    assert_eq!(login.response_text(), "auth-ok");

    let pretty = send_sync(
        &sim,
        "GET",
        "/something/else?foo=bar&pretty=true",
        OpenOptions::default(),
    );
    assert_eq!(pretty.response_text(), "pretty-print");

    let blog = send_sync(
        &sim,
        "PUT",
        "/my/blog/143",
        OpenOptions::default().with_username("admin"),
    );
    assert_eq!(blog.response_text(), "manipulate-ok");

    let anonymous = send_sync(&sim, "PUT", "/my/blog/143", OpenOptions::default());
    assert_eq!(anonymous.status(), 404);
}

#[test]
fn test_predicates_on_headers_and_body() {
    let sim = Simulator::new();
    sim.register(
        Predicates::new()
            .with(
                "headers",
                predicate_fn(|headers| headers["Accept"] == "application/json"),
            )
            .with("data", predicate_fn(|data| data["kind"] == "order")),
    )
    .set_response(ResponseSpec::new().with_status(201).with_data(json!({"id": 7})));

    let xhr = sim.new_request();
    xhr.open_with("POST", "/orders", OpenOptions::synchronous());
    xhr.set_header("Accept", "application/json").unwrap();
    xhr.send(Some(json!({"kind": "order", "qty": 2}))).unwrap();

    assert_eq!(xhr.status(), 201);
    assert_eq!(xhr.response_json::<Value>().unwrap(), json!({"id": 7}));
}

// ============================================================================
// Timers
// ============================================================================

#[test]
fn test_timers_fire_one_at_a_time_in_capture_order() {
    let sim = Simulator::new();
    let fired = Arc::new(Mutex::new(Vec::new()));

    for name in ["first", "second"] {
        let fired = Arc::clone(&fired);
        sim.capture_timer(move || fired.lock().push(name));
    }

    assert!(sim.fire_next_timer());
    assert_eq!(*fired.lock(), vec!["first"]);
    assert!(sim.fire_next_timer());
    assert_eq!(*fired.lock(), vec!["first", "second"]);
    assert!(!sim.fire_next_timer());
    assert_eq!(fired.lock().len(), 2);
}

#[test]
fn test_released_timer_is_skipped() {
    let sim = Simulator::new();
    let fired = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<TimerHandle> = ["a", "b", "c"]
        .into_iter()
        .map(|name| {
            let fired = Arc::clone(&fired);
            sim.capture_timer(move || fired.lock().push(name))
        })
        .collect();

    assert!(sim.release_timer(handles[0]));
    assert!(!sim.release_timer(handles[0]));
    assert_eq!(sim.pending_timers(), 2);

    assert!(sim.fire_next_timer());
    assert_eq!(*fired.lock(), vec!["b"]);
}

// ============================================================================
// A client library driven through the request factory and scheduler seams
// ============================================================================

#[derive(Debug, Default)]
struct Context {
    data: Option<Value>,
    callbacks: Vec<String>,
}

impl Context {
    fn trail(&self) -> String {
        self.callbacks.join("|")
    }
}

/// Minimal callback-style client: success/error/complete plus an optional timeout
/// that aborts the request.
fn ajax(sim: &Simulator, url: &str, timeout: Option<Duration>, cx: &Arc<Mutex<Context>>) {
    let factory = sim.request_factory();
    let xhr = factory();
    let timer: Arc<Mutex<Option<TimerHandle>>> = Arc::new(Mutex::new(None));

    if let Some(delay) = timeout {
        let request = xhr.clone();
        let cx = Arc::clone(cx);
        let handle = sim.set_timeout(
            Box::new(move || {
                request.abort();
                let mut cx = cx.lock();
                cx.callbacks.push(format!("error=timeout,{}", request.status()));
                cx.callbacks.push("complete".to_string());
            }),
            delay,
        );
        *timer.lock() = Some(handle);
    }

    let scheduler = sim.clone();
    let cx = Arc::clone(cx);
    xhr.on_ready_state_change(move |request| {
        if request.ready_state() != ReadyState::Done {
            return;
        }
        if let Some(handle) = timer.lock().take() {
            scheduler.clear_timeout(handle);
        }
        let status = request.status();
        let mut cx = cx.lock();
        if (200..300).contains(&status) {
            cx.data = request.response_json().ok();
            cx.callbacks.push(format!("success={status}"));
        } else {
            cx.callbacks.push(format!("error=error,{status}"));
        }
        cx.callbacks.push("complete".to_string());
    });

    xhr.open("GET", url);
    xhr.send(None).unwrap();
}

fn reset(cx: &Arc<Mutex<Context>>) {
    *cx.lock() = Context::default();
}

#[test]
fn test_client_success_error_and_timeout() {
    let sim = Simulator::new();
    sim.register(Predicates::new().url(equal_to("/bar")))
        .set_response(ResponseSpec::new().with_data(r#"{"foo":"bar"}"#));
    let cx = Arc::new(Mutex::new(Context::default()));

    ajax(&sim, "/foo", None, &cx);
    sim.deliver_all();
    assert_eq!(cx.lock().trail(), "error=error,404|complete");

    reset(&cx);
    ajax(&sim, "/bar", None, &cx);
    sim.deliver_all();
    assert_eq!(cx.lock().trail(), "success=200|complete");
    assert_eq!(cx.lock().data, Some(json!({"foo": "bar"})));

    // The timer fires before the response: the request is aborted silently
    reset(&cx);
    ajax(&sim, "/bar", Some(Duration::from_secs(60)), &cx);
    assert!(sim.fire_next_timer());
    assert_eq!(sim.deliver_all(), 0);
    assert_eq!(cx.lock().trail(), "error=timeout,0|complete");

    // The response arrives first: the timer is cleared
    reset(&cx);
    ajax(&sim, "/bar", Some(Duration::from_secs(60)), &cx);
    assert_eq!(sim.deliver_all(), 1);
    assert_eq!(cx.lock().trail(), "success=200|complete");
    assert_eq!(sim.pending_timers(), 0);
    assert!(!sim.fire_next_timer());
}

#[test]
fn test_client_out_of_order_responses() {
    let sim = Simulator::new();
    for name in ["foo", "bar", "baz"] {
        sim.register(Predicates::new().url(equal_to(format!("/{name}"))))
            .set_response(ResponseSpec::new().with_data(json!({ "d": name })));
    }
    let cx = Arc::new(Mutex::new(Context::default()));

    ajax(&sim, "/foo", None, &cx);
    ajax(&sim, "/bar", None, &cx);
    ajax(&sim, "/baz", None, &cx);
    assert_eq!(sim.pending_requests(), 3);

    let latest = |cx: &Arc<Mutex<Context>>| cx.lock().data.as_ref().map(|d| d["d"].clone());

    assert!(sim.deliver_at(1));
    assert_eq!(latest(&cx), Some(json!("bar")));
    assert!(sim.deliver_at(1));
    assert_eq!(latest(&cx), Some(json!("baz")));
    assert!(sim.deliver_at(0));
    assert_eq!(latest(&cx), Some(json!("foo")));
    assert_eq!(sim.pending_requests(), 0);
}

#[test]
fn test_object_response_is_serialized_once() {
    let sim = Simulator::new();
    let handle = sim.register(Predicates::new().url(equal_to("/bar")));
    handle.set_response(ResponseSpec::new().with_data(json!({"foo": "bar"})));
    let cx = Arc::new(Mutex::new(Context::default()));

    ajax(&sim, "/foo", None, &cx);
    sim.deliver_all();
    assert_eq!(cx.lock().trail(), "error=error,404|complete");

    reset(&cx);
    ajax(&sim, "/bar", None, &cx);
    ajax(&sim, "/bar", None, &cx);
    sim.deliver_all();
    assert_eq!(cx.lock().trail(), "success=200|complete|success=200|complete");
    assert_eq!(cx.lock().data, Some(json!({"foo": "bar"})));

    let cached = match handle.response() {
        rift_xhr::ResponseSource::Static(spec) => spec.body_text(),
        other => panic!("unexpected response source {other:?}"),
    };
    assert_eq!(cached, r#"{"foo":"bar"}"#);
}

// ============================================================================
// Isolation
// ============================================================================

#[test]
fn test_simulators_are_isolated() {
    let a = Simulator::new();
    let b = Simulator::new();
    a.register(Predicates::new())
        .set_response(ResponseSpec::new().with_data("from a"));

    let on_b = send_sync(&b, "GET", "/", OpenOptions::default());
    assert_eq!(on_b.matched_rule(), Some(RuleId::FALLBACK));

    let pending = a.new_request();
    pending.open("GET", "/");
    pending.send(None).unwrap();
    assert_eq!(a.pending_requests(), 1);
    assert_eq!(b.pending_requests(), 0);
}

#[test]
fn test_reset_between_scenarios() {
    let sim = Simulator::new();
    sim.register(Predicates::new())
        .set_response(ResponseSpec::new().with_data("everything"));
    let first = send_sync(&sim, "GET", "/", OpenOptions::default());
    assert_eq!(first.response_text(), "everything");

    sim.reset();

    let second = send_sync(&sim, "GET", "/", OpenOptions::default());
    assert_eq!(second.status(), 404);
    assert_eq!(sim.recorded_requests().len(), 1);
    // Ids restart after the fallback
    let handle = sim.register(Predicates::new());
    assert_eq!(handle.id(), RuleId(1));
}
