//! Tests for frame handling through the dispatcher.

use std::sync::Arc;

use rstest::{fixture, rstest};
use serde_json::{Map, Value, json};
use symbridge_registry::{Binding, HostCallable, InvocationError, Registry, Returned};

use super::*;
use crate::framer::FrameEvent;

/// Callable that panics when invoked.
struct Exploding;

impl HostCallable for Exploding {
    fn name(&self) -> &str {
        "explode"
    }

    fn call(&self, _args: Vec<Value>, _kwargs: Map<String, Value>) -> Result<Returned, InvocationError> {
        panic!("kaboom");
    }
}

#[fixture]
fn dispatcher() -> Dispatcher {
    Dispatcher::new(Registry::new())
}

fn send(dispatcher: &mut Dispatcher, request: &Value) -> Response {
    let frame = serde_json::to_vec(request).expect("serialize request");
    dispatcher.handle_frame(&frame)
}

#[rstest]
fn ping_answers_pong(mut dispatcher: Dispatcher) {
    let response = send(&mut dispatcher, &json!({"pid": 1, "action": "PING"}));
    assert_eq!(response, Response::ok(json!(1), json!(PONG)));
}

#[rstest]
fn unknown_actions_keep_the_pid(mut dispatcher: Dispatcher) {
    let response = send(&mut dispatcher, &json!({"pid": "abc", "action": "FOO"}));
    assert_eq!(response.status, Status::Error);
    assert_eq!(response.pid, json!("abc"));
    assert!(
        response
            .body
            .as_str()
            .is_some_and(|body| body.contains("got 'FOO'"))
    );
}

#[rstest]
fn import_then_run(mut dispatcher: Dispatcher) {
    let imported = send(
        &mut dispatcher,
        &json!({"pid": 1, "action": "IMPORT", "module": {"name": "math", "from_list": ["*"]}}),
    );
    assert_eq!(imported.status, Status::Ok);

    let response = send(
        &mut dispatcher,
        &json!({"pid": 2, "action": "RUN", "module": "", "function": "sqrt", "args": [9]}),
    );
    assert_eq!(response.status, Status::Ok);
    assert_eq!(response.body.as_f64(), Some(3.0));
}

#[rstest]
fn run_of_unbound_name_is_an_error(mut dispatcher: Dispatcher) {
    let response = send(
        &mut dispatcher,
        &json!({"pid": 3, "action": "RUN", "module": "", "function": "nope"}),
    );
    assert_eq!(response.status, Status::Error);
    assert_eq!(response.body, json!("name 'nope' is not defined"));
}

#[rstest]
fn set_path_returns_an_empty_body(mut dispatcher: Dispatcher) {
    let response = send(
        &mut dispatcher,
        &json!({"pid": 4, "action": "SET_PATH", "path": ["lib", "vendor"]}),
    );
    assert_eq!(response, Response::ok(json!(4), json!("")));
    assert_eq!(dispatcher.registry().search_path().len(), 2);
}

#[rstest]
fn panics_become_error_responses() {
    let mut registry = Registry::new();
    registry.bind("explode", Binding::Callable(Arc::new(Exploding)));
    let mut dispatcher = Dispatcher::new(registry);

    let response = send(
        &mut dispatcher,
        &json!({"pid": 5, "action": "RUN", "module": "", "function": "explode"}),
    );
    assert_eq!(response.status, Status::Error);
    assert_eq!(response.body, json!("invocation panicked: kaboom"));

    let after = send(&mut dispatcher, &json!({"pid": 6, "action": "PING"}));
    assert_eq!(after.status, Status::Ok);
}

#[rstest]
fn invalid_json_gets_a_null_pid(mut dispatcher: Dispatcher) {
    let response = dispatcher.handle_frame(b"{not json");
    assert_eq!(response.status, Status::Error);
    assert_eq!(response.pid, Value::Null);
}

#[rstest]
fn oversized_events_are_reported(mut dispatcher: Dispatcher) {
    let response = dispatcher.handle_event(FrameEvent::Oversized { size: 10, limit: 8 });
    assert_eq!(response.status, Status::Error);
    assert_eq!(response.pid, Value::Null);
    assert!(
        response
            .body
            .as_str()
            .is_some_and(|body| body.contains("exceeds the 8 byte limit"))
    );
}

#[rstest]
fn init_class_binds_the_alias(mut dispatcher: Dispatcher) {
    send(
        &mut dispatcher,
        &json!({"pid": 1, "action": "IMPORT", "module": {"name": "collections", "from_list": []}}),
    );
    let response = send(
        &mut dispatcher,
        &json!({
            "pid": 2,
            "action": "INIT_CLASS",
            "class": "collections.Counter",
            "as": "tally",
            "args": ["abca"]
        }),
    );
    assert_eq!(response.status, Status::Ok);
    assert!(response.body.get("tally").is_some());

    let most = send(
        &mut dispatcher,
        &json!({"pid": 3, "action": "RUN", "module": "tally", "function": "most_common", "args": [1]}),
    );
    assert_eq!(most.body, json!([["a", 2]]));
}
