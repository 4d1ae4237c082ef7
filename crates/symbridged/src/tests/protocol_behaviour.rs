//! Behavioural tests for request handling through the dispatcher.

use std::cell::RefCell;
use std::fs;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};
use symbridge_registry::Registry;
use tempfile::TempDir;

use crate::dispatch::{Dispatcher, Response, Status};

const MANIFEST: &str = r#"{
    "members": {
        "MyClass": {"class": {
            "attributes": {"colour": "red"},
            "methods": {"describe": {"returns": "a red thing"}}
        }}
    }
}"#;

struct ProtocolWorld {
    dispatcher: Dispatcher,
    responses: Vec<Response>,
    next_pid: u64,
    manifests: Option<TempDir>,
}

impl ProtocolWorld {
    fn new() -> Self {
        Self {
            dispatcher: Dispatcher::new(Registry::new()),
            responses: Vec::new(),
            next_pid: 0,
            manifests: None,
        }
    }

    fn send(&mut self, mut request: Value) {
        self.next_pid += 1;
        request["pid"] = json!(self.next_pid);
        let frame = serde_json::to_vec(&request).expect("serialize request");
        self.send_raw(&frame);
    }

    fn send_raw(&mut self, frame: &[u8]) {
        let response = self.dispatcher.handle_frame(frame);
        self.responses.push(response);
    }

    fn last(&self) -> &Response {
        self.responses.last().expect("a response was recorded")
    }

    fn response(&self, position: usize) -> &Response {
        self.responses
            .get(position.saturating_sub(1))
            .expect("response recorded")
    }
}

fn status(name: &str) -> Status {
    match strip_quotes(name) {
        "OK" => Status::Ok,
        "ERROR" => Status::Error,
        other => panic!("unknown status {other}"),
    }
}

/// Strips surrounding double quotes from a string if present.
fn strip_quotes(s: &str) -> &str {
    s.trim_matches('"')
}

#[fixture]
fn world() -> RefCell<ProtocolWorld> {
    RefCell::new(ProtocolWorld::new())
}

#[given("a fresh worker")]
fn given_fresh_worker(world: &RefCell<ProtocolWorld>) {
    assert!(world.borrow().responses.is_empty());
}

#[given(r#"a manifest module "{module}" declaring class "{class}""#)]
fn given_manifest_module(world: &RefCell<ProtocolWorld>, module: String, class: String) {
    let dir = TempDir::new().expect("create manifest dir");
    let manifest = MANIFEST.replace("MyClass", strip_quotes(&class));
    fs::write(
        dir.path().join(format!("{}.json", strip_quotes(&module))),
        manifest,
    )
    .expect("write manifest");
    world.borrow_mut().manifests = Some(dir);
}

#[when("a PING request is sent")]
fn when_ping(world: &RefCell<ProtocolWorld>) {
    world.borrow_mut().send(json!({"action": "PING"}));
}

#[when(r#"a request with action "{action}" is sent"#)]
fn when_action(world: &RefCell<ProtocolWorld>, action: String) {
    world
        .borrow_mut()
        .send(json!({"action": strip_quotes(&action)}));
}

#[when("a frame containing invalid JSON is sent")]
fn when_invalid_json(world: &RefCell<ProtocolWorld>) {
    world.borrow_mut().send_raw(b"{\"pid\": 1, \"action\": ");
}

#[when(r#"module "{module}" is imported with members "{members}""#)]
fn when_import(world: &RefCell<ProtocolWorld>, module: String, members: String) {
    let from_list: Vec<&str> = strip_quotes(&members)
        .split(',')
        .filter(|member| !member.is_empty())
        .collect();
    world.borrow_mut().send(json!({
        "action": "IMPORT",
        "module": {"name": strip_quotes(&module), "from_list": from_list}
    }));
}

#[when(r#"function "{function}" is run with argument {argument}"#)]
fn when_run(world: &RefCell<ProtocolWorld>, function: String, argument: i64) {
    world.borrow_mut().send(json!({
        "action": "RUN",
        "module": "",
        "function": strip_quotes(&function),
        "args": [argument]
    }));
}

#[when("the manifest directory is added to the search path")]
fn when_set_path(world: &RefCell<ProtocolWorld>) {
    let path = world
        .borrow()
        .manifests
        .as_ref()
        .map(|dir| dir.path().display().to_string())
        .expect("manifest dir");
    world
        .borrow_mut()
        .send(json!({"action": "SET_PATH", "path": [path]}));
}

#[when(r#"class "{class}" is instantiated as "{alias}""#)]
fn when_init_class(world: &RefCell<ProtocolWorld>, class: String, alias: String) {
    world.borrow_mut().send(json!({
        "action": "INIT_CLASS",
        "class": strip_quotes(&class),
        "as": strip_quotes(&alias)
    }));
}

#[when(r#"method "{method}" is run on "{target}""#)]
fn when_run_method(world: &RefCell<ProtocolWorld>, method: String, target: String) {
    world.borrow_mut().send(json!({
        "action": "RUN",
        "module": strip_quotes(&target),
        "function": strip_quotes(&method)
    }));
}

#[then(r#"the last response has status "{expected}""#)]
fn then_last_status(world: &RefCell<ProtocolWorld>, expected: String) {
    let world = world.borrow();
    assert_eq!(world.last().status, status(&expected), "{:?}", world.last());
}

#[then(r#"response {position} has status "{expected}""#)]
fn then_nth_status(world: &RefCell<ProtocolWorld>, position: usize, expected: String) {
    assert_eq!(world.borrow().response(position).status, status(&expected));
}

#[then(r#"the last response body is the string "{expected}""#)]
fn then_body_string(world: &RefCell<ProtocolWorld>, expected: String) {
    assert_eq!(world.borrow().last().body, json!(strip_quotes(&expected)));
}

#[then("the last response body is the number {expected}")]
fn then_body_number(world: &RefCell<ProtocolWorld>, expected: f64) {
    let body = world.borrow().last().body.as_f64();
    assert!(body.is_some_and(|value| (value - expected).abs() < f64::EPSILON));
}

#[then(r#"the last response body mentions "{fragment}""#)]
fn then_body_mentions(world: &RefCell<ProtocolWorld>, fragment: String) {
    let world = world.borrow();
    let body = world.last().body.as_str().unwrap_or_default();
    assert!(body.contains(strip_quotes(&fragment)), "body was {body}");
}

#[then(r#"the registry binds "{name}""#)]
fn then_registry_binds(world: &RefCell<ProtocolWorld>, name: String) {
    assert!(
        world
            .borrow()
            .dispatcher
            .registry()
            .get(strip_quotes(&name))
            .is_some()
    );
}

#[then(r#"the last response body lists member "{member}" for "{alias}""#)]
fn then_body_lists_member(world: &RefCell<ProtocolWorld>, member: String, alias: String) {
    let world = world.borrow();
    let members = world
        .last()
        .body
        .get(strip_quotes(&alias))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    assert!(members.contains(&json!(strip_quotes(&member))));
}

#[scenario(
    path = "tests/features/worker_protocol.feature",
    name = "Liveness check"
)]
fn liveness_check(world: RefCell<ProtocolWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/worker_protocol.feature",
    name = "Unknown actions are rejected"
)]
fn unknown_actions_rejected(world: RefCell<ProtocolWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/worker_protocol.feature",
    name = "Importing a module and calling a member"
)]
fn import_and_call(world: RefCell<ProtocolWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/worker_protocol.feature",
    name = "Import continues past sub-modules"
)]
fn import_past_submodules(world: RefCell<ProtocolWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/worker_protocol.feature",
    name = "Malformed frames do not stop the worker"
)]
fn malformed_frames_survive(world: RefCell<ProtocolWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/worker_protocol.feature",
    name = "Instantiating a class from a manifest module"
)]
fn instantiate_manifest_class(world: RefCell<ProtocolWorld>) {
    drop(world);
}
