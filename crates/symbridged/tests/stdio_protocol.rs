//! End-to-end tests driving the `symbridged` binary over stdin and stdout.

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;
use serde_json::{Value, json};
use tempfile::TempDir;

const SENTINEL: char = '\u{2404}';

fn framed(requests: &[&str]) -> String {
    requests
        .iter()
        .map(|request| format!("{request}{SENTINEL}"))
        .collect()
}

fn exchange(input: String) -> Vec<Value> {
    exchange_in(input, None)
}

fn exchange_in(input: String, dir: Option<&TempDir>) -> Vec<Value> {
    let mut command = cargo_bin_cmd!("symbridged");
    command.env("SYMBRIDGE_LOG_FILTER", "warn").write_stdin(input);
    if let Some(dir) = dir {
        command.current_dir(dir.path());
    }
    let output = command.assert().success().get_output().stdout.clone();
    let text = String::from_utf8(output).expect("stdout is utf8");
    assert!(text.is_empty() || text.ends_with(SENTINEL), "unterminated output: {text}");
    text.split(SENTINEL)
        .filter(|frame| !frame.is_empty())
        .map(|frame| serde_json::from_str(frame).expect("response is JSON"))
        .collect()
}

#[test]
fn ping_is_answered_exactly() {
    let mut command = cargo_bin_cmd!("symbridged");
    command
        .env("SYMBRIDGE_LOG_FILTER", "warn")
        .write_stdin(framed(&[r#"{"pid":1,"action":"PING"}"#]));
    command
        .assert()
        .success()
        .stdout(format!(r#"{{"pid":1,"status":"OK","body":"PONG"}}{SENTINEL}"#));
}

#[test]
fn unknown_actions_are_reported() {
    let responses = exchange(framed(&[r#"{"pid":"x","action":"FOO"}"#]));
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["status"], json!("ERROR"));
    assert_eq!(responses[0]["pid"], json!("x"));
    assert!(
        responses[0]["body"]
            .as_str()
            .is_some_and(|body| body.ends_with("got 'FOO'."))
    );
}

#[test]
fn star_import_then_run() {
    let responses = exchange(framed(&[
        r#"{"pid":1,"action":"IMPORT","module":{"name":"math","from_list":["*"]}}"#,
        r#"{"pid":2,"action":"RUN","module":"","function":"sqrt","args":[9],"kwargs":{}}"#,
    ]));
    assert_eq!(responses[0]["status"], json!("OK"));
    assert_eq!(responses[1], json!({"pid": 2, "status": "OK", "body": 3.0}));
}

#[test]
fn noise_frames_are_not_answered() {
    let input = format!(
        "\n{SENTINEL}{}",
        framed(&[r#"{"pid":1,"action":"PING"}"#])
    );
    assert_eq!(exchange(input).len(), 1);
}

#[test]
fn malformed_frames_do_not_stop_the_worker() {
    let responses = exchange(framed(&["{oops", r#"{"pid":2,"action":"PING"}"#]));
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["status"], json!("ERROR"));
    assert_eq!(responses[0]["pid"], Value::Null);
    assert_eq!(responses[1]["body"], json!("PONG"));
}

#[test]
fn large_integer_pids_round_trip() {
    let mut command = cargo_bin_cmd!("symbridged");
    command
        .env("SYMBRIDGE_LOG_FILTER", "warn")
        .write_stdin(framed(&[r#"{"pid":98765432109876543210,"action":"PING"}"#]));
    command
        .assert()
        .success()
        .stdout(contains(r#""pid":98765432109876543210"#));
}

#[test]
fn members_after_a_submodule_are_still_imported() {
    let responses = exchange(framed(&[
        r#"{"pid":1,"action":"IMPORT","module":{"name":"os","from_list":["path","getcwd"]}}"#,
        r#"{"pid":2,"action":"RUN","module":"","function":"getcwd"}"#,
        r#"{"pid":3,"action":"RUN","module":"path","function":"basename","args":["/a/b.txt"]}"#,
    ]));
    assert_eq!(responses[0]["status"], json!("OK"));
    assert_eq!(responses[1]["status"], json!("OK"));
    assert_eq!(responses[2]["body"], json!("b.txt"));
}

#[test]
fn submodule_imported_after_its_package_resolves() {
    let responses = exchange(framed(&[
        r#"{"pid":1,"action":"IMPORT","module":{"name":"os","from_list":[]}}"#,
        r#"{"pid":2,"action":"IMPORT","module":{"name":"os.path","from_list":[]}}"#,
        r#"{"pid":3,"action":"RUN","module":"os.path","function":"basename","args":["/a/b.txt"]}"#,
        r#"{"pid":4,"action":"RUN","module":"os","function":"getcwd"}"#,
    ]));
    assert_eq!(responses[1]["status"], json!("OK"));
    assert_eq!(responses[2]["body"], json!("b.txt"));
    assert_eq!(responses[3]["status"], json!("OK"));
}

#[test]
fn unterminated_final_request_is_answered() {
    let responses = exchange(String::from(r#"{"pid":5,"action":"PING"}"#));
    assert_eq!(responses, vec![json!({"pid": 5, "status": "OK", "body": "PONG"})]);
}

#[test]
fn classes_are_instantiated_from_manifests_on_the_search_path() {
    let dir = TempDir::new().expect("temp dir");
    fs::write(
        dir.path().join("mymodule.json"),
        r#"{"members": {"MyClass": {"class": {"methods": {"describe": {"returns": "red"}}}}}}"#,
    )
    .expect("write manifest");

    let responses = exchange_in(
        framed(&[
            r#"{"pid":1,"action":"SET_PATH","path":["."]}"#,
            r#"{"pid":2,"action":"IMPORT","module":{"name":"mymodule","from_list":[]}}"#,
            r#"{"pid":3,"action":"INIT_CLASS","class":"mymodule.MyClass","as":"obj","args":[],"kwargs":{}}"#,
            r#"{"pid":4,"action":"RUN","module":"obj","function":"describe"}"#,
        ]),
        Some(&dir),
    );
    assert_eq!(responses[0]["body"], json!(""));
    assert_eq!(responses[1]["status"], json!("OK"));
    assert_eq!(responses[2]["body"], json!({"obj": ["describe"]}));
    assert_eq!(responses[3]["body"], json!("red"));
}

#[test]
fn configured_search_path_is_applied_at_startup() {
    let dir = TempDir::new().expect("temp dir");
    fs::write(
        dir.path().join("settings.json"),
        r#"{"members": {"LIMIT": {"value": 3}}}"#,
    )
    .expect("write manifest");

    let mut command = cargo_bin_cmd!("symbridged");
    command
        .env("SYMBRIDGE_LOG_FILTER", "warn")
        .env("SYMBRIDGE_SEARCH_PATH", dir.path())
        .write_stdin(framed(&[
            r#"{"pid":1,"action":"IMPORT","module":{"name":"settings","from_list":["LIMIT"]}}"#,
        ]));
    command
        .assert()
        .success()
        .stdout(contains(r#""status":"OK""#));
}
