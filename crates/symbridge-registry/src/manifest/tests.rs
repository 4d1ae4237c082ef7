//! Tests for manifest parsing, lookup, and materialised objects.

use std::fs;

use rstest::{fixture, rstest};
use serde_json::{Map, json};
use tempfile::TempDir;

use super::*;
use crate::binding::Binding;
use crate::host::{HostObject, Returned, public_callables};

#[fixture]
fn workspace() -> TempDir {
    TempDir::new().expect("create temp dir")
}

fn search_path(dir: &TempDir) -> SearchPath {
    let mut path = SearchPath::new();
    path.push(dir.path().to_path_buf());
    path
}

fn no_aliases(module: &str, member: &str) -> Result<Binding, ImportError> {
    Err(ImportError::MissingMember {
        module: module.to_owned(),
        member: member.to_owned(),
    })
}

fn build(text: &str) -> ManifestModule {
    let manifest: ModuleManifest = serde_json::from_str(text).expect("parse manifest");
    ManifestModule::build("mymodule", Path::new("mymodule.json"), manifest, &mut no_aliases)
        .expect("build module")
}

#[test]
fn parses_every_member_kind() {
    let manifest: ModuleManifest = serde_json::from_value(json!({
        "members": {
            "LIMIT": {"value": 3},
            "greet": {"function": {"returns": "hi"}},
            "root": {"alias": "math.sqrt"},
            "MyClass": {"class": {"methods": {"ping": {"returns": "pong"}}}},
            "inner": {"module": {"members": {}}}
        }
    }))
    .expect("parse manifest");
    assert!(matches!(manifest.members.get("LIMIT"), Some(MemberSpec::Value(_))));
    assert!(matches!(manifest.members.get("greet"), Some(MemberSpec::Function(_))));
    assert!(matches!(manifest.members.get("root"), Some(MemberSpec::Alias(target)) if target == "math.sqrt"));
    assert!(matches!(manifest.members.get("MyClass"), Some(MemberSpec::Class(_))));
    assert!(matches!(manifest.members.get("inner"), Some(MemberSpec::Module(_))));
}

#[test]
fn unknown_member_kinds_are_rejected() {
    let parsed = serde_json::from_value::<ModuleManifest>(json!({
        "members": {"x": {"lambda": {}}}
    }));
    assert!(parsed.is_err());
}

#[rstest]
fn module_files_take_precedence_over_packages(workspace: TempDir) {
    fs::create_dir_all(workspace.path().join("pkg")).expect("create package");
    fs::write(workspace.path().join("pkg.json"), "{}").expect("write module");
    fs::write(workspace.path().join("pkg/__init__.json"), "{}").expect("write package");

    let found = locate("pkg", &search_path(&workspace)).expect("manifest should be found");
    assert_eq!(found, workspace.path().join("pkg.json"));
}

#[rstest]
fn earlier_entries_win(workspace: TempDir) {
    let second = TempDir::new().expect("second dir");
    fs::write(workspace.path().join("dup.json"), "{}").expect("write first");
    fs::write(second.path().join("dup.json"), "{}").expect("write second");
    let mut path = search_path(&workspace);
    path.push(second.path().to_path_buf());

    assert_eq!(locate("dup", &path), Some(workspace.path().join("dup.json")));
}

#[rstest]
fn dotted_names_map_to_directories(workspace: TempDir) {
    fs::create_dir_all(workspace.path().join("a/b")).expect("create dirs");
    fs::write(workspace.path().join("a/b/c.json"), "{}").expect("write module");
    assert_eq!(
        locate("a.b.c", &search_path(&workspace)),
        Some(workspace.path().join("a/b/c.json"))
    );
}

#[rstest]
fn read_reports_missing_files(workspace: TempDir) {
    let error = read(&workspace.path().join("absent.json")).expect_err("missing file");
    assert!(matches!(error, ImportError::ManifestRead { .. }));
}

#[test]
fn classes_construct_instances_with_methods() {
    let module = build(
        r#"{"members": {"MyClass": {"class": {
            "attributes": {"colour": "red"},
            "methods": {"describe": {"returns": "a red thing"}, "size": {"returns": 4}}
        }}}}"#,
    );
    let Some(Binding::Callable(class)) = module.item("MyClass") else {
        panic!("class should be callable");
    };
    let Returned::Binding(Binding::Instance(instance)) = class
        .call(vec![json!(1)], Map::new())
        .expect("construct instance")
    else {
        panic!("constructor should return an instance");
    };

    assert_eq!(public_callables(instance.as_ref()), vec!["describe", "size"]);
    assert!(matches!(instance.attribute("colour"), Some(Binding::Value(colour)) if colour == json!("red")));
    assert!(matches!(instance.attribute("args"), Some(Binding::Value(args)) if args == json!([1])));
}

#[test]
fn functions_return_declared_values() {
    let module = build(r#"{"members": {"answer": {"function": {"returns": 42}}}}"#);
    let Some(Binding::Callable(function)) = module.attribute("answer") else {
        panic!("function should be callable");
    };
    let returned = function.call(vec![json!("ignored")], Map::new()).expect("call");
    assert!(matches!(returned, Returned::Value(value) if value == json!(42)));
}

#[test]
fn module_dunder_attributes_are_internal() {
    let module = build(r#"{"members": {"f": {"function": {}}}}"#);
    assert!(matches!(module.attribute("__name__"), Some(Binding::Value(name)) if name == json!("mymodule")));
    assert!(module.item("__name__").is_none());
    assert_eq!(public_callables(&module), vec!["f"]);
}

#[test]
fn nested_modules_are_qualified() {
    let module = build(r#"{"members": {"inner": {"module": {"members": {}}}}}"#);
    let Some(Binding::Module(inner)) = module.item("inner") else {
        panic!("inner should be a module");
    };
    assert!(matches!(inner.object().attribute("__name__"), Some(Binding::Value(name)) if name == json!("mymodule.inner")));
}

#[test]
fn alias_without_module_is_invalid() {
    let manifest: ModuleManifest =
        serde_json::from_value(json!({"members": {"bad": {"alias": "sqrt"}}})).expect("parse");
    let error = ManifestModule::build("m", Path::new("m.json"), manifest, &mut no_aliases)
        .err()
        .expect("invalid alias");
    assert!(matches!(error, ImportError::InvalidAlias { .. }));
}
