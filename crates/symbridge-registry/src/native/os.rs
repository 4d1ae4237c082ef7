//! The `os` module and its `os.path` sub-module.

use std::env;
use std::path::{MAIN_SEPARATOR_STR, Path, PathBuf};

use serde_json::Value;

use super::{NativeModule, value_result};
use crate::error::InvocationError;
use crate::host::Returned;
use crate::signature::{BoundArgs, Param};

pub(super) fn module() -> NativeModule {
    NativeModule::new("os")
        .constant("sep", Value::from(MAIN_SEPARATOR_STR))
        .function("getcwd", &[], getcwd)
        .function(
            "getenv",
            &[Param::required("key"), Param::optional("default")],
            getenv,
        )
        .submodule("path", path_module())
}

pub(super) fn path_module() -> NativeModule {
    NativeModule::new("os.path")
        .function(
            "join",
            &[Param::required("path"), Param::variadic("paths")],
            join,
        )
        .function("basename", &[Param::required("p")], basename)
        .function("dirname", &[Param::required("p")], dirname)
        .function("splitext", &[Param::required("p")], splitext)
        .function("isabs", &[Param::required("s")], isabs)
        .function("exists", &[Param::required("path")], exists)
}

fn lossy(path: &Path) -> Value {
    Value::from(path.to_string_lossy().into_owned())
}

fn getcwd(args: &BoundArgs) -> Result<Returned, InvocationError> {
    env::current_dir()
        .map(|cwd| Returned::Value(lossy(&cwd)))
        .map_err(|error| InvocationError::raised(args.function(), error.to_string()))
}

fn getenv(args: &BoundArgs) -> Result<Returned, InvocationError> {
    let key = args.str("key")?;
    match env::var(key) {
        Ok(value) => value_result(value),
        Err(_) => value_result(args.get("default").cloned().unwrap_or(Value::Null)),
    }
}

fn join(args: &BoundArgs) -> Result<Returned, InvocationError> {
    let mut joined = PathBuf::from(args.str("path")?);
    for part in args.rest("paths") {
        let segment = part.as_str().ok_or_else(|| {
            InvocationError::type_error(args.function(), "path components must be strings")
        })?;
        joined.push(segment);
    }
    value_result(lossy(&joined))
}

fn basename(args: &BoundArgs) -> Result<Returned, InvocationError> {
    let path = args.str("p")?;
    let tail = path.rsplit_once('/').map_or(path, |(_, tail)| tail);
    value_result(tail)
}

fn dirname(args: &BoundArgs) -> Result<Returned, InvocationError> {
    let path = args.str("p")?;
    let head = match path.rsplit_once('/') {
        Some(("", _)) => "/",
        Some((head, _)) => head,
        None => "",
    };
    value_result(head)
}

fn splitext(args: &BoundArgs) -> Result<Returned, InvocationError> {
    let path = args.str("p")?;
    let name_start = path.rfind('/').map_or(0, |index| index + 1);
    let name = path.get(name_start..).unwrap_or_default();
    let leading_dots = name.len() - name.trim_start_matches('.').len();
    let split = name
        .rfind('.')
        .filter(|&dot| dot > leading_dots)
        .map(|dot| name_start + dot);
    let (root, ext) = split.map_or((path, ""), |index| path.split_at(index));
    value_result(Value::Array(vec![Value::from(root), Value::from(ext)]))
}

fn isabs(args: &BoundArgs) -> Result<Returned, InvocationError> {
    value_result(Path::new(args.str("s")?).is_absolute())
}

fn exists(args: &BoundArgs) -> Result<Returned, InvocationError> {
    value_result(Path::new(args.str("path")?).exists())
}
