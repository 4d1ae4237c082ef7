//! The `json` module: text encoding of wire values.

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{PrettyFormatter, Serializer};

use super::{NativeModule, value_result};
use crate::error::InvocationError;
use crate::host::Returned;
use crate::signature::{BoundArgs, Param};

pub(super) fn module() -> NativeModule {
    NativeModule::new("json")
        .function(
            "dumps",
            &[
                Param::required("obj"),
                Param::optional("indent"),
                Param::optional("sort_keys"),
            ],
            dumps,
        )
        .function("loads", &[Param::required("s")], loads)
}

fn dumps(args: &BoundArgs) -> Result<Returned, InvocationError> {
    let raw = args.get("obj").unwrap_or(&Value::Null);
    let sort_keys = match args.get("sort_keys") {
        None => false,
        Some(Value::Bool(flag)) => *flag,
        Some(_) => {
            return Err(InvocationError::type_error(
                args.function(),
                "argument 'sort_keys' must be a boolean",
            ));
        }
    };
    let sorted_copy;
    let obj = if sort_keys {
        sorted_copy = sorted(raw);
        &sorted_copy
    } else {
        raw
    };
    let text = match args.opt_u64("indent")? {
        None => serde_json::to_string(obj).map_err(|error| encode_error(args, &error))?,
        Some(width) => indented(args, obj, width)?,
    };
    value_result(text)
}

/// Rebuilds objects with their keys inserted in sorted order.
fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let rebuilt = keys
                .into_iter()
                .filter_map(|key| map.get(key).map(|item| (key.clone(), sorted(item))))
                .collect();
            Value::Object(rebuilt)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

fn indented(args: &BoundArgs, obj: &Value, width: u64) -> Result<String, InvocationError> {
    let indent = " ".repeat(usize::try_from(width).unwrap_or(usize::MAX).min(64));
    let mut buffer = Vec::new();
    let mut serializer =
        Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(indent.as_bytes()));
    obj.serialize(&mut serializer)
        .map_err(|error| encode_error(args, &error))?;
    String::from_utf8(buffer)
        .map_err(|error| InvocationError::raised(args.function(), error.to_string()))
}

fn encode_error(args: &BoundArgs, error: &serde_json::Error) -> InvocationError {
    InvocationError::raised(args.function(), error.to_string())
}

fn loads(args: &BoundArgs) -> Result<Returned, InvocationError> {
    let text = args.str("s")?;
    serde_json::from_str::<Value>(text)
        .map(Returned::Value)
        .map_err(|error| InvocationError::value_error(args.function(), error.to_string()))
}
