//! The `collections` module. Only `Counter` is provided.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{Map, Value};

use super::{NativeModule, value_result};
use crate::binding::Binding;
use crate::error::InvocationError;
use crate::host::{HostCallable, HostObject, Returned};
use crate::signature::{BoundArgs, Param, Signature};

pub(super) fn module() -> NativeModule {
    NativeModule::new("collections").class(Arc::new(CounterClass::new()))
}

type Tally = BTreeMap<String, i64>;

/// Constructor for `Counter` instances.
struct CounterClass {
    signature: Signature,
}

impl CounterClass {
    fn new() -> Self {
        Self {
            signature: Signature::new("Counter", &[Param::optional("iterable")]),
        }
    }
}

impl HostCallable for CounterClass {
    fn name(&self) -> &str {
        "Counter"
    }

    fn call(&self, args: Vec<Value>, kwargs: Map<String, Value>) -> Result<Returned, InvocationError> {
        let bound = self.signature.bind(args, kwargs)?;
        let mut tally = Tally::new();
        if let Some(iterable) = bound.get("iterable") {
            add_counts(bound.function(), &mut tally, iterable)?;
        }
        let instance = CounterInstance {
            tally: Arc::new(Mutex::new(tally)),
        };
        Ok(Returned::Binding(Binding::Instance(Arc::new(instance))))
    }
}

/// Adds the elements of `iterable` to `tally`.
///
/// Strings count their characters, arrays count their scalar elements, and
/// objects add their integer values to the matching keys. The tally is left
/// untouched when any element is rejected or a count would overflow.
fn add_counts(function: &str, tally: &mut Tally, iterable: &Value) -> Result<(), InvocationError> {
    let mut updated = tally.clone();
    match iterable {
        Value::String(text) => {
            for ch in text.chars() {
                bump(function, &mut updated, ch.to_string(), 1)?;
            }
        }
        Value::Array(items) => {
            for item in items {
                bump(function, &mut updated, element_key(function, item)?, 1)?;
            }
        }
        Value::Object(counts) => {
            for (key, count) in counts {
                let delta = count.as_i64().ok_or_else(|| {
                    InvocationError::type_error(function, format!("count for '{key}' must be an integer"))
                })?;
                bump(function, &mut updated, key.clone(), delta)?;
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {
            return Err(InvocationError::type_error(
                function,
                "argument 'iterable' must be a string, list, or mapping",
            ));
        }
    }
    *tally = updated;
    Ok(())
}

fn bump(function: &str, tally: &mut Tally, key: String, delta: i64) -> Result<(), InvocationError> {
    let count = tally.entry(key).or_default();
    *count = count
        .checked_add(delta)
        .ok_or_else(|| overflow(function))?;
    Ok(())
}

fn total(function: &str, tally: &Tally) -> Result<i64, InvocationError> {
    tally
        .values()
        .try_fold(0_i64, |sum, count| sum.checked_add(*count))
        .ok_or_else(|| overflow(function))
}

fn overflow(function: &str) -> InvocationError {
    InvocationError::value_error(function, "count overflow")
}

fn element_key(function: &str, item: &Value) -> Result<String, InvocationError> {
    match item {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Null => Ok(String::from("null")),
        Value::Array(_) | Value::Object(_) => Err(InvocationError::type_error(
            function,
            "counted elements must be scalars",
        )),
    }
}

const METHODS: [CounterMethod; 4] = [
    CounterMethod::Get,
    CounterMethod::MostCommon,
    CounterMethod::Total,
    CounterMethod::Update,
];

/// Instance produced by calling `Counter`.
struct CounterInstance {
    tally: Arc<Mutex<Tally>>,
}

impl CounterInstance {
    fn bound_method(&self, method: CounterMethod) -> Binding {
        Binding::Callable(Arc::new(BoundCounterMethod {
            method,
            signature: method.signature(),
            tally: Arc::clone(&self.tally),
        }))
    }
}

impl HostObject for CounterInstance {
    fn type_name(&self) -> &str {
        "Counter"
    }

    fn attribute(&self, name: &str) -> Option<Binding> {
        if name == "counts" {
            let snapshot = lock(&self.tally, "counts").ok()?;
            let counts = snapshot
                .iter()
                .map(|(key, count)| (key.clone(), Value::from(*count)))
                .collect();
            return Some(Binding::Value(Value::Object(counts)));
        }
        METHODS
            .into_iter()
            .find(|method| method.name() == name)
            .map(|method| self.bound_method(method))
    }

    fn member_names(&self) -> Vec<String> {
        let mut names: Vec<String> = METHODS
            .iter()
            .map(|method| method.name().to_owned())
            .collect();
        names.push(String::from("counts"));
        names.sort();
        names
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CounterMethod {
    Get,
    MostCommon,
    Total,
    Update,
}

impl CounterMethod {
    const fn name(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::MostCommon => "most_common",
            Self::Total => "total",
            Self::Update => "update",
        }
    }

    fn signature(self) -> Signature {
        let params: &[Param] = match self {
            Self::Get => &[Param::required("key"), Param::optional("default")],
            Self::MostCommon => &[Param::optional("n")],
            Self::Total => &[],
            Self::Update => &[Param::optional("iterable")],
        };
        Signature::new(self.name(), params)
    }
}

/// A `Counter` method bound to one instance's state.
struct BoundCounterMethod {
    method: CounterMethod,
    signature: Signature,
    tally: Arc<Mutex<Tally>>,
}

impl HostCallable for BoundCounterMethod {
    fn name(&self) -> &str {
        self.method.name()
    }

    fn call(&self, args: Vec<Value>, kwargs: Map<String, Value>) -> Result<Returned, InvocationError> {
        let bound = self.signature.bind(args, kwargs)?;
        let mut tally = lock(&self.tally, self.method.name())?;
        match self.method {
            CounterMethod::Get => get(&bound, &tally),
            CounterMethod::MostCommon => most_common(&bound, &tally),
            CounterMethod::Total => value_result(total(bound.function(), &tally)?),
            CounterMethod::Update => {
                if let Some(iterable) = bound.get("iterable") {
                    add_counts(bound.function(), &mut tally, iterable)?;
                }
                value_result(Value::Null)
            }
        }
    }
}

fn lock<'a>(tally: &'a Mutex<Tally>, function: &str) -> Result<MutexGuard<'a, Tally>, InvocationError> {
    tally
        .lock()
        .map_err(|_| InvocationError::raised(function, "counter state poisoned"))
}

fn get(args: &BoundArgs, tally: &Tally) -> Result<Returned, InvocationError> {
    let key = element_key(args.function(), args.get("key").unwrap_or(&Value::Null))?;
    match tally.get(&key) {
        Some(count) => value_result(*count),
        None => value_result(args.get("default").cloned().unwrap_or_else(|| Value::from(0))),
    }
}

fn most_common(args: &BoundArgs, tally: &Tally) -> Result<Returned, InvocationError> {
    let mut ranked: Vec<(&String, &i64)> = tally.iter().collect();
    ranked.sort_by(|left, right| right.1.cmp(left.1));
    let limit = args
        .opt_u64("n")?
        .map_or(ranked.len(), |n| usize::try_from(n).unwrap_or(usize::MAX));
    let pairs = ranked
        .into_iter()
        .take(limit)
        .map(|(key, count)| Value::Array(vec![Value::from(key.as_str()), Value::from(*count)]))
        .collect();
    value_result(Value::Array(pairs))
}
