//! Rust-native modules shipped with the worker.
//!
//! Each module is assembled from [`NativeFunction`]s, constants, classes,
//! and sub-modules through the [`NativeModule`] builder. The
//! [`NativeCatalogue`] maps dotted module names to builders so the loader can
//! import them without touching the filesystem.

mod collections;
mod json;
mod math;
mod os;


use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Number, Value};

use crate::binding::Binding;
use crate::error::InvocationError;
use crate::host::{HostCallable, HostObject, Returned};
use crate::signature::{BoundArgs, Param, Signature};

/// Body of a native function.
pub type NativeBody = fn(&BoundArgs) -> Result<Returned, InvocationError>;

/// A stateless function implemented in Rust.
pub struct NativeFunction {
    signature: Signature,
    body: NativeBody,
}

impl NativeFunction {
    /// Creates a function with the given parameters and body.
    pub fn new(name: &str, params: &[Param], body: NativeBody) -> Self {
        Self {
            signature: Signature::new(name, params),
            body,
        }
    }
}

impl HostCallable for NativeFunction {
    fn name(&self) -> &str {
        self.signature.function()
    }

    fn call(&self, args: Vec<Value>, kwargs: Map<String, Value>) -> Result<Returned, InvocationError> {
        let bound = self.signature.bind(args, kwargs)?;
        (self.body)(&bound)
    }
}

/// A module whose members are defined in Rust.
pub struct NativeModule {
    name: String,
    members: BTreeMap<String, Binding>,
}

impl NativeModule {
    /// Starts an empty module called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: BTreeMap::new(),
        }
    }

    /// Adds a function member.
    #[must_use]
    pub fn function(mut self, name: &str, params: &[Param], body: NativeBody) -> Self {
        let function = NativeFunction::new(name, params, body);
        self.members
            .insert(name.to_owned(), Binding::Callable(Arc::new(function)));
        self
    }

    /// Adds a constant member.
    #[must_use]
    pub fn constant(mut self, name: &str, value: Value) -> Self {
        self.members.insert(name.to_owned(), Binding::Value(value));
        self
    }

    /// Adds a class (or any other callable) member.
    #[must_use]
    pub fn class(mut self, class: Arc<dyn HostCallable>) -> Self {
        self.members
            .insert(class.name().to_owned(), Binding::Callable(class));
        self
    }

    /// Adds a nested module member.
    #[must_use]
    pub fn submodule(mut self, name: &str, module: Self) -> Self {
        self.members
            .insert(name.to_owned(), Binding::module(Arc::new(module)));
        self
    }

    /// Module name as it was imported.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl HostObject for NativeModule {
    fn type_name(&self) -> &str {
        "module"
    }

    fn item(&self, name: &str) -> Option<Binding> {
        self.members.get(name).cloned()
    }

    fn attribute(&self, name: &str) -> Option<Binding> {
        if name == "__name__" {
            return Some(Binding::Value(Value::String(self.name.clone())));
        }
        self.members.get(name).cloned()
    }

    fn member_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.members.keys().cloned().collect();
        names.push(String::from("__name__"));
        names.sort();
        names
    }
}

/// Builder for a native module.
pub type ModuleBuilder = fn() -> NativeModule;

/// Registry of native module builders keyed by dotted name.
#[derive(Clone)]
pub struct NativeCatalogue {
    builders: BTreeMap<&'static str, ModuleBuilder>,
}

impl NativeCatalogue {
    /// Catalogue without any modules.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            builders: BTreeMap::new(),
        }
    }

    /// Catalogue holding every built-in module.
    #[must_use]
    pub fn standard() -> Self {
        Self::empty()
            .with("math", math::module)
            .with("os", os::module)
            .with("os.path", os::path_module)
            .with("json", json::module)
            .with("collections", collections::module)
    }

    /// Adds or replaces a module builder.
    #[must_use]
    pub fn with(mut self, name: &'static str, builder: ModuleBuilder) -> Self {
        self.builders.insert(name, builder);
        self
    }

    /// Builds the named module, if known.
    #[must_use]
    pub fn build(&self, name: &str) -> Option<NativeModule> {
        self.builders.get(name).map(|builder| builder())
    }

    /// Names of every catalogued module.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.builders.keys().copied()
    }
}

impl Default for NativeCatalogue {
    fn default() -> Self {
        Self::standard()
    }
}

/// Converts a float result into a wire number.
///
/// # Errors
///
/// Returns a value error for NaN and infinities, which JSON cannot carry.
pub(crate) fn float_result(function: &str, value: f64) -> Result<Returned, InvocationError> {
    Number::from_f64(value)
        .map(|number| Returned::Value(Value::Number(number)))
        .ok_or_else(|| InvocationError::value_error(function, "math range error"))
}

/// Wraps a plain value as a call result.
pub(crate) fn value_result(value: impl Into<Value>) -> Result<Returned, InvocationError> {
    Ok(Returned::Value(value.into()))
}
