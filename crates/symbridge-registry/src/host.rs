//! Capability traits the registry binds against.
//!
//! The registry never reflects on values itself. Modules and instances are
//! reached through [`HostObject`], invocable handles through
//! [`HostCallable`], and imports through [`ModuleLoader`]. The built-in
//! native modules and the manifest loader are two implementations; tests
//! supply their own.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::binding::Binding;
use crate::error::{ImportError, InvocationError};
use crate::search_path::SearchPath;

/// Prefix marking a member name as internal.
pub const INTERNAL_PREFIX: &str = "__";

/// A module or object instance exposing named members.
pub trait HostObject: Send + Sync {
    /// Short type description used in diagnostics.
    fn type_name(&self) -> &str;

    /// Key-style lookup. Modules answer; plain instances usually do not.
    fn item(&self, name: &str) -> Option<Binding> {
        let _ = name;
        None
    }

    /// Attribute-style lookup on the underlying handle.
    fn attribute(&self, name: &str) -> Option<Binding>;

    /// Every member name, sorted.
    fn member_names(&self) -> Vec<String>;
}

/// An invocable handle: a function, bound method, or class constructor.
pub trait HostCallable: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Invokes the callable with positional and keyword arguments.
    ///
    /// # Errors
    ///
    /// Returns an [`InvocationError`] when the arguments are rejected or the
    /// target fails.
    fn call(&self, args: Vec<Value>, kwargs: Map<String, Value>) -> Result<Returned, InvocationError>;
}

/// Result of a successful call.
#[derive(Debug, Clone)]
pub enum Returned {
    /// A value representable on the wire.
    Value(Value),
    /// A handle that must stay inside the worker.
    Binding(Binding),
}

impl From<Value> for Returned {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Binding> for Returned {
    fn from(binding: Binding) -> Self {
        Self::Binding(binding)
    }
}

/// Performs dynamic imports for the registry.
pub trait ModuleLoader: Send + Sync {
    /// Loads the module with the given dotted name.
    ///
    /// # Errors
    ///
    /// Returns an [`ImportError`] when the module cannot be found or its
    /// source is malformed.
    fn load(&self, name: &str, search_path: &SearchPath) -> Result<Arc<dyn HostObject>, ImportError>;
}

impl<T> ModuleLoader for Arc<T>
where
    T: ModuleLoader + ?Sized,
{
    fn load(&self, name: &str, search_path: &SearchPath) -> Result<Arc<dyn HostObject>, ImportError> {
        (**self).load(name, search_path)
    }
}

/// Returns `true` when `name` does not use the internal prefix.
#[must_use]
pub fn is_public(name: &str) -> bool {
    !name.starts_with(INTERNAL_PREFIX)
}

/// Looks up a member key-first, then by attribute.
#[must_use]
pub fn lookup_member(object: &dyn HostObject, name: &str) -> Option<Binding> {
    object.item(name).or_else(|| object.attribute(name))
}

/// Lists the public members of `object` that can be invoked.
#[must_use]
pub fn public_callables(object: &dyn HostObject) -> Vec<String> {
    object
        .member_names()
        .into_iter()
        .filter(|name| is_public(name))
        .filter(|name| lookup_member(object, name).is_some_and(|member| member.is_callable()))
        .collect()
}
