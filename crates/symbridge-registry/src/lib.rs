//! Dynamic symbol registry for the symbridge worker.
//!
//! The registry holds a tree of named [`Binding`]s populated by imports and
//! class instantiation, and resolves dotted paths against it so callables can
//! be invoked by name. Modules come from a [`ModuleLoader`]; the shipped
//! [`StandardLoader`] serves Rust-native modules and JSON manifests found on
//! the [`SearchPath`].
//!
//! ```text
//! IMPORT math [sqrt] -> Registry::import -> StandardLoader -> bind "sqrt"
//! RUN "" sqrt [9]     -> Registry::run    -> resolve -> HostCallable::call
//! ```

mod binding;
mod error;
mod host;
mod loader;
pub mod manifest;
pub mod native;
mod registry;
mod search_path;
mod signature;

/// Tracing target for registry events.
pub(crate) const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");

pub use binding::{Binding, BindingKind, Container, ModuleBinding};
pub use error::{ImportError, InvocationError, RegistryError};
pub use host::{
    HostCallable, HostObject, INTERNAL_PREFIX, ModuleLoader, Returned, is_public, lookup_member,
    public_callables,
};
pub use loader::StandardLoader;
pub use registry::{ImportStrategy, REF_PREFIX, Registry};
pub use search_path::SearchPath;
pub use signature::{BoundArgs, Param, ParamKind, Signature};
