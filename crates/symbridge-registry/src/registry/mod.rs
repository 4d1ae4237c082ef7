//! The process-scoped binding tree and its dotted-path resolver.
//!
//! A [`Registry`] owns the root [`Container`], the [`SearchPath`] consulted by
//! imports, and the [`ModuleLoader`] that performs them. Entries are only ever
//! added or replaced, never removed.

mod importer;
mod instantiate;


use std::borrow::Cow;
use std::env;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

pub use self::importer::ImportStrategy;
use crate::REGISTRY_TARGET;
use crate::binding::{Binding, Container};
use crate::error::{InvocationError, RegistryError};
use crate::host::{HostObject, ModuleLoader, Returned};
use crate::loader::StandardLoader;
use crate::search_path::SearchPath;

/// Prefix of keys generated for handles returned by calls.
pub const REF_PREFIX: &str = "__ref_";

/// The registry of named bindings.
pub struct Registry {
    root: Container,
    search_path: SearchPath,
    loader: Arc<dyn ModuleLoader>,
    next_ref: u64,
}

impl Registry {
    /// Creates an empty registry backed by the [`StandardLoader`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_loader(Arc::new(StandardLoader::default()))
    }

    /// Creates an empty registry importing through `loader`.
    #[must_use]
    pub fn with_loader(loader: Arc<dyn ModuleLoader>) -> Self {
        Self {
            root: Container::new(),
            search_path: SearchPath::new(),
            loader,
            next_ref: 0,
        }
    }

    /// The root container.
    #[must_use]
    pub const fn root(&self) -> &Container {
        &self.root
    }

    /// Looks up a top-level binding.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.root.get(name)
    }

    /// Binds `binding` under a top-level key, replacing any previous entry.
    pub fn bind(&mut self, name: impl Into<String>, binding: Binding) -> Option<Binding> {
        self.root.insert(name, binding)
    }

    /// Binds `binding` under a dotted name, creating intermediate containers.
    ///
    /// An intermediate module keeps its place; the rest of the name is bound
    /// among its children.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Bind`] when the name has an empty segment or
    /// an intermediate segment is bound to something other than a container
    /// or module.
    pub fn bind_dotted(&mut self, name: &str, binding: Binding) -> Result<(), RegistryError> {
        let Some((parents, leaf)) = split_dotted(name) else {
            return Err(RegistryError::bind(name, "name has an empty segment"));
        };
        let mut current = &mut self.root;
        for segment in parents {
            current = current.container_mut(segment).map_err(|kind| {
                RegistryError::bind(name, format!("'{segment}' is already bound to a {kind}"))
            })?;
        }
        current.insert(leaf, binding);
        debug!(target: REGISTRY_TARGET, name, "bound registry entry");
        Ok(())
    }

    /// Resolves `leaf` within the binding at dotted `path`.
    ///
    /// An empty `path` searches the root. Each path segment descends through
    /// containers by key and through modules by keyed member. The leaf is
    /// looked up key-first, then as an attribute.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when a segment or the leaf cannot
    /// be resolved.
    pub fn resolve(&self, path: &str, leaf: &str) -> Result<Binding, RegistryError> {
        let qualified = qualify(path, leaf);
        let found = match self.scope(path)? {
            None => self.root.get(leaf).cloned(),
            Some(scope) => scope.member(leaf),
        };
        found.ok_or_else(|| RegistryError::not_found(qualified))
    }

    fn scope(&self, path: &str) -> Result<Option<Cow<'_, Binding>>, RegistryError> {
        if path.is_empty() {
            return Ok(None);
        }
        let mut segments = path.split('.');
        let first = segments.next().unwrap_or(path);
        let mut current = self
            .root
            .get(first)
            .map(Cow::Borrowed)
            .ok_or_else(|| RegistryError::not_found(first))?;
        let mut walked = first.to_owned();
        for segment in segments {
            walked.push('.');
            walked.push_str(segment);
            current = step(current, segment).ok_or_else(|| RegistryError::not_found(&walked))?;
        }
        Ok(Some(current))
    }

    /// Resolves and invokes a callable, encoding the result for the wire.
    ///
    /// Handles that cannot be sent as JSON are bound under a generated
    /// `__ref_<n>` key and described by a reference object.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when the callable cannot be
    /// resolved and [`RegistryError::Invocation`] when it is not callable or
    /// fails.
    pub fn run(
        &mut self,
        module: &str,
        function: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> Result<Value, RegistryError> {
        let target = self.resolve(module, function)?;
        let returned = invoke(&qualify(module, function), &target, args, kwargs)?;
        Ok(self.encode(returned))
    }

    fn encode(&mut self, returned: Returned) -> Value {
        match returned {
            Returned::Value(value) | Returned::Binding(Binding::Value(value)) => value,
            Returned::Binding(binding) => self.bind_reference(binding),
        }
    }

    fn bind_reference(&mut self, binding: Binding) -> Value {
        self.next_ref += 1;
        let key = format!("{REF_PREFIX}{}", self.next_ref);
        let mut reference = Map::new();
        reference.insert(String::from("ref"), Value::from(key.as_str()));
        reference.insert(String::from("kind"), Value::from(<&str>::from(binding.kind())));
        reference.insert(
            String::from("members"),
            Value::from(binding.public_callables()),
        );
        debug!(target: REGISTRY_TARGET, key = %key, kind = %binding.kind(), "bound returned handle");
        self.root.insert(key, binding);
        Value::Object(reference)
    }

    /// Appends entries, joined onto the working directory, to the search
    /// path. Returns the number of entries added.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Path`] when the working directory is
    /// unavailable or an entry cannot form a path.
    pub fn set_path<I, P>(&mut self, entries: I) -> Result<usize, RegistryError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let cwd = env::current_dir().map_err(|error| {
            RegistryError::path("cannot determine the working directory", Some(error))
        })?;
        self.search_path.extend_from(&cwd, entries)
    }

    /// Directories consulted by imports.
    #[must_use]
    pub const fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    fn load(&self, name: &str) -> Result<Arc<dyn HostObject>, RegistryError> {
        self.loader
            .load(name, &self.search_path)
            .map_err(|source| RegistryError::import(name, source))
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("root", &self.root)
            .field("search_path", &self.search_path)
            .field("next_ref", &self.next_ref)
            .finish_non_exhaustive()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Invokes a resolved binding, rejecting anything that is not callable.
fn invoke(
    name: &str,
    target: &Binding,
    args: Vec<Value>,
    kwargs: Map<String, Value>,
) -> Result<Returned, RegistryError> {
    match target {
        Binding::Callable(callable) => Ok(callable.call(args, kwargs)?),
        other => Err(InvocationError::not_callable(name, other.kind().into()).into()),
    }
}

/// Descends one path segment, borrowing registry entries where possible.
fn step<'a>(current: Cow<'a, Binding>, segment: &str) -> Option<Cow<'a, Binding>> {
    match current {
        Cow::Borrowed(Binding::Container(container)) => container.get(segment).map(Cow::Borrowed),
        Cow::Borrowed(Binding::Module(module)) => module
            .child(segment)
            .map(Cow::Borrowed)
            .or_else(|| module.object().item(segment).map(Cow::Owned)),
        other => other.keyed(segment).map(Cow::Owned),
    }
}

fn qualify(path: &str, leaf: &str) -> String {
    if path.is_empty() {
        leaf.to_owned()
    } else {
        format!("{path}.{leaf}")
    }
}

/// Splits a dotted name into its parent segments and leaf.
fn split_dotted(name: &str) -> Option<(Vec<&str>, &str)> {
    let mut segments: Vec<&str> = name.split('.').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return None;
    }
    let leaf = segments.pop()?;
    Some((segments, leaf))
}
