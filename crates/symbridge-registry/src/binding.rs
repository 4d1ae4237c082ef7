//! The tagged binding model stored in the registry.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use strum::{Display, IntoStaticStr};

use crate::host::{self, HostCallable, HostObject};

/// Kind of a [`Binding`], used in diagnostics and reference payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum BindingKind {
    /// Nested mapping of names to bindings.
    Container,
    /// Imported module.
    Module,
    /// Function, bound method, or class.
    Callable,
    /// Object produced by a constructor.
    Instance,
    /// Plain wire value such as a module constant.
    Value,
}

/// A named entry in the registry.
#[derive(Clone)]
pub enum Binding {
    /// Mapping from name to binding.
    Container(Container),
    /// Module handle exposing keyed and attribute members.
    Module(ModuleBinding),
    /// Invocable handle.
    Callable(Arc<dyn HostCallable>),
    /// Instance handle exposing attribute members.
    Instance(Arc<dyn HostObject>),
    /// Non-callable wire value.
    Value(Value),
}

impl Binding {
    /// Wraps a module object with no children bound beneath it.
    #[must_use]
    pub fn module(object: Arc<dyn HostObject>) -> Self {
        Self::Module(ModuleBinding::new(object))
    }

    /// Returns the binding's kind.
    #[must_use]
    pub const fn kind(&self) -> BindingKind {
        match self {
            Self::Container(_) => BindingKind::Container,
            Self::Module(_) => BindingKind::Module,
            Self::Callable(_) => BindingKind::Callable,
            Self::Instance(_) => BindingKind::Instance,
            Self::Value(_) => BindingKind::Value,
        }
    }

    /// Returns `true` for callable bindings.
    #[must_use]
    pub const fn is_callable(&self) -> bool {
        matches!(self, Self::Callable(_))
    }

    /// Key-style lookup: container entries, then module children and items.
    #[must_use]
    pub fn keyed(&self, name: &str) -> Option<Self> {
        match self {
            Self::Container(container) => container.get(name).cloned(),
            Self::Module(module) => module.keyed(name),
            Self::Callable(_) | Self::Instance(_) | Self::Value(_) => None,
        }
    }

    /// Attribute-style lookup on module and instance handles.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<Self> {
        match self {
            Self::Module(module) => module.object().attribute(name),
            Self::Instance(object) => object.attribute(name),
            Self::Container(_) | Self::Callable(_) | Self::Value(_) => None,
        }
    }

    /// Resolves a member key-first, falling back to attribute lookup.
    #[must_use]
    pub fn member(&self, name: &str) -> Option<Self> {
        self.keyed(name).or_else(|| self.attribute(name))
    }

    /// Lists public callable member names.
    #[must_use]
    pub fn public_callables(&self) -> Vec<String> {
        match self {
            Self::Container(container) => container.public_callables(),
            Self::Module(module) => host::public_callables(module.object().as_ref()),
            Self::Instance(object) => host::public_callables(object.as_ref()),
            Self::Callable(_) | Self::Value(_) => Vec::new(),
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Container(container) => f.debug_tuple("Container").field(container).finish(),
            Self::Module(module) => f.debug_tuple("Module").field(module).finish(),
            Self::Callable(callable) => f.debug_tuple("Callable").field(&callable.name()).finish(),
            Self::Instance(object) => f.debug_tuple("Instance").field(&object.type_name()).finish(),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

/// A bound module and the dotted imports nested beneath its name.
///
/// Importing `os.path` after `os` stores `path` in the children of the `os`
/// binding. Children shadow the module's own items of the same name.
#[derive(Clone)]
pub struct ModuleBinding {
    object: Arc<dyn HostObject>,
    children: Container,
}

impl ModuleBinding {
    /// Wraps `object` with no children.
    #[must_use]
    pub fn new(object: Arc<dyn HostObject>) -> Self {
        Self {
            object,
            children: Container::new(),
        }
    }

    /// The module object.
    #[must_use]
    pub const fn object(&self) -> &Arc<dyn HostObject> {
        &self.object
    }

    /// Entries bound beneath the module's dotted name.
    #[must_use]
    pub const fn children(&self) -> &Container {
        &self.children
    }

    /// Looks up a child entry, then a module item.
    #[must_use]
    pub fn keyed(&self, name: &str) -> Option<Binding> {
        self.children
            .get(name)
            .cloned()
            .or_else(|| self.object.item(name))
    }

    /// Borrows a child entry without consulting the module's items.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Binding> {
        self.children.get(name)
    }

    fn adopt(&mut self, previous: Container) {
        for (name, binding) in previous.entries {
            self.children.entries.entry(name).or_insert(binding);
        }
    }
}

impl fmt::Debug for ModuleBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleBinding")
            .field("type_name", &self.object.type_name())
            .field("children", &self.children)
            .finish()
    }
}

/// Mapping from names to bindings. Iteration order is sorted by name.
#[derive(Debug, Clone, Default)]
pub struct Container {
    entries: BTreeMap<String, Binding>,
}

impl Container {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a direct entry.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.entries.get(name)
    }

    /// Looks up a direct entry mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Binding> {
        self.entries.get_mut(name)
    }

    /// Inserts or replaces an entry, returning the previous binding.
    ///
    /// A module replacing a container or another module keeps the entries
    /// nested beneath the old binding as its own children, so dotted imports
    /// survive a later import of their parent.
    pub fn insert(&mut self, key: impl Into<String>, mut binding: Binding) -> Option<Binding> {
        let name = key.into();
        if let Binding::Module(module) = &mut binding {
            match self.entries.get(&name) {
                Some(Binding::Container(nested)) => module.adopt(nested.clone()),
                Some(Binding::Module(previous)) => module.adopt(previous.children.clone()),
                _ => {}
            }
        }
        self.entries.insert(name, binding)
    }

    /// Returns the container nested under `name`, creating it when absent.
    ///
    /// A module binding yields its children, so `a.b` can be bound after `a`
    /// was imported whole.
    ///
    /// # Errors
    ///
    /// Returns the kind of the existing binding when `name` is bound to
    /// anything other than a container or module.
    pub fn container_mut(&mut self, name: &str) -> Result<&mut Self, BindingKind> {
        let entry = self
            .entries
            .entry(name.to_owned())
            .or_insert_with(|| Binding::Container(Self::new()));
        match entry {
            Binding::Container(container) => Ok(container),
            Binding::Module(module) => Ok(&mut module.children),
            other => Err(other.kind()),
        }
    }

    /// Returns `true` when `name` is bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Iterates over entry names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of direct entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the container has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lists public callable entry names.
    #[must_use]
    pub fn public_callables(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(name, binding)| host::is_public(name) && binding.is_callable())
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn container_lookup_is_keyed_only() {
        let mut inner = Container::new();
        inner.insert("answer", Binding::Value(json!(42)));
        let binding = Binding::Container(inner);

        assert!(matches!(binding.keyed("answer"), Some(Binding::Value(_))));
        assert!(binding.attribute("answer").is_none());
        assert!(matches!(binding.member("answer"), Some(Binding::Value(_))));
    }

    #[test]
    fn values_expose_no_members() {
        let binding = Binding::Value(json!("text"));
        assert!(binding.member("len").is_none());
        assert!(binding.public_callables().is_empty());
        assert_eq!(binding.kind(), BindingKind::Value);
    }

    #[test]
    fn replacing_an_entry_returns_previous() {
        let mut container = Container::new();
        assert!(container.insert("x", Binding::Value(json!(1))).is_none());
        let previous = container.insert("x", Binding::Value(json!(2)));
        assert!(matches!(previous, Some(Binding::Value(value)) if value == json!(1)));
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn container_mut_creates_and_refuses() {
        let mut root = Container::new();
        root.container_mut("os")
            .expect("create nested")
            .insert("sep", Binding::Value(json!("/")));
        assert!(root.container_mut("os").expect("existing").contains("sep"));

        root.insert("limit", Binding::Value(json!(10)));
        assert_eq!(root.container_mut("limit").err(), Some(BindingKind::Value));
    }

    /// Module with no members of its own.
    struct Bare;

    impl HostObject for Bare {
        fn type_name(&self) -> &str {
            "module"
        }

        fn item(&self, _name: &str) -> Option<Binding> {
            None
        }

        fn attribute(&self, _name: &str) -> Option<Binding> {
            None
        }

        fn member_names(&self) -> Vec<String> {
            Vec::new()
        }
    }

    #[test]
    fn modules_accept_nested_entries() {
        let mut root = Container::new();
        root.insert("os", Binding::module(Arc::new(Bare)));
        root.container_mut("os")
            .expect("module children")
            .insert("sep", Binding::Value(json!("/")));

        let os = root.get("os").expect("os bound");
        assert_eq!(os.kind(), BindingKind::Module);
        assert!(matches!(os.keyed("sep"), Some(Binding::Value(_))));
    }

    #[test]
    fn module_replacing_container_adopts_its_entries() {
        let mut root = Container::new();
        root.container_mut("pkg")
            .expect("create nested")
            .insert("sub", Binding::Value(json!(1)));
        let previous = root.insert("pkg", Binding::module(Arc::new(Bare)));

        assert!(matches!(previous, Some(Binding::Container(_))));
        let Some(Binding::Module(pkg)) = root.get("pkg") else {
            panic!("pkg should be a module");
        };
        assert!(pkg.child("sub").is_some());
    }

    #[test]
    fn kind_names_are_lowercase() {
        assert_eq!(BindingKind::Instance.to_string(), "instance");
        let name: &'static str = BindingKind::Container.into();
        assert_eq!(name, "container");
    }
}
