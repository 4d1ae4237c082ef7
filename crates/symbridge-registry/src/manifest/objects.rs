//! Host objects materialised from manifest declarations.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::{ClassSpec, MemberSpec, ModuleManifest};
use crate::binding::Binding;
use crate::error::{ImportError, InvocationError};
use crate::host::{HostCallable, HostObject, Returned};

/// Resolves an alias target (`module`, `member`) to a binding.
pub type AliasResolver<'a> = dyn FnMut(&str, &str) -> Result<Binding, ImportError> + 'a;

/// A module declared by a manifest file.
pub struct ManifestModule {
    name: String,
    file: PathBuf,
    members: BTreeMap<String, Binding>,
}

impl ManifestModule {
    /// Builds the module `name` from its parsed manifest.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::InvalidAlias`] for alias targets without a
    /// module part, and whatever `aliases` reports for unresolvable targets.
    pub fn build(
        name: &str,
        file: &Path,
        manifest: ModuleManifest,
        aliases: &mut AliasResolver<'_>,
    ) -> Result<Self, ImportError> {
        let mut members = BTreeMap::new();
        for (member, spec) in manifest.members {
            let binding = match spec {
                MemberSpec::Value(value) => Binding::Value(value),
                MemberSpec::Function(function) => Binding::Callable(Arc::new(ManifestFunction {
                    name: member.clone(),
                    returns: function.returns,
                })),
                MemberSpec::Class(class) => {
                    Binding::Callable(Arc::new(ManifestClass::new(&member, class)))
                }
                MemberSpec::Module(nested) => {
                    let qualified = format!("{name}.{member}");
                    Binding::module(Arc::new(Self::build(&qualified, file, nested, aliases)?))
                }
                MemberSpec::Alias(target) => {
                    let Some((module, leaf)) = target.rsplit_once('.') else {
                        return Err(ImportError::InvalidAlias {
                            module: name.to_owned(),
                            alias: member,
                            target,
                        });
                    };
                    aliases(module, leaf)?
                }
            };
            members.insert(member, binding);
        }
        Ok(Self {
            name: name.to_owned(),
            file: file.to_path_buf(),
            members,
        })
    }

    /// Dotted module name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl HostObject for ManifestModule {
    fn type_name(&self) -> &str {
        "module"
    }

    fn item(&self, name: &str) -> Option<Binding> {
        self.members.get(name).cloned()
    }

    fn attribute(&self, name: &str) -> Option<Binding> {
        match name {
            "__name__" => Some(Binding::Value(Value::from(self.name.as_str()))),
            "__file__" => Some(Binding::Value(Value::from(
                self.file.to_string_lossy().into_owned(),
            ))),
            _ => self.members.get(name).cloned(),
        }
    }

    fn member_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.members.keys().cloned().collect();
        names.extend([String::from("__file__"), String::from("__name__")]);
        names.sort();
        names
    }
}

/// Function or method returning a declared value regardless of arguments.
pub struct ManifestFunction {
    name: String,
    returns: Value,
}

impl HostCallable for ManifestFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, _args: Vec<Value>, _kwargs: Map<String, Value>) -> Result<Returned, InvocationError> {
        Ok(Returned::Value(self.returns.clone()))
    }
}

/// Constructor declared by a manifest `class` member.
pub struct ManifestClass {
    name: String,
    attributes: BTreeMap<String, Value>,
    methods: BTreeMap<String, Value>,
}

impl ManifestClass {
    fn new(name: &str, spec: ClassSpec) -> Self {
        Self {
            name: name.to_owned(),
            attributes: spec.attributes,
            methods: spec
                .methods
                .into_iter()
                .map(|(method, function)| (method, function.returns))
                .collect(),
        }
    }
}

impl HostCallable for ManifestClass {
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, args: Vec<Value>, kwargs: Map<String, Value>) -> Result<Returned, InvocationError> {
        let mut attributes = self.attributes.clone();
        attributes.insert(String::from("args"), Value::Array(args));
        attributes.insert(String::from("kwargs"), Value::Object(kwargs));
        let instance = ManifestInstance {
            class: self.name.clone(),
            attributes,
            methods: self.methods.clone(),
        };
        Ok(Returned::Binding(Binding::Instance(Arc::new(instance))))
    }
}

/// Object produced by calling a [`ManifestClass`].
pub struct ManifestInstance {
    class: String,
    attributes: BTreeMap<String, Value>,
    methods: BTreeMap<String, Value>,
}

impl HostObject for ManifestInstance {
    fn type_name(&self) -> &str {
        &self.class
    }

    fn attribute(&self, name: &str) -> Option<Binding> {
        if let Some(returns) = self.methods.get(name) {
            return Some(Binding::Callable(Arc::new(ManifestFunction {
                name: name.to_owned(),
                returns: returns.clone(),
            })));
        }
        self.attributes.get(name).cloned().map(Binding::Value)
    }

    fn member_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .methods
            .keys()
            .chain(self.attributes.keys())
            .cloned()
            .collect();
        names.sort();
        names.dedup();
        names
    }
}
