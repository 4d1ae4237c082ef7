//! `import name` and `from name import ...` binding strategies.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info};

use super::Registry;
use crate::REGISTRY_TARGET;
use crate::binding::Binding;
use crate::error::{ImportError, RegistryError};
use crate::host::{self, HostObject};

/// How imported members are bound, derived from the request's `from_list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportStrategy {
    /// Bind the whole module under its dotted name.
    Whole,
    /// Bind every public callable under its own name.
    Star,
    /// Bind the listed members under their own names.
    Members(Vec<String>),
}

impl ImportStrategy {
    /// Chooses the strategy for a `from_list`.
    #[must_use]
    pub fn from_list(from_list: &[String]) -> Self {
        match from_list {
            [] => Self::Whole,
            [only] if only == "*" => Self::Star,
            members => Self::Members(members.to_vec()),
        }
    }
}

impl Registry {
    /// Imports module `name` and binds it according to `from_list`.
    ///
    /// Members are bound as they are processed, so a failure part way
    /// through a `from_list` leaves the earlier members bound.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Import`] when the module or a listed member
    /// cannot be loaded, and [`RegistryError::Bind`] when a binding collides
    /// with an existing non-container entry.
    pub fn import(&mut self, name: &str, from_list: &[String]) -> Result<Value, RegistryError> {
        let module = self.load(name)?;
        let strategy = ImportStrategy::from_list(from_list);
        info!(target: REGISTRY_TARGET, module = name, ?strategy, "importing module");
        match strategy {
            ImportStrategy::Whole => self.import_whole(name, module),
            ImportStrategy::Star => Ok(self.import_star(module.as_ref())),
            ImportStrategy::Members(members) => self.import_members(name, module.as_ref(), &members),
        }
    }

    fn import_whole(&mut self, name: &str, module: Arc<dyn HostObject>) -> Result<Value, RegistryError> {
        let members = host::public_callables(module.as_ref());
        self.bind_dotted(name, Binding::module(module))?;
        Ok(module_summary(name, members))
    }

    fn import_star(&mut self, module: &dyn HostObject) -> Value {
        let names = host::public_callables(module);
        for member in &names {
            if let Some(binding) = host::lookup_member(module, member) {
                self.bind(member.as_str(), binding);
            }
        }
        debug!(target: REGISTRY_TARGET, count = names.len(), "bound star import");
        Value::from(names)
    }

    fn import_members(
        &mut self,
        name: &str,
        module: &dyn HostObject,
        members: &[String],
    ) -> Result<Value, RegistryError> {
        let mut bound = Vec::with_capacity(members.len());
        for member in members {
            let entry = match host::lookup_member(module, member) {
                Some(Binding::Module(submodule)) => {
                    self.bind_submodule(member, Arc::clone(submodule.object()))
                }
                Some(binding) => {
                    self.bind(member.as_str(), binding);
                    Value::from(member.as_str())
                }
                None => {
                    let submodule = self.load_submodule(name, member)?;
                    self.bind_submodule(member, submodule)
                }
            };
            bound.push(entry);
        }
        Ok(Value::Array(bound))
    }

    fn bind_submodule(&mut self, member: &str, submodule: Arc<dyn HostObject>) -> Value {
        let members = host::public_callables(submodule.as_ref());
        self.bind(member, Binding::module(submodule));
        module_summary(member, members)
    }

    /// Loads `name.member` as a package sub-module that the package itself
    /// does not declare.
    fn load_submodule(&self, name: &str, member: &str) -> Result<Arc<dyn HostObject>, RegistryError> {
        let qualified = format!("{name}.{member}");
        match self.loader.load(&qualified, &self.search_path) {
            Ok(submodule) => Ok(submodule),
            Err(ImportError::ModuleNotFound { .. }) => Err(RegistryError::import(
                name,
                ImportError::MissingMember {
                    module: name.to_owned(),
                    member: member.to_owned(),
                },
            )),
            Err(other) => Err(RegistryError::import(qualified, other)),
        }
    }
}

fn module_summary(name: &str, members: Vec<String>) -> Value {
    let mut summary = Map::new();
    summary.insert(String::from("module"), Value::from(name));
    summary.insert(String::from("members"), Value::from(members));
    Value::Object(summary)
}
