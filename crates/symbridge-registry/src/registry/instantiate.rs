//! Constructing instances and binding them under an alias.

use serde_json::{Map, Value};
use tracing::info;

use super::{Registry, invoke};
use crate::REGISTRY_TARGET;
use crate::binding::Binding;
use crate::error::RegistryError;
use crate::host::Returned;

impl Registry {
    /// Calls the constructor at dotted path `class` and binds the result
    /// under `alias`, replacing any previous binding.
    ///
    /// Returns `{alias: [public callable members]}`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Bind`] for an empty or malformed alias,
    /// [`RegistryError::NotFound`] when the class cannot be resolved, and
    /// [`RegistryError::Invocation`] when construction fails.
    pub fn init_class(
        &mut self,
        class: &str,
        alias: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> Result<Value, RegistryError> {
        if alias.is_empty() {
            return Err(RegistryError::bind(alias, "alias must not be empty"));
        }
        let (path, name) = class.rsplit_once('.').unwrap_or(("", class));
        let constructor = self.resolve(path, name)?;
        let instance = match invoke(class, &constructor, args, kwargs)? {
            Returned::Binding(binding) => binding,
            Returned::Value(value) => Binding::Value(value),
        };
        let members = instance.public_callables();
        self.bind_dotted(alias, instance)?;
        info!(target: REGISTRY_TARGET, class, alias, "instantiated class");

        let mut body = Map::new();
        body.insert(alias.to_owned(), Value::from(members));
        Ok(Value::Object(body))
    }
}
