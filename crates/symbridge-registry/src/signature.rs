//! Positional and keyword argument binding for native callables.
//!
//! A [`Signature`] lists parameters in declaration order. Binding consumes
//! positional arguments first, then keyword arguments, and rejects
//! duplicates, unknown keywords, and missing required parameters.

use serde_json::{Map, Value};

use crate::error::InvocationError;

/// Shape of a single parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Must be supplied.
    Required,
    /// May be omitted; the callable picks the default.
    Optional,
    /// Collects all remaining positional arguments into a list.
    Variadic,
}

/// One declared parameter.
#[derive(Debug, Clone, Copy)]
pub struct Param {
    name: &'static str,
    kind: ParamKind,
}

impl Param {
    /// A required parameter.
    #[must_use]
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Required,
        }
    }

    /// An optional parameter.
    #[must_use]
    pub const fn optional(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Optional,
        }
    }

    /// A parameter collecting the remaining positional arguments.
    #[must_use]
    pub const fn variadic(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Variadic,
        }
    }
}

/// Declared parameters of a native callable.
#[derive(Debug, Clone)]
pub struct Signature {
    function: String,
    params: Vec<Param>,
}

impl Signature {
    /// Creates a signature for `function`.
    pub fn new(function: impl Into<String>, params: &[Param]) -> Self {
        Self {
            function: function.into(),
            params: params.to_vec(),
        }
    }

    /// Name of the callable this signature belongs to.
    #[must_use]
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Binds call arguments to parameters.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationError::Type`] for surplus positional arguments,
    /// unknown or duplicated keywords, and missing required parameters.
    pub fn bind(
        &self,
        args: Vec<Value>,
        mut kwargs: Map<String, Value>,
    ) -> Result<BoundArgs, InvocationError> {
        let mut positional = args.into_iter();
        let mut slots = Vec::with_capacity(self.params.len());

        for param in &self.params {
            let value = match param.kind {
                ParamKind::Variadic => {
                    let rest: Vec<Value> = positional.by_ref().collect();
                    (!rest.is_empty()).then_some(Value::Array(rest))
                }
                ParamKind::Required | ParamKind::Optional => positional.next(),
            };
            let keyword = kwargs.remove(param.name);
            let resolved = match (value, keyword) {
                (Some(_), Some(_)) => {
                    return Err(InvocationError::type_error(
                        &self.function,
                        format!("got multiple values for argument '{}'", param.name),
                    ));
                }
                (Some(found), None) | (None, Some(found)) => Some(found),
                (None, None) if param.kind == ParamKind::Required => {
                    return Err(InvocationError::type_error(
                        &self.function,
                        format!("missing required argument '{}'", param.name),
                    ));
                }
                (None, None) => None,
            };
            slots.push((param.name, resolved));
        }

        let surplus = positional.count();
        if surplus > 0 {
            return Err(InvocationError::type_error(
                &self.function,
                format!(
                    "takes at most {} positional arguments ({surplus} too many)",
                    self.params.len()
                ),
            ));
        }

        if let Some(unknown) = kwargs.keys().next() {
            return Err(InvocationError::type_error(
                &self.function,
                format!("got an unexpected keyword argument '{unknown}'"),
            ));
        }

        Ok(BoundArgs {
            function: self.function.clone(),
            slots,
        })
    }
}

/// Arguments bound to a [`Signature`], with typed accessors.
#[derive(Debug, Clone)]
pub struct BoundArgs {
    function: String,
    slots: Vec<(&'static str, Option<Value>)>,
}

impl BoundArgs {
    /// Name of the callable the arguments were bound for.
    #[must_use]
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Raw value of a parameter, if supplied and not `null`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.slots
            .iter()
            .find(|(param, _)| *param == name)
            .and_then(|(_, value)| value.as_ref())
            .filter(|value| !value.is_null())
    }

    /// Required numeric parameter.
    ///
    /// # Errors
    ///
    /// Returns a type error when the value is missing or not a number.
    pub fn f64(&self, name: &str) -> Result<f64, InvocationError> {
        self.opt_f64(name)?
            .ok_or_else(|| self.type_error(name, "a number"))
    }

    /// Optional numeric parameter.
    ///
    /// # Errors
    ///
    /// Returns a type error when the value is present but not a number.
    pub fn opt_f64(&self, name: &str) -> Result<Option<f64>, InvocationError> {
        self.get(name)
            .map(|value| value.as_f64().ok_or_else(|| self.type_error(name, "a number")))
            .transpose()
    }

    /// Required non-negative integer parameter.
    ///
    /// # Errors
    ///
    /// Returns a type error when the value is missing or not an unsigned
    /// integer.
    pub fn u64(&self, name: &str) -> Result<u64, InvocationError> {
        self.opt_u64(name)?
            .ok_or_else(|| self.type_error(name, "a non-negative integer"))
    }

    /// Optional non-negative integer parameter.
    ///
    /// # Errors
    ///
    /// Returns a type error when the value is present but not an unsigned
    /// integer.
    pub fn opt_u64(&self, name: &str) -> Result<Option<u64>, InvocationError> {
        self.get(name)
            .map(|value| {
                value
                    .as_u64()
                    .ok_or_else(|| self.type_error(name, "a non-negative integer"))
            })
            .transpose()
    }

    /// Required string parameter.
    ///
    /// # Errors
    ///
    /// Returns a type error when the value is missing or not a string.
    pub fn str(&self, name: &str) -> Result<&str, InvocationError> {
        self.opt_str(name)?
            .ok_or_else(|| self.type_error(name, "a string"))
    }

    /// Optional string parameter.
    ///
    /// # Errors
    ///
    /// Returns a type error when the value is present but not a string.
    pub fn opt_str(&self, name: &str) -> Result<Option<&str>, InvocationError> {
        self.get(name)
            .map(|value| value.as_str().ok_or_else(|| self.type_error(name, "a string")))
            .transpose()
    }

    /// Variadic parameter as a slice of values.
    #[must_use]
    pub fn rest(&self, name: &str) -> &[Value] {
        self.get(name)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn type_error(&self, name: &str, expected: &str) -> InvocationError {
        InvocationError::type_error(
            &self.function,
            format!("argument '{name}' must be {expected}"),
        )
    }
}
