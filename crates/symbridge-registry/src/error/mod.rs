//! Domain errors raised while resolving, importing, and invoking symbols.
//!
//! All errors use `thiserror`-derived enums with structured context so the
//! dispatcher can report them verbatim. I/O and JSON errors are wrapped in
//! `Arc` so the enums stay cheap to clone into diagnostics.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Failures raised by target code while a callable runs.
#[derive(Debug, Clone, Error)]
pub enum InvocationError {
    /// Arguments did not match the callable's signature.
    #[error("type error in {function}(): {message}")]
    Type {
        /// Callable that rejected its arguments.
        function: String,
        /// Description of the mismatch.
        message: String,
    },

    /// An argument had the right type but an unusable value.
    #[error("value error in {function}(): {message}")]
    Value {
        /// Callable that rejected the value.
        function: String,
        /// Description of the rejected value.
        message: String,
    },

    /// The resolved binding cannot be invoked.
    #[error("'{name}' is not callable (found {kind})")]
    NotCallable {
        /// Name the caller tried to invoke.
        name: String,
        /// Kind of binding that was found instead.
        kind: &'static str,
    },

    /// Any other failure raised by the callable.
    #[error("{function}() failed: {message}")]
    Raised {
        /// Callable that failed.
        function: String,
        /// Failure description.
        message: String,
    },
}

impl InvocationError {
    /// Creates an argument type error.
    pub fn type_error(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Type {
            function: function.into(),
            message: message.into(),
        }
    }

    /// Creates an argument value error.
    pub fn value_error(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Value {
            function: function.into(),
            message: message.into(),
        }
    }

    /// Creates a not-callable error.
    pub fn not_callable(name: impl Into<String>, kind: &'static str) -> Self {
        Self::NotCallable {
            name: name.into(),
            kind,
        }
    }

    /// Creates a generic failure raised by a callable.
    pub fn raised(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Raised {
            function: function.into(),
            message: message.into(),
        }
    }
}

/// Failures raised while loading a module.
#[derive(Debug, Clone, Error)]
pub enum ImportError {
    /// No loader knows the requested module.
    #[error("no module named '{name}'")]
    ModuleNotFound {
        /// Dotted module name.
        name: String,
    },

    /// A name listed for import does not exist on the module.
    #[error("cannot import name '{member}' from '{module}'")]
    MissingMember {
        /// Module that was searched.
        module: String,
        /// Member that was requested.
        member: String,
    },

    /// A manifest file could not be read.
    #[error("failed to read module manifest '{}': {source}", path.display())]
    ManifestRead {
        /// Manifest file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// A manifest file is not valid module JSON.
    #[error("malformed module manifest '{}': {source}", path.display())]
    ManifestSyntax {
        /// Manifest file path.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: Arc<serde_json::Error>,
    },

    /// An alias member does not name a `module.member` target.
    #[error("alias '{alias}' in module '{module}' has invalid target '{target}'")]
    InvalidAlias {
        /// Module declaring the alias.
        module: String,
        /// Alias member name.
        alias: String,
        /// Declared target.
        target: String,
    },

    /// Alias resolution looped back to a module that is still loading.
    #[error("circular alias while loading '{module}': {}", chain.join(" -> "))]
    CircularAlias {
        /// Module that closed the cycle.
        module: String,
        /// Modules being loaded when the cycle was detected.
        chain: Vec<String>,
    },
}

/// Errors surfaced by registry operations.
///
/// The display text of each variant is what the worker reports back to the
/// host, so messages name the symbol involved.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// A dotted path, leaf, or class could not be resolved.
    #[error("name '{name}' is not defined")]
    NotFound {
        /// Dotted name that failed to resolve.
        name: String,
    },

    /// Target code failed during a call.
    #[error(transparent)]
    Invocation(#[from] InvocationError),

    /// A module could not be imported.
    #[error("import of '{module}' failed: {source}")]
    Import {
        /// Module named in the request.
        module: String,
        /// Underlying loader failure.
        #[source]
        source: ImportError,
    },

    /// A search path entry could not be turned into an absolute path.
    #[error("error setting path: {message}")]
    Path {
        /// Description of the failure.
        message: String,
        /// Optional underlying I/O error.
        #[source]
        source: Option<Arc<std::io::Error>>,
    },

    /// A binding could not be stored under the requested name.
    #[error("cannot bind '{name}': {message}")]
    Bind {
        /// Requested registry name.
        name: String,
        /// Reason the bind was refused.
        message: String,
    },
}

impl RegistryError {
    /// Creates a not-found error for a dotted name.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Wraps a loader failure for the named module.
    pub fn import(module: impl Into<String>, source: ImportError) -> Self {
        Self::Import {
            module: module.into(),
            source,
        }
    }

    /// Creates a search path error.
    pub fn path(message: impl Into<String>, source: Option<std::io::Error>) -> Self {
        Self::Path {
            message: message.into(),
            source: source.map(Arc::new),
        }
    }

    /// Creates a bind error.
    pub fn bind(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Bind {
            name: name.into(),
            message: message.into(),
        }
    }
}
