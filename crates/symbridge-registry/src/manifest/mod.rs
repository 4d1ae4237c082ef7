//! Declarative module manifests found on the search path.
//!
//! A manifest is a JSON document describing a module's members. The loader
//! maps a dotted module name `a.b` to `<entry>/a/b.json` or
//! `<entry>/a/b/__init__.json` for each search path entry, in order, and
//! turns the first match into a [`ManifestModule`].

mod objects;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

pub use self::objects::{
    AliasResolver, ManifestClass, ManifestFunction, ManifestInstance, ManifestModule,
};
use crate::error::ImportError;
use crate::search_path::SearchPath;

/// File extension of module manifests.
pub const MANIFEST_EXTENSION: &str = "json";

/// File name marking a directory as a package.
pub const PACKAGE_MANIFEST: &str = "__init__.json";

/// Top-level manifest document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleManifest {
    /// Members keyed by name.
    #[serde(default)]
    pub members: BTreeMap<String, MemberSpec>,
}

/// Declaration of a single module member.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberSpec {
    /// Constant attribute.
    Value(Value),
    /// Function returning a fixed value.
    Function(FunctionSpec),
    /// Re-export of `module.member` from another module.
    Alias(String),
    /// Class whose instances carry attributes and methods.
    Class(ClassSpec),
    /// Nested sub-module.
    Module(ModuleManifest),
}

/// Declaration of a function or method.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionSpec {
    /// Value produced by every call.
    #[serde(default)]
    pub returns: Value,
}

/// Declaration of a class.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassSpec {
    /// Attributes copied onto every instance.
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    /// Methods available on every instance.
    #[serde(default)]
    pub methods: BTreeMap<String, FunctionSpec>,
}

/// Finds the manifest for `name`, honouring search path order.
#[must_use]
pub fn locate(name: &str, search_path: &SearchPath) -> Option<PathBuf> {
    let relative: PathBuf = name.split('.').collect();
    search_path.entries().iter().find_map(|entry| {
        let base = entry.join(&relative);
        let module_file = base.with_extension(MANIFEST_EXTENSION);
        if module_file.is_file() {
            return Some(module_file);
        }
        let package_file = base.join(PACKAGE_MANIFEST);
        package_file.is_file().then_some(package_file)
    })
}

/// Reads and parses a manifest file.
///
/// # Errors
///
/// Returns [`ImportError::ManifestRead`] when the file cannot be read and
/// [`ImportError::ManifestSyntax`] when it is not a valid manifest.
pub fn read(path: &Path) -> Result<ModuleManifest, ImportError> {
    let bytes = fs::read(path).map_err(|source| ImportError::ManifestRead {
        path: path.to_path_buf(),
        source: Arc::new(source),
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ImportError::ManifestSyntax {
        path: path.to_path_buf(),
        source: Arc::new(source),
    })
}
