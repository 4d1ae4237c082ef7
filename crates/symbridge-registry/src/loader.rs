//! The default [`ModuleLoader`]: native modules first, then manifests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::REGISTRY_TARGET;
use crate::binding::Binding;
use crate::error::ImportError;
use crate::host::{HostObject, ModuleLoader, lookup_member};
use crate::manifest::{self, ManifestModule};
use crate::native::NativeCatalogue;
use crate::search_path::SearchPath;

type ModuleCache = HashMap<String, Arc<dyn HostObject>>;

/// Loads native modules from a catalogue and manifest modules from the
/// search path, caching each module after its first successful load.
pub struct StandardLoader {
    catalogue: NativeCatalogue,
    cache: Mutex<ModuleCache>,
}

impl StandardLoader {
    /// Creates a loader backed by the given native catalogue.
    #[must_use]
    pub fn new(catalogue: NativeCatalogue) -> Self {
        Self {
            catalogue,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, name: &str) -> Option<Arc<dyn HostObject>> {
        self.cache
            .lock()
            .ok()
            .and_then(|cache| cache.get(name).cloned())
    }

    fn remember(&self, name: &str, module: &Arc<dyn HostObject>) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(name.to_owned(), Arc::clone(module));
        }
    }

    fn load_tracked(
        &self,
        name: &str,
        search_path: &SearchPath,
        chain: &mut Vec<String>,
    ) -> Result<Arc<dyn HostObject>, ImportError> {
        if name.is_empty() || name.split('.').any(str::is_empty) {
            return Err(ImportError::ModuleNotFound {
                name: name.to_owned(),
            });
        }
        if let Some(module) = self.cached(name) {
            return Ok(module);
        }
        if chain.iter().any(|loading| loading == name) {
            return Err(ImportError::CircularAlias {
                module: name.to_owned(),
                chain: chain.clone(),
            });
        }

        let module: Arc<dyn HostObject> = if let Some(native) = self.catalogue.build(name) {
            debug!(target: REGISTRY_TARGET, module = name, "loaded native module");
            Arc::new(native)
        } else {
            chain.push(name.to_owned());
            let loaded = self.load_manifest(name, search_path, chain);
            chain.pop();
            loaded?
        };

        self.remember(name, &module);
        Ok(module)
    }

    fn load_manifest(
        &self,
        name: &str,
        search_path: &SearchPath,
        chain: &mut Vec<String>,
    ) -> Result<Arc<dyn HostObject>, ImportError> {
        let path = manifest::locate(name, search_path).ok_or_else(|| ImportError::ModuleNotFound {
            name: name.to_owned(),
        })?;
        let parsed = manifest::read(&path)?;
        let mut resolve_alias = |module: &str, member: &str| -> Result<Binding, ImportError> {
            let target = self.load_tracked(module, search_path, chain)?;
            lookup_member(target.as_ref(), member).ok_or_else(|| ImportError::MissingMember {
                module: module.to_owned(),
                member: member.to_owned(),
            })
        };
        let module = ManifestModule::build(name, &path, parsed, &mut resolve_alias)?;
        debug!(
            target: REGISTRY_TARGET,
            module = name,
            path = %path.display(),
            "loaded manifest module"
        );
        Ok(Arc::new(module))
    }
}

impl Default for StandardLoader {
    fn default() -> Self {
        Self::new(NativeCatalogue::standard())
    }
}

impl ModuleLoader for StandardLoader {
    fn load(&self, name: &str, search_path: &SearchPath) -> Result<Arc<dyn HostObject>, ImportError> {
        self.load_tracked(name, search_path, &mut Vec::new())
    }
}
