//! Ordered, append-only list of directories consulted by imports.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::REGISTRY_TARGET;
use crate::error::RegistryError;

/// Directories searched for manifest modules, in priority order.
///
/// Entries are never removed or deduplicated; extending with a path that is
/// already present appends it again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    entries: Vec<PathBuf>,
}

impl SearchPath {
    /// Creates an empty search path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries in search order.
    #[must_use]
    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    /// Number of entries, counting repeats.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no entries have been added.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends one absolute entry.
    pub fn push(&mut self, entry: PathBuf) {
        self.entries.push(entry);
    }

    /// Joins each entry onto `base` and appends the results in order.
    ///
    /// Validation happens before anything is appended, so a rejected entry
    /// leaves the search path untouched.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Path`] when an entry cannot form a filesystem
    /// path (an interior NUL byte, for example).
    pub fn extend_from<I, P>(&mut self, base: &Path, entries: I) -> Result<usize, RegistryError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let joined = entries
            .into_iter()
            .map(|entry| join_entry(base, entry.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let added = joined.len();
        for entry in joined {
            debug!(
                target: REGISTRY_TARGET,
                entry = %entry.display(),
                "appending search path entry"
            );
            self.entries.push(entry);
        }
        Ok(added)
    }
}

fn join_entry(base: &Path, entry: &Path) -> Result<PathBuf, RegistryError> {
    if entry.as_os_str().as_encoded_bytes().contains(&0) {
        return Err(RegistryError::path(
            format!("entry '{}' contains a NUL byte", entry.display()),
            None,
        ));
    }
    Ok(base.join(entry))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_joined_in_order() {
        let mut path = SearchPath::new();
        let added = path
            .extend_from(Path::new("/work"), ["lib", "vendor/mods"])
            .expect("extend");
        assert_eq!(added, 2);
        assert_eq!(
            path.entries(),
            &[PathBuf::from("/work/lib"), PathBuf::from("/work/vendor/mods")]
        );
    }

    #[test]
    fn repeated_entries_are_not_deduplicated() {
        let mut path = SearchPath::new();
        path.extend_from(Path::new("/work"), ["lib"]).expect("first");
        path.extend_from(Path::new("/work"), ["lib"]).expect("second");
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn absolute_entries_replace_the_base() {
        let mut path = SearchPath::new();
        path.extend_from(Path::new("/work"), ["/opt/mods"])
            .expect("extend");
        assert_eq!(path.entries(), &[PathBuf::from("/opt/mods")]);
    }

    #[test]
    fn nul_bytes_reject_the_whole_batch() {
        let mut path = SearchPath::new();
        let error = path
            .extend_from(Path::new("/work"), ["lib", "bad\0entry"])
            .expect_err("nul byte should fail");
        assert!(matches!(error, RegistryError::Path { .. }));
        assert!(path.is_empty());
    }
}
