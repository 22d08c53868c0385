// src/cache.rs

//! Bulk file ownership index
//!
//! Asking the package manager "who owns this file" once per file is far too
//! slow for a filesystem tree with hundreds of thousands of entries. A
//! `PkgFileListCache` is instead filled from a single query listing every
//! file of every installed package, and answers both directions afterwards:
//! path -> owning package and package -> files.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Index of installed package files, built once per request
#[derive(Debug, Clone, Default, Serialize)]
pub struct PkgFileListCache {
    /// Name of the package manager that filled this cache (e.g. "rpm")
    pkg_manager: String,

    /// Path -> owning packages, in insertion order
    owners: HashMap<String, Vec<String>>,

    /// Package -> paths it owns
    files: HashMap<String, BTreeSet<String>>,
}

impl PkgFileListCache {
    /// Create an empty cache tagged with the package manager that fills it
    pub fn new(pkg_manager: impl Into<String>) -> Self {
        Self {
            pkg_manager: pkg_manager.into(),
            owners: HashMap::new(),
            files: HashMap::new(),
        }
    }

    /// Record that `pkg` owns `path`
    ///
    /// Several packages may own the same path (typically shared
    /// directories); all of them are kept. Adding the same pair twice is a
    /// no-op.
    pub fn add(&mut self, pkg: &str, path: &str) {
        let owners = self.owners.entry(path.to_string()).or_default();
        if !owners.iter().any(|owner| owner == pkg) {
            owners.push(pkg.to_string());
        }

        self.files
            .entry(pkg.to_string())
            .or_default()
            .insert(path.to_string());
    }

    pub fn pkg_manager(&self) -> &str {
        &self.pkg_manager
    }

    /// The package that owns `path`
    ///
    /// If several packages own it, the first one added wins.
    pub fn pkg_for_file(&self, path: &str) -> Option<&str> {
        self.owners
            .get(path)
            .and_then(|owners| owners.first())
            .map(String::as_str)
    }

    /// All packages that own `path`, in the order they were added
    pub fn pkgs_for_file(&self, path: &str) -> &[String] {
        self.owners.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Files owned by the package with the given qualified name
    pub fn file_list(&self, pkg: &str) -> Option<&BTreeSet<String>> {
        self.files.get(pkg)
    }

    pub fn contains_file(&self, path: &str) -> bool {
        self.owners.contains_key(path)
    }

    pub fn contains_pkg(&self, pkg: &str) -> bool {
        self.files.contains_key(pkg)
    }

    /// Iterate over the qualified names of all packages in the cache
    pub fn pkgs(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Number of distinct paths
    pub fn file_count(&self) -> usize {
        self.owners.len()
    }

    /// Number of distinct packages
    pub fn pkg_count(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_lookup_both_directions() {
        let mut cache = PkgFileListCache::new("rpm");
        cache.add("zsh-5.6-lp151.1.3.x86_64", "/bin/zsh");
        cache.add("zsh-5.6-lp151.1.3.x86_64", "/etc/zprofile");
        cache.add("bash-5.0-3.x86_64", "/bin/bash");

        assert_eq!(cache.pkg_manager(), "rpm");
        assert_eq!(cache.pkg_for_file("/bin/zsh"), Some("zsh-5.6-lp151.1.3.x86_64"));
        assert_eq!(cache.pkg_for_file("/bin/bash"), Some("bash-5.0-3.x86_64"));
        assert_eq!(cache.pkg_for_file("/bin/fish"), None);

        let zsh_files: Vec<&str> = cache
            .file_list("zsh-5.6-lp151.1.3.x86_64")
            .unwrap()
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(zsh_files, vec!["/bin/zsh", "/etc/zprofile"]);

        assert_eq!(cache.file_count(), 3);
        assert_eq!(cache.pkg_count(), 2);
        assert!(cache.contains_pkg("bash-5.0-3.x86_64"));
        assert!(!cache.contains_pkg("bash"));
    }

    #[test]
    fn test_shared_path_keeps_all_owners() {
        let mut cache = PkgFileListCache::new("rpm");
        cache.add("filesystem-15.5-1.x86_64", "/usr/share/doc");
        cache.add("zsh-5.6.x86_64", "/usr/share/doc");

        assert_eq!(cache.pkg_for_file("/usr/share/doc"), Some("filesystem-15.5-1.x86_64"));
        assert_eq!(
            cache.pkgs_for_file("/usr/share/doc"),
            &["filesystem-15.5-1.x86_64".to_string(), "zsh-5.6.x86_64".to_string()]
        );
        assert_eq!(cache.file_count(), 1);
        assert_eq!(cache.pkg_count(), 2);
    }

    #[test]
    fn test_duplicate_add_is_ignored() {
        let mut cache = PkgFileListCache::new("rpm");
        cache.add("zsh-5.6.x86_64", "/bin/zsh");
        cache.add("zsh-5.6.x86_64", "/bin/zsh");

        assert_eq!(cache.pkgs_for_file("/bin/zsh").len(), 1);
        assert_eq!(cache.file_list("zsh-5.6.x86_64").unwrap().len(), 1);
    }

    #[test]
    fn test_empty_cache() {
        let cache = PkgFileListCache::new("rpm");
        assert!(cache.is_empty());
        assert!(!cache.contains_file("/bin/zsh"));
        assert!(cache.pkgs_for_file("/bin/zsh").is_empty());
        assert_eq!(cache.pkgs().count(), 0);
    }
}
