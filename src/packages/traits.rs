// src/packages/traits.rs

//! Common interface for host package manager backends

use crate::cache::PkgFileListCache;
use crate::packages::info::PkgInfo;

/// Read-only view of a host package manager
///
/// None of these methods return errors: a failed or timed out query is
/// reported as "nothing found" (empty string, empty list or `None`). Any
/// diagnostics go to the log.
pub trait PkgManager: Send + Sync {
    /// Short name of the package manager (e.g. "rpm")
    fn name(&self) -> &str;

    /// True if the query program exists and is executable
    fn is_available(&self) -> bool;

    /// Heuristic check whether this is the system's primary package manager
    ///
    /// Used to choose between several package managers that are installed
    /// side by side.
    fn is_primary_pkg_manager(&self) -> bool;

    /// Name of the package that owns `path`
    ///
    /// Returns an empty string if the file is not owned by any package or
    /// if the lookup failed; the two cases cannot be told apart.
    fn owning_pkg(&self, path: &str) -> String;

    /// All installed packages, in the order the package manager lists them
    ///
    /// Returns an empty list if the query failed.
    fn installed_pkg(&self) -> Vec<PkgInfo>;

    /// Files owned by one installed package
    fn file_list(&self, pkg: &PkgInfo) -> Vec<String>;

    /// The identifier the query tool expects for exactly this package
    fn query_name(&self, pkg: &PkgInfo) -> String {
        pkg.qualified_name()
    }

    /// Build an index of every file of every installed package
    ///
    /// Returns `None` if the query failed. A query that succeeded but
    /// produced nothing usable yields an empty cache instead.
    fn create_file_list_cache(&self) -> Option<PkgFileListCache>;
}
