// src/lib.rs

//! rpmowner
//!
//! Read-only introspection of the host package manager, for tools that need
//! to annotate files with the package that owns them (disk usage analyzers
//! and the like).
//!
//! # Architecture
//!
//! - Query tool only: all information comes from running the package
//!   manager's own command line tool; its database is never touched
//! - Injectable command runner: parsers are tested against canned output
//! - Failures become empty results: no query ever returns an error to the
//!   caller, see `PkgManager`
//! - Bulk ownership index: one query fills a `PkgFileListCache` instead of
//!   one process per file

pub mod cache;
pub mod command;
mod error;
pub mod packages;

pub use cache::PkgFileListCache;
pub use error::{Error, Result};
pub use packages::{PkgInfo, PkgManager, RpmPkgManager};
