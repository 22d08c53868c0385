// src/packages/info.rs

//! Installed package records

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Field separator used in all query formats
pub const FIELD_SEPARATOR: &str = " | ";

/// Architecture value RPM reports for packages without one
pub const NO_ARCH: &str = "(none)";

/// One installed package as reported by the package manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkgInfo {
    /// Base name (e.g. "zsh")
    pub name: String,

    /// Version including the release, e.g. "5.6-lp151.1.3"
    pub version: String,

    /// Architecture, or empty if the package has none
    pub arch: String,

    /// Package manager this record came from (informational only)
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub pkg_manager: String,
}

impl PkgInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>, arch: impl Into<String>) -> Self {
        let arch = arch.into();
        Self {
            name: name.into(),
            version: version.into(),
            arch: if arch == NO_ARCH { String::new() } else { arch },
            pkg_manager: String::new(),
        }
    }

    /// Tag this record with the package manager that reported it
    pub fn with_pkg_manager(mut self, pkg_manager: impl Into<String>) -> Self {
        self.pkg_manager = pkg_manager.into();
        self
    }

    /// The `name[-version][.arch]` form that identifies exactly this package
    pub fn qualified_name(&self) -> String {
        let mut name = self.name.clone();

        if !self.version.is_empty() {
            name.push('-');
            name.push_str(&self.version);
        }

        if !self.arch.is_empty() {
            name.push('.');
            name.push_str(&self.arch);
        }

        name
    }
}

/// Parse one `name | version-release | arch` line
impl FromStr for PkgInfo {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();

        match fields.as_slice() {
            [name, version, arch] => Ok(PkgInfo::new(*name, *version, *arch)),
            _ => Err(Error::ParseError(format!(
                "expected 3 fields, found {} in {:?}",
                fields.len(),
                line
            ))),
        }
    }
}
