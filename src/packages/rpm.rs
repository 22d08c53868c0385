// src/packages/rpm.rs

//! RPM backend
//!
//! Everything here goes through the `rpm` command line tool in query mode;
//! the RPM database is never opened directly and never modified.

use crate::cache::PkgFileListCache;
use crate::command::{
    is_executable, CommandRunner, SystemRunner, DEFAULT_TIMEOUT_SECS, PKGLIST_TIMEOUT_SECS,
};
use crate::packages::info::{PkgInfo, FIELD_SEPARATOR, NO_ARCH};
use crate::packages::traits::PkgManager;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where rpm lives on current distros
pub const RPM_COMMAND: &str = "/usr/bin/rpm";

/// Where rpm lives on old SUSE and Red Hat distros
pub const LEGACY_RPM_COMMAND: &str = "/bin/rpm";

/// What `rpm -qf` prints for a file that no package owns
const NOT_OWNED: &str = "not owned by any package";

/// What rpm prints instead of a path for a package without files
const NO_FILES: &str = "(contains no files)";

const PKG_LIST_QUERY_FORMAT: &str = "%{name} | %{version}-%{release} | %{arch}\n";

const FILE_LIST_QUERY_FORMAT: &str =
    "[%{=NAME}-%{=VERSION}-%{=RELEASE}.%{=ARCH} | %{FILENAMES} \n]";

/// RPM package manager
#[derive(Debug)]
pub struct RpmPkgManager {
    rpm_command: PathBuf,
    runner: Box<dyn CommandRunner>,
}

impl RpmPkgManager {
    /// Create a manager using the system's rpm binary
    pub fn new() -> Self {
        Self::with_command(Self::find_rpm_command())
    }

    /// Create a manager using the rpm binary at `rpm_command`
    pub fn with_command(rpm_command: impl Into<PathBuf>) -> Self {
        Self {
            rpm_command: rpm_command.into(),
            runner: Box::new(SystemRunner::new()),
        }
    }

    /// Replace the command runner (mostly useful for tests)
    pub fn with_runner(mut self, runner: impl CommandRunner + 'static) -> Self {
        self.runner = Box::new(runner);
        self
    }

    pub fn rpm_command(&self) -> &Path {
        &self.rpm_command
    }

    /// Locate the rpm binary
    ///
    /// A /bin/rpm -> /usr/bin/rpm symlink cannot be relied on: rpm as a
    /// secondary package manager on Ubuntu only has /usr/bin/rpm. If rpm is
    /// in neither place the legacy path is used anyway, so that queries fail
    /// through their exit code instead of running an empty command.
    fn find_rpm_command() -> PathBuf {
        if is_executable(Path::new(RPM_COMMAND)) {
            PathBuf::from(RPM_COMMAND)
        } else {
            PathBuf::from(LEGACY_RPM_COMMAND)
        }
    }

    /// Run rpm with `args` and return its output if it exited with 0
    fn query(&self, args: &[&str], timeout_secs: u64) -> Option<String> {
        let result = self
            .runner
            .run(&self.rpm_command, args, Duration::from_secs(timeout_secs));

        match result {
            Ok(output) => match output.into_success(&self.rpm_command) {
                Ok(stdout) => Some(stdout),
                // Routine for -qf on unowned paths, so not a warning
                Err(e) => {
                    debug!("rpm {}: {}", args.join(" "), e);
                    None
                }
            },
            Err(e) => {
                warn!("rpm {}: {}", args.join(" "), e);
                None
            }
        }
    }
}

impl Default for RpmPkgManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PkgManager for RpmPkgManager {
    fn name(&self) -> &str {
        "rpm"
    }

    fn is_available(&self) -> bool {
        is_executable(&self.rpm_command)
    }

    fn is_primary_pkg_manager(&self) -> bool {
        // If rpm owns its own binary, rpm is what installed the system
        let command = self.rpm_command.to_string_lossy();
        let tool_name = self
            .rpm_command
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name().to_string());

        self.query(&["-qf", &*command], DEFAULT_TIMEOUT_SECS)
            .is_some_and(|output| output.starts_with(&tool_name))
    }

    fn owning_pkg(&self, path: &str) -> String {
        let Some(output) = self.query(&["-qf", "--queryformat", "%{name}", path], DEFAULT_TIMEOUT_SECS)
        else {
            return String::new();
        };

        if output.contains(NOT_OWNED) {
            return String::new();
        }

        output.trim_end().to_string()
    }

    fn installed_pkg(&self) -> Vec<PkgInfo> {
        let Some(output) = self.query(
            &["-qa", "--queryformat", PKG_LIST_QUERY_FORMAT],
            PKGLIST_TIMEOUT_SECS,
        ) else {
            return Vec::new();
        };

        parse_pkg_list(&output)
            .into_iter()
            .map(|pkg| pkg.with_pkg_manager(self.name()))
            .collect()
    }

    fn file_list(&self, pkg: &PkgInfo) -> Vec<String> {
        let query_name = self.query_name(pkg);

        match self.query(&["-ql", query_name.as_str()], DEFAULT_TIMEOUT_SECS) {
            Some(output) => parse_file_list(&output),
            None => Vec::new(),
        }
    }

    fn create_file_list_cache(&self) -> Option<PkgFileListCache> {
        let output = self.query(&["-qa", "--qf", FILE_LIST_QUERY_FORMAT], PKGLIST_TIMEOUT_SECS)?;

        Some(parse_file_list_cache(output, self.name()))
    }
}

/// Parse `rpm -qa` output in `name | version-release | arch` format
///
/// Malformed lines are logged and skipped; they never abort the parse.
pub fn parse_pkg_list(output: &str) -> Vec<PkgInfo> {
    let mut pkgs = Vec::new();

    for line in output.split('\n') {
        if line.is_empty() {
            continue;
        }

        match line.parse::<PkgInfo>() {
            Ok(pkg) => pkgs.push(pkg),
            Err(e) => warn!("Invalid rpm -qa output: {}", e),
        }
    }

    debug!("Parsed {} installed packages", pkgs.len());
    pkgs
}

/// Parse `rpm -ql` output for a single package
pub fn parse_file_list(output: &str) -> Vec<String> {
    output
        .split('\n')
        .filter(|line| !line.is_empty() && line.trim() != NO_FILES)
        .map(str::to_string)
        .collect()
}

/// Drop the `.(none)` suffix of arch-less packages
///
/// Cache keys then match `PkgInfo::qualified_name()`, which leaves out an
/// empty architecture.
fn strip_no_arch(pkg: &str) -> &str {
    pkg.strip_suffix(NO_ARCH)
        .and_then(|rest| rest.strip_suffix('.'))
        .unwrap_or(pkg)
}

/// Parse the bulk `pkg | path` listing into a file list cache
///
/// Takes ownership of the raw output so it is freed as soon as the cache is
/// built; on a large system it can be tens of megabytes.
pub fn parse_file_list_cache(output: String, pkg_manager: &str) -> PkgFileListCache {
    let mut cache = PkgFileListCache::new(pkg_manager);
    let mut line_count = 0usize;

    // Sample output:
    //
    //   zsh-5.6-lp151.1.3.x86_64 | /bin/zsh
    //   zsh-5.6-lp151.1.3.x86_64 | /etc/zprofile
    //   zsh-5.6-lp151.1.3.x86_64 | /etc/zsh_completion.d
    for line in output.split('\n') {
        if line.is_empty() {
            continue;
        }
        line_count += 1;

        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        let [pkg, path] = fields.as_slice() else {
            warn!("Unexpected file list line: {:?}", line);
            continue;
        };

        let (pkg, path) = (pkg.trim(), path.trim());
        if pkg.is_empty() || path.is_empty() || path == NO_FILES {
            continue;
        }

        cache.add(strip_no_arch(pkg), path);
    }
    drop(output);

    info!(
        "File list cache finished: {} lines, {} files in {} packages",
        line_count,
        cache.file_count(),
        cache.pkg_count()
    );
    cache
}
