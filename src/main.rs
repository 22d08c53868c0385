// src/main.rs

use anyhow::{Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use rpmowner::{PkgInfo, PkgManager, RpmPkgManager};
use std::io;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "rpmowner")]
#[command(author, version, about = "Query the RPM database for file ownership", long_about = None)]
struct Cli {
    /// Path to the rpm binary (default: /usr/bin/rpm, falling back to /bin/rpm)
    #[arg(long, global = true, env = "RPMOWNER_RPM")]
    rpm: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether rpm is installed
    Available,
    /// Check whether rpm is the primary package manager of this system
    Primary,
    /// Show the package owning each path
    Owner {
        /// Absolute paths to look up
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// List installed packages
    List {
        /// Print JSON instead of plain text
        #[arg(long)]
        json: bool,
    },
    /// List the files of an installed package
    Files {
        /// Package name, or its full name-version-release.arch
        package_name: String,
    },
    /// Build the file list cache for all packages
    Cache {
        /// Look these paths up in the cache instead of printing statistics
        paths: Vec<String>,
        /// Dump the whole cache as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type
        shell: Shell,
    },
}

/// Installed packages selected by a `files` argument
fn matching_pkgs<'a>(pkgs: &'a [PkgInfo], pattern: &str) -> Vec<&'a PkgInfo> {
    pkgs.iter()
        .filter(|pkg| pkg.name == pattern || pkg.qualified_name() == pattern)
        .collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep normal output clean; RUST_LOG still overrides
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    let rpm = match cli.rpm {
        Some(path) => RpmPkgManager::with_command(path),
        None => RpmPkgManager::new(),
    };
    info!("Using rpm at: {}", rpm.rpm_command().display());

    match cli.command {
        Some(Commands::Available) => {
            if !rpm.is_available() {
                return Err(anyhow!(
                    "rpm is not available at {}",
                    rpm.rpm_command().display()
                ));
            }
            println!("rpm is available at {}", rpm.rpm_command().display());
            Ok(())
        }
        Some(Commands::Primary) => {
            if rpm.is_primary_pkg_manager() {
                println!("rpm is the primary package manager");
            } else {
                println!("rpm is not the primary package manager");
            }
            Ok(())
        }
        Some(Commands::Owner { paths }) => {
            for path in &paths {
                let pkg = rpm.owning_pkg(path);
                if pkg.is_empty() {
                    println!("{}: (unowned)", path);
                } else {
                    println!("{}: {}", path, pkg);
                }
            }
            Ok(())
        }
        Some(Commands::List { json }) => {
            let pkgs = rpm.installed_pkg();

            if json {
                println!("{}", serde_json::to_string_pretty(&pkgs)?);
            } else if pkgs.is_empty() {
                println!("No packages found.");
            } else {
                for pkg in &pkgs {
                    print!("  {} {}", pkg.name, pkg.version);
                    if !pkg.arch.is_empty() {
                        print!(" [{}]", pkg.arch);
                    }
                    println!();
                }
                println!("\nTotal: {} package(s)", pkgs.len());
            }
            Ok(())
        }
        Some(Commands::Files { package_name }) => {
            let pkgs = rpm.installed_pkg();
            let matches = matching_pkgs(&pkgs, &package_name);

            if matches.is_empty() {
                return Err(anyhow!("Package '{}' is not installed", package_name));
            }

            let show_headers = matches.len() > 1;
            for pkg in matches {
                if show_headers {
                    println!("{}:", rpm.query_name(pkg));
                }
                for file in rpm.file_list(pkg) {
                    println!("{}", file);
                }
            }
            Ok(())
        }
        Some(Commands::Cache { paths, json }) => {
            let cache = rpm
                .create_file_list_cache()
                .ok_or_else(|| anyhow!("Could not build the file list cache"))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&cache)?);
            } else if paths.is_empty() {
                println!("File list cache ({})", cache.pkg_manager());
                println!("  Packages: {}", cache.pkg_count());
                println!("  Files: {}", cache.file_count());
            } else {
                for path in &paths {
                    match cache.pkgs_for_file(path) {
                        [] => println!("{}: (unowned)", path),
                        owners => println!("{}: {}", path, owners.join(", ")),
                    }
                }
            }
            Ok(())
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "rpmowner", &mut io::stdout());
            Ok(())
        }
        None => {
            // No command provided, show help
            println!("rpmowner v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'rpmowner --help' for usage information");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_matching_pkgs_by_name_and_qualified_name() {
        let pkgs = vec![
            PkgInfo::new("zsh", "5.6-lp151.1.3", "x86_64"),
            PkgInfo::new("zsh", "5.8-1", "x86_64"),
            PkgInfo::new("bash", "5.0-3", ""),
        ];

        assert_eq!(matching_pkgs(&pkgs, "zsh").len(), 2);

        let exact = matching_pkgs(&pkgs, "zsh-5.8-1.x86_64");
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].version, "5.8-1");

        assert_eq!(matching_pkgs(&pkgs, "bash-5.0-3").len(), 1);
        assert!(matching_pkgs(&pkgs, "fish").is_empty());
    }

    #[test]
    fn test_parse_owner_requires_paths() {
        assert!(Cli::try_parse_from(["rpmowner", "owner"]).is_err());

        let cli = Cli::try_parse_from(["rpmowner", "--rpm", "/opt/rpm", "owner", "/bin/zsh"]).unwrap();
        assert_eq!(cli.rpm, Some(PathBuf::from("/opt/rpm")));
        assert!(matches!(cli.command, Some(Commands::Owner { paths }) if paths == ["/bin/zsh"]));
    }
}
