// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn build_cli() -> Command {
    Command::new("rpmowner")
        .version(env!("CARGO_PKG_VERSION"))
        .author("rpmowner Contributors")
        .about("Query the RPM database for file ownership")
        .subcommand_required(false)
        .arg(
            Arg::new("rpm")
                .long("rpm")
                .value_name("PATH")
                .global(true)
                .help("Path to the rpm binary (default: /usr/bin/rpm, falling back to /bin/rpm)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log debug output to stderr"),
        )
        .subcommand(Command::new("available").about("Check whether rpm is installed"))
        .subcommand(
            Command::new("primary")
                .about("Check whether rpm is the primary package manager of this system"),
        )
        .subcommand(
            Command::new("owner")
                .about("Show the package owning each path")
                .arg(
                    Arg::new("paths")
                        .required(true)
                        .num_args(1..)
                        .help("Absolute paths to look up"),
                ),
        )
        .subcommand(
            Command::new("list").about("List installed packages").arg(
                Arg::new("json")
                    .long("json")
                    .action(ArgAction::SetTrue)
                    .help("Print JSON instead of plain text"),
            ),
        )
        .subcommand(
            Command::new("files")
                .about("List the files of an installed package")
                .arg(
                    Arg::new("package_name")
                        .required(true)
                        .help("Package name, or its full name-version-release.arch"),
                ),
        )
        .subcommand(
            Command::new("cache")
                .about("Build the file list cache for all packages")
                .arg(
                    Arg::new("paths")
                        .num_args(0..)
                        .help("Look these paths up in the cache instead of printing statistics"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Dump the whole cache as JSON"),
                ),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "elvish", "fish", "powershell", "zsh"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Man pages go to OUT_DIR so building never touches the source tree
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("Failed to create man directory");

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    man.render(&mut buffer).expect("Failed to render man page");

    let man_path = man_dir.join("rpmowner.1");
    fs::write(&man_path, buffer).expect("Failed to write man page");
}
