// src/command.rs

//! External command execution
//!
//! Package manager queries go through the `CommandRunner` trait so the
//! parsers can be exercised with canned output. `SystemRunner` is the real
//! implementation: it spawns the program, captures its output and kills it
//! once the timeout has elapsed.

use crate::error::{Error, Result};
use std::fmt;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Timeout for single lookups (owner of one file, files of one package)
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Timeout for queries that walk the whole package database
pub const PKGLIST_TIMEOUT_SECS: u64 = 30;

/// Interval between exit checks while waiting for a child
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Captured result of one command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Process exit code; -1 if the process was terminated by a signal
    pub exit_code: i32,

    /// Everything the process wrote to stdout
    pub stdout: String,
}

impl CommandOutput {
    pub fn new(exit_code: i32, stdout: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
        }
    }

    /// True if the process exited with code 0
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Return stdout if the process succeeded, `Error::CommandFailed` otherwise
    pub fn into_success(self, program: &Path) -> Result<String> {
        if self.success() {
            Ok(self.stdout)
        } else {
            Err(Error::CommandFailed {
                program: program.to_path_buf(),
                exit_code: self.exit_code,
            })
        }
    }
}

/// Executes an external program and captures its output
///
/// Spawn failures and timeouts are reported as errors. A process that ran
/// to completion is always `Ok`, whatever its exit code; callers decide
/// whether the output can be trusted.
pub trait CommandRunner: fmt::Debug + Send + Sync {
    fn run(&self, program: &Path, args: &[&str], timeout: Duration) -> Result<CommandOutput>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for Arc<T> {
    fn run(&self, program: &Path, args: &[&str], timeout: Duration) -> Result<CommandOutput> {
        (**self).run(program, args, timeout)
    }
}

/// Runs commands as real child processes
///
/// The child's locale is forced to "C" so diagnostics come out in English
/// and stay matchable.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[&str], timeout: Duration) -> Result<CommandOutput> {
        debug!("Running: {} {}", program.display(), args.join(" "));

        let mut child = Command::new(program)
            .args(args)
            .env("LC_ALL", "C")
            .env("LANG", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::CommandSpawn {
                program: program.to_path_buf(),
                source,
            })?;

        // Drain both pipes concurrently so a chatty child never blocks on a
        // full pipe while we wait for it to exit
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdout_handle = thread::spawn(move || read_stream(stdout));
        let stderr_handle = thread::spawn(move || read_stream(stderr));

        let waited = match wait_with_deadline(&mut child, timeout) {
            Ok(waited) => waited,
            Err(e) => {
                warn!("Lost track of {}: {}", program.display(), e);
                kill_and_reap(&mut child);
                return Err(e);
            }
        };

        let status = match waited {
            Some(status) => status,
            None => {
                warn!(
                    "{} did not finish within {}s, killing it",
                    program.display(),
                    timeout.as_secs()
                );
                kill_and_reap(&mut child);
                // The reader threads are left to finish on their own: a
                // grandchild may still hold the pipes open.
                return Err(Error::CommandTimeout {
                    program: program.to_path_buf(),
                    timeout_secs: timeout.as_secs(),
                });
            }
        };

        // A short read means the output cannot be trusted as complete
        let stdout = join_reader(stdout_handle)?;
        let stderr = join_reader(stderr_handle).unwrap_or_default();
        let exit_code = status.code().unwrap_or(-1);

        debug!(
            "{} exited with code {} ({} bytes of output)",
            program.display(),
            exit_code,
            stdout.len()
        );
        if !stderr.trim().is_empty() {
            debug!("stderr of {}: {}", program.display(), stderr.trim_end());
        }

        Ok(CommandOutput { exit_code, stdout })
    }
}

/// Poll the child until it exits or the deadline passes
///
/// Returns `None` on timeout; the child is still running in that case.
fn wait_with_deadline(child: &mut Child, timeout: Duration) -> Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Kill the child and collect its exit status so no zombie is left behind
fn kill_and_reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn read_stream<R: Read>(stream: Option<R>) -> io::Result<String> {
    let mut buf = Vec::new();
    if let Some(mut stream) = stream {
        stream.read_to_end(&mut buf)?;
    }

    Ok(String::from_utf8(buf)
        .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()))
}

fn join_reader(handle: JoinHandle<io::Result<String>>) -> Result<String> {
    let text = handle
        .join()
        .map_err(|_| io::Error::other("output reader thread panicked"))??;
    Ok(text)
}

/// Check that `path` names an existing, executable regular file
pub fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = path.metadata() else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }

    #[cfg(not(unix))]
    {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_output_success() {
        let ok = CommandOutput::new(0, "zsh\n");
        assert!(ok.success());
        assert_eq!(ok.into_success(Path::new("/usr/bin/rpm")).unwrap(), "zsh\n");

        let failed = CommandOutput::new(1, "");
        assert!(!failed.success());
        match failed.into_success(Path::new("/usr/bin/rpm")) {
            Err(Error::CommandFailed { exit_code, .. }) => assert_eq!(exit_code, 1),
            other => panic!("expected CommandFailed, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_captures_stdout_and_exit_code() {
        let runner = SystemRunner::new();
        let output = runner
            .run(
                Path::new("/bin/sh"),
                &["-c", "echo hello; echo oops >&2; exit 3"],
                Duration::from_secs(10),
            )
            .unwrap();

        assert_eq!(output.exit_code, 3);
        assert_eq!(output.stdout, "hello\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_forces_c_locale() {
        let output = SystemRunner::new()
            .run(
                Path::new("/bin/sh"),
                &["-c", "echo \"$LC_ALL $LANG\""],
                Duration::from_secs(10),
            )
            .unwrap();

        assert_eq!(output.stdout.trim_end(), "C C");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_timeout() {
        let start = Instant::now();
        let result = SystemRunner::new().run(
            Path::new("/bin/sh"),
            &["-c", "exec sleep 10"],
            Duration::from_millis(300),
        );

        assert!(matches!(result, Err(Error::CommandTimeout { .. })));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    /// Reader that delivers a little data and then fails
    struct BrokenPipe {
        sent: bool,
    }

    impl Read for BrokenPipe {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.sent {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"));
            }
            self.sent = true;
            buf[..4].copy_from_slice(b"zsh\n");
            Ok(4)
        }
    }

    #[test]
    fn test_read_stream_reports_short_reads() {
        assert!(read_stream(Some(BrokenPipe { sent: false })).is_err());
        assert_eq!(read_stream(Some(&b"zsh\n"[..])).unwrap(), "zsh\n");
        assert_eq!(read_stream(None::<&[u8]>).unwrap(), "");
    }

    #[test]
    fn test_join_reader_maps_read_error_to_io() {
        let handle = thread::spawn(|| read_stream(Some(BrokenPipe { sent: false })));
        assert!(matches!(join_reader(handle), Err(Error::Io(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_kill_and_reap_leaves_no_running_child() {
        let mut child = Command::new("/bin/sh")
            .args(["-c", "exec sleep 10"])
            .spawn()
            .unwrap();

        kill_and_reap(&mut child);

        assert!(child.try_wait().unwrap().is_some());
    }

    #[test]
    fn test_system_runner_missing_program() {
        let result = SystemRunner::new().run(
            Path::new("/nonexistent/bin/rpm"),
            &["-qa"],
            Duration::from_secs(1),
        );

        assert!(matches!(result, Err(Error::CommandSpawn { .. })));
    }

    #[test]
    fn test_is_executable() {
        assert!(!is_executable(Path::new("/nonexistent/bin/rpm")));
        // A directory is never a usable command
        assert!(!is_executable(Path::new("/")));
    }

    #[cfg(unix)]
    #[test]
    fn test_is_executable_sh() {
        assert!(is_executable(Path::new("/bin/sh")));
    }
}
