//! Bounded subprocess execution.
//!
//! A `BoundedCommand` runs an external process with a finite, explicit
//! argument list (nothing passes through a shell) and two distinct
//! deadlines: one for spawning the process, one for waiting on its exit.
//! Either expiry kills the process and reaps it before returning.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Which half of the deadline budget a process ran out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessPhase {
    /// Waiting for the process to be spawned
    Startup,
    /// Waiting for the spawned process to exit
    Completion,
}

impl ProcessPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessPhase::Startup => "startup",
            ProcessPhase::Completion => "completion",
        }
    }
}

impl fmt::Display for ProcessPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cap on captured stderr retained for diagnostics.
pub const MAX_STDERR_BYTES: usize = 4096;

/// Captured output of a successfully completed process.
#[derive(Debug)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub elapsed: Duration,
}

/// A fully-specified subprocess invocation with split deadlines.
#[derive(Debug, Clone)]
pub struct BoundedCommand {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    startup_timeout: Duration,
    completion_timeout: Duration,
    kill_grace: Duration,
}

impl BoundedCommand {
    /// Create a new command for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
            startup_timeout: Duration::from_secs(10),
            completion_timeout: Duration::from_secs(120),
            kill_grace: Duration::from_secs(2),
        }
    }

    /// Add one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Set the startup and completion deadlines.
    pub fn with_deadlines(mut self, startup: Duration, completion: Duration) -> Self {
        self.startup_timeout = startup;
        self.completion_timeout = completion;
        self
    }

    /// Set how long to wait for the process to die after a kill.
    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    /// Run the process to completion within the configured deadlines.
    ///
    /// Never returns while the child is still alive: deadline expiry kills
    /// the process and waits for process-table cleanup first. Non-zero exit
    /// is an error carrying the captured stderr.
    pub async fn run(&self) -> MediaResult<ProcessOutput> {
        let start = Instant::now();
        debug!(
            program = %self.program.display(),
            args = %self.args.join(" "),
            "Running bounded process"
        );

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }

        let spawned = tokio::time::timeout(self.startup_timeout, async { command.spawn() }).await;
        let mut child = match spawned {
            Ok(Ok(child)) => child,
            Ok(Err(e)) => return Err(MediaError::SpawnFailed(e.to_string())),
            Err(_) => {
                return Err(MediaError::Timeout {
                    phase: ProcessPhase::Startup,
                    limit: self.startup_timeout,
                })
            }
        };

        // Drain pipes concurrently with the wait so the child never blocks
        // on a full pipe buffer.
        let stdout_handle = spawn_line_reader(child.stdout.take(), usize::MAX);
        let stderr_handle = spawn_line_reader(child.stderr.take(), MAX_STDERR_BYTES);

        let status = match tokio::time::timeout(self.completion_timeout, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                let _ = child.kill().await;
                return Err(MediaError::Io(e));
            }
            Err(_) => {
                warn!(
                    program = %self.program.display(),
                    limit_secs = self.completion_timeout.as_secs_f64(),
                    "Process exceeded completion deadline, killing"
                );
                let _ = child.start_kill();
                if tokio::time::timeout(self.kill_grace, child.wait())
                    .await
                    .is_err()
                {
                    // Kill did not take within the grace period; force the
                    // reap before returning.
                    let _ = child.kill().await;
                }
                let _ = stdout_handle.await;
                let _ = stderr_handle.await;
                return Err(MediaError::Timeout {
                    phase: ProcessPhase::Completion,
                    limit: self.completion_timeout,
                });
            }
        };

        let stdout = stdout_handle.await.unwrap_or_default();
        let stderr = stderr_handle.await.unwrap_or_default();
        let elapsed = start.elapsed();

        if !status.success() {
            return Err(MediaError::process_failed(
                format!(
                    "{} exited with status {}",
                    self.program.display(),
                    status.code().map_or("unknown".to_string(), |c| c.to_string())
                ),
                Some(stderr),
                status.code(),
            ));
        }

        Ok(ProcessOutput {
            stdout,
            stderr,
            exit_code: status.code(),
            elapsed,
        })
    }
}

/// Collect lines from a pipe, keeping at most `cap` bytes.
fn spawn_line_reader<R>(pipe: Option<R>, cap: usize) -> JoinHandle<String>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = String::new();
        let Some(pipe) = pipe else {
            return buf;
        };
        let mut lines = BufReader::new(pipe).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            append_clipped(&mut buf, &line, cap);
        }
        buf
    })
}

/// Append a line to `buf`, truncating once `cap` bytes are held.
fn append_clipped(buf: &mut String, line: &str, cap: usize) {
    if buf.len() >= cap {
        return;
    }
    if !buf.is_empty() {
        buf.push('\n');
    }
    let room = cap - buf.len();
    if line.len() > room {
        let mut cut = room;
        while !line.is_char_boundary(cut) {
            cut -= 1;
        }
        buf.push_str(&line[..cut]);
        buf.push_str("... (truncated)");
    } else {
        buf.push_str(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_success_captures_stdout() {
        let output = BoundedCommand::new("echo")
            .arg("hello")
            .run()
            .await
            .unwrap();
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.exit_code, Some(0));
    }

    #[tokio::test]
    async fn test_nonzero_exit_carries_stderr() {
        let err = BoundedCommand::new("sh")
            .args(["-c", "echo boom >&2; exit 3"])
            .run()
            .await
            .unwrap_err();

        match err {
            MediaError::ProcessFailed {
                stderr, exit_code, ..
            } => {
                assert_eq!(exit_code, Some(3));
                assert!(stderr.unwrap().contains("boom"));
            }
            other => panic!("expected ProcessFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_completion_deadline_kills_process() {
        let start = Instant::now();
        let err = BoundedCommand::new("sleep")
            .arg("30")
            .with_deadlines(Duration::from_secs(5), Duration::from_millis(200))
            .run()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            MediaError::Timeout {
                phase: ProcessPhase::Completion,
                ..
            }
        ));
        // The child must be dead and reaped well before its 30s sleep.
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_failure() {
        let err = BoundedCommand::new("/nonexistent/program-xyz")
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::SpawnFailed(_)));
    }

    #[test]
    fn test_append_clipped_truncates() {
        let mut buf = String::new();
        append_clipped(&mut buf, "abcdef", 4);
        assert!(buf.starts_with("abcd"));
        assert!(buf.ends_with("(truncated)"));

        let before = buf.clone();
        append_clipped(&mut buf, "more", 4);
        assert_eq!(buf, before);
    }

    #[test]
    fn test_append_clipped_joins_lines() {
        let mut buf = String::new();
        append_clipped(&mut buf, "one", 100);
        append_clipped(&mut buf, "two", 100);
        assert_eq!(buf, "one\ntwo");
    }
}
