//! External command execution for on-change hooks.
//!
//! A [`CommandDescriptor`] is the parsed, immutable form of an `onChange`
//! declaration. Every invocation derives a fresh [`CommandHandle`] from it;
//! a handle is consumed by [`CommandHandle::run`] and cannot be started a
//! second time (rejected with E0382, use of moved value):
//!
//! ```compile_fail,E0382
//! # async fn demo(descriptor: kvpilot::CommandDescriptor) {
//! let context = kvpilot::RunContext::new("OnChange", "app/config");
//! let handle = descriptor.handle();
//! let _ = handle.run(&context).await;
//! let _ = handle.run(&context).await; // handle was moved by the first run
//! # }
//! ```


use std::io;
use std::process::Stdio;
use std::time::Duration;

use serde_json::Value;
use tokio::process::Command;
use tracing::info;
use tracing::warn;

use crate::utils::time::parse_duration;
use crate::CommandError;
use crate::Result;
use crate::ValidationError;

/// Structured fields attached to every log line of a command run
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Role of the process, e.g. `OnChange`
    pub process: &'static str,
    /// Watch path that triggered the run
    pub path: String,
}

impl RunContext {
    pub fn new(
        process: &'static str,
        path: impl Into<String>,
    ) -> Self {
        Self {
            process,
            path: path.into(),
        }
    }
}

/// Argv plus optional timeout. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    argv: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandDescriptor {
    /// Returns `None` when `argv` is empty.
    pub fn new(
        argv: Vec<String>,
        timeout: Option<Duration>,
    ) -> Option<Self> {
        if argv.is_empty() {
            return None;
        }
        Some(Self { argv, timeout })
    }

    /// Parses a raw `onChange` value and its `timeout`.
    ///
    /// A string is split on whitespace, an array must hold only strings.
    /// Absent, blank or empty declarations yield `Ok(None)`. `path` only
    /// labels the error.
    pub fn parse(
        raw: Option<&Value>,
        timeout: Option<&str>,
        path: &str,
    ) -> Result<Option<Self>> {
        let malformed = |reason: &str| ValidationError::MalformedCommand {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        let argv: Vec<String> = match raw {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::String(line)) => line.split_whitespace().map(str::to_string).collect(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| malformed("command array must contain only strings"))
                })
                .collect::<std::result::Result<_, _>>()?,
            Some(_) => return Err(malformed("command argument must be a string or an array").into()),
        };
        if argv.is_empty() {
            return Ok(None);
        }

        let timeout = match timeout {
            None => None,
            Some(value) => Some(parse_duration(value).filter(|d| !d.is_zero()).ok_or_else(|| {
                ValidationError::InvalidTimeout {
                    path: path.to_string(),
                    value: value.to_string(),
                }
            })?),
        };

        Ok(Self::new(argv, timeout))
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Derives a fresh, unstarted process handle.
    pub fn handle(&self) -> CommandHandle {
        let mut command = Command::new(self.program());
        command
            .args(self.args())
            .stdin(Stdio::null())
            .kill_on_drop(true);
        // Own process group, so a timeout can take down every descendant
        #[cfg(unix)]
        command.process_group(0);

        CommandHandle {
            program: self.program().to_string(),
            command,
            timeout: self.timeout,
        }
    }
}

/// Single-use process handle derived from a [`CommandDescriptor`].
pub struct CommandHandle {
    program: String,
    command: Command,
    timeout: Option<Duration>,
}

impl CommandHandle {
    /// Spawns the process and waits for it, killing it once the timeout
    /// elapses. Returns the exit code, which is always `0` on success.
    pub async fn run(
        mut self,
        context: &RunContext,
    ) -> Result<i32> {
        let program = self.program;
        info!(process = context.process, path = %context.path, %program, "command started");

        let mut child = self.command.spawn().map_err(|source| {
            warn!(process = context.process, path = %context.path, %program, "command failed to spawn: {}", source);
            CommandError::Spawn {
                program: program.clone(),
                source,
            }
        })?;

        let waited = match self.timeout {
            Some(limit) => {
                let waited = tokio::time::timeout(limit, child.wait()).await;
                match waited {
                    Ok(status) => status,
                    Err(_) => {
                        warn!(
                            process = context.process,
                            path = %context.path,
                            %program,
                            timeout = ?limit,
                            "command timed out, killing it"
                        );
                        if let Some(pid) = child.id() {
                            if let Err(e) = kill_process_group(pid) {
                                warn!(%program, pid, "failed to kill process group: {}", e);
                            }
                        }
                        if let Err(e) = child.kill().await {
                            warn!(%program, "failed to kill timed out command: {}", e);
                        }
                        return Err(CommandError::Timeout { program, after: limit }.into());
                    }
                }
            }
            None => child.wait().await,
        };

        let status = waited.map_err(|source| CommandError::Wait {
            program: program.clone(),
            source,
        })?;

        let code = status.code().unwrap_or(-1);
        if status.success() {
            info!(process = context.process, path = %context.path, %program, code, "command exited");
            Ok(code)
        } else {
            warn!(process = context.process, path = %context.path, %program, code, "command exited with failure");
            Err(CommandError::NonZeroExit { program, code }.into())
        }
    }
}

/// Sends SIGKILL to the process group led by `pid`.
#[cfg(unix)]
fn kill_process_group(pid: u32) -> io::Result<()> {
    let pgid = libc::pid_t::try_from(pid).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    // SAFETY: plain syscall, a negative pid addresses the group
    if unsafe { libc::kill(-pgid, libc::SIGKILL) } == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) -> io::Result<()> {
    Ok(())
}

/// Runs `descriptor` once on a freshly derived handle. No retries.
pub async fn run_with_fields(
    descriptor: &CommandDescriptor,
    context: &RunContext,
) -> Result<i32> {
    descriptor.handle().run(context).await
}
