//! Remote command execution over the multiplexed session.
//!
//! This module provides the [`CommandExecutor`] for running command strings
//! on the cluster under a timeout, and the [`CommandResult`] every run is
//! normalized into.

use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::remote::process::{run_with_timeout, ProcessOutcome};
use crate::remote::session::{SessionIdentity, SessionManager};

/// Text returned in place of an empty stdout on success.
pub const NO_OUTPUT: &str = "(no output)";

/// `ssh` reserves this status for its own connection failures.
const SSH_CONNECTION_ERROR: i32 = 255;

const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_LONG_COMMAND_TIMEOUT: Duration = Duration::from_secs(600);

/// How a command run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "code", rename_all = "kebab-case")]
pub enum ExitClass {
    /// Ran to completion with status 0
    Success,
    /// Ran to completion with a non-zero status
    Failure(i32),
    /// Did not finish within its budget and was killed
    Timeout,
    /// Could not start, or the channel itself failed
    TransportError,
}

impl fmt::Display for ExitClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitClass::Success => write!(f, "success"),
            ExitClass::Failure(code) => write!(f, "failure({})", code),
            ExitClass::Timeout => write!(f, "timeout"),
            ExitClass::TransportError => write!(f, "transport-error"),
        }
    }
}

/// Normalized outcome of one command invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandResult {
    pub exit: ExitClass,
    /// Captured stdout, trailing whitespace trimmed
    pub stdout: String,
    /// Captured stderr, trailing whitespace trimmed
    pub stderr: String,
    /// Budget the command ran under
    #[serde(skip)]
    pub timeout: Duration,
}

impl CommandResult {
    /// Returns true if the command ran and exited with status 0.
    pub fn is_success(&self) -> bool {
        self.exit == ExitClass::Success
    }

    /// Human-readable text for the caller: the output on success, otherwise
    /// an explanation of what went wrong.
    pub fn message(&self) -> String {
        match self.exit {
            ExitClass::Success => self.stdout.clone(),
            ExitClass::Failure(code) => format!(
                "Command failed (exit {}):\n{}",
                code,
                self.explanation()
            ),
            ExitClass::Timeout => format!(
                "Command timed out after {}",
                format_duration(self.timeout)
            ),
            ExitClass::TransportError => format!("SSH error: {}", self.explanation()),
        }
    }

    /// stderr, or stdout when stderr is empty.
    pub fn explanation(&self) -> &str {
        if self.stderr.is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

/// Runs `program args...` under `timeout` and classifies the outcome.
pub fn run_program(program: &Path, args: &[String], timeout: Duration) -> CommandResult {
    let mut cmd = Command::new(program);
    cmd.args(args);

    match run_with_timeout(cmd, timeout) {
        ProcessOutcome::Exited {
            code,
            stdout,
            stderr,
        } => {
            let exit = match code {
                Some(0) => ExitClass::Success,
                Some(SSH_CONNECTION_ERROR) => ExitClass::TransportError,
                Some(code) => ExitClass::Failure(code),
                None => ExitClass::TransportError,
            };
            let mut stderr = stderr.trim_end().to_string();
            if code.is_none() && stderr.is_empty() {
                stderr = format!("{} was terminated by a signal", program.display());
            }
            CommandResult {
                exit,
                stdout: stdout.trim_end().to_string(),
                stderr,
                timeout,
            }
        }
        ProcessOutcome::TimedOut { stdout, stderr } => CommandResult {
            exit: ExitClass::Timeout,
            stdout: stdout.trim_end().to_string(),
            stderr: stderr.trim_end().to_string(),
            timeout,
        },
        ProcessOutcome::SpawnFailed(e) => CommandResult {
            exit: ExitClass::TransportError,
            stdout: String::new(),
            stderr: format!("failed to start {}: {}", program.display(), e),
            timeout,
        },
    }
}

/// Runs `command` on the remote host through the identity's channel.
pub fn run_ssh(identity: &SessionIdentity, command: &str, timeout: Duration) -> CommandResult {
    run_program(
        &identity.ssh_program,
        &identity.ssh_args(Some(command)),
        timeout,
    )
}

/// Executes command strings against a shared session.
///
/// The executor never authenticates on its own; it relies on the control
/// master of its [`SessionManager`]. Each call is an independent unit of work
/// bounded by its own timeout.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    session: Arc<SessionManager>,
    default_timeout: Duration,
    long_timeout: Duration,
}

impl CommandExecutor {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self {
            session,
            default_timeout: DEFAULT_COMMAND_TIMEOUT,
            long_timeout: DEFAULT_LONG_COMMAND_TIMEOUT,
        }
    }

    /// Uses the command and long-command budgets from `config`.
    pub fn from_config(session: Arc<SessionManager>, config: &Config) -> Self {
        Self::new(session).with_timeouts(config.command_timeout(), config.long_command_timeout())
    }

    pub fn with_timeouts(mut self, default_timeout: Duration, long_timeout: Duration) -> Self {
        self.default_timeout = default_timeout;
        self.long_timeout = long_timeout;
        self
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    pub fn long_timeout(&self) -> Duration {
        self.long_timeout
    }

    /// Executes `command`, defaulting to the medium budget.
    ///
    /// Empty stdout on success becomes [`NO_OUTPUT`]. Every call updates the
    /// session's last-invocation record.
    pub fn execute(&self, command: &str, timeout: Option<Duration>) -> CommandResult {
        let timeout = timeout.unwrap_or(self.default_timeout);
        info!("Executing remote command: {}", first_line(command));

        if !self.session.is_live() {
            debug!("No control socket yet, this command will open the master connection");
        }

        let mut result = run_ssh(self.session.identity(), command, timeout);
        self.session.record_invocation(command);

        match result.exit {
            ExitClass::Success => {
                if result.stdout.is_empty() {
                    result.stdout = NO_OUTPUT.to_string();
                }
            }
            ExitClass::Failure(code) => debug!("Command exit code: {}", code),
            ExitClass::Timeout => warn!("Command timed out after {:?}", timeout),
            ExitClass::TransportError => warn!("Transport error: {}", result.stderr),
        }

        if !result.stderr.is_empty() {
            debug!("Command stderr: {}", result.stderr);
        }

        result
    }

    /// Executes `command` under the long budget.
    pub fn execute_long(&self, command: &str) -> CommandResult {
        self.execute(command, Some(self.long_timeout))
    }
}

fn first_line(command: &str) -> &str {
    command.trim().lines().next().unwrap_or("")
}

fn format_duration(d: Duration) -> String {
    if d.subsec_millis() == 0 {
        format!("{}s", d.as_secs())
    } else {
        format!("{}ms", d.as_millis())
    }
}
