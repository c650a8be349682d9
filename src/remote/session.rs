//! Multiplexed SSH session identity and lifecycle.
//!
//! A [`SessionManager`] owns one [`SessionIdentity`]. The first command run
//! against it makes OpenSSH start a control master (`ControlMaster=auto`) that
//! keeps the authenticated connection alive behind a control socket; later
//! commands reuse it. Liveness is never cached: [`SessionManager::is_live`]
//! looks at the control socket every time, and [`SessionManager::status`]
//! re-probes the channel.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use crate::config::{expand_home, Config};
use crate::error::{Error, Result};
use crate::remote::diagnostics::diagnose_connect_failure;
use crate::remote::executor::{run_ssh, ExitClass};

/// Budget for the probe `status()` runs and for `ssh -O exit`.
const QUICK_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

const CONNECT_BANNER: &str = "hpgate connection established";

/// The durable (host, user, port, credential, channel) tuple of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionIdentity {
    pub host: String,
    pub user: String,
    pub port: u16,
    /// Private key passed with `-i`
    pub identity_file: PathBuf,
    /// Control socket template, `~` already expanded
    pub control_path: String,
    /// Program used for commands (normally `ssh`)
    pub ssh_program: PathBuf,
    /// Program used for transfers (normally `scp`)
    pub scp_program: PathBuf,
}

impl SessionIdentity {
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        let defaults = Config::default();
        Self {
            host: host.into(),
            user: user.into(),
            port: defaults.port,
            identity_file: expand_home(&defaults.identity_file),
            control_path: expand_home(&defaults.control_path)
                .to_string_lossy()
                .into_owned(),
            ssh_program: PathBuf::from("ssh"),
            scp_program: PathBuf::from("scp"),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.host.clone(), config.user.clone())
            .with_port(config.port)
            .with_identity_file(expand_home(&config.identity_file))
            .with_control_path(expand_home(&config.control_path).to_string_lossy())
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_identity_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.identity_file = path.into();
        self
    }

    pub fn with_control_path(mut self, template: impl Into<String>) -> Self {
        self.control_path = template.into();
        self
    }

    /// Overrides the `ssh` binary, mainly for tests.
    pub fn with_ssh_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.ssh_program = program.into();
        self
    }

    /// Overrides the `scp` binary, mainly for tests.
    pub fn with_scp_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.scp_program = program.into();
        self
    }

    /// `user@host`
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// `user@host:port`
    pub fn connection_string(&self) -> String {
        format!("{}@{}:{}", self.user, self.host, self.port)
    }

    /// The socket path OpenSSH derives from the control path template.
    pub fn control_socket(&self) -> PathBuf {
        PathBuf::from(
            self.control_path
                .replace("%r", &self.user)
                .replace("%h", &self.host)
                .replace("%p", &self.port.to_string()),
        )
    }

    /// Arguments for one multiplexed `ssh` invocation.
    pub fn ssh_args(&self, command: Option<&str>) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            "-o".to_string(),
            format!("ControlPath={}", self.control_path),
            "-o".to_string(),
            "ControlMaster=auto".to_string(),
            "-o".to_string(),
            "ControlPersist=4h".to_string(),
            "-o".to_string(),
            "ServerAliveInterval=60".to_string(),
            "-o".to_string(),
            "ServerAliveCountMax=3".to_string(),
            "-p".to_string(),
            self.port.to_string(),
            "-i".to_string(),
            self.identity_file.to_string_lossy().into_owned(),
            self.destination(),
        ];

        if let Some(command) = command {
            args.push("--".to_string());
            args.push(command.to_string());
        }

        args
    }

    /// Arguments asking the control master to shut down.
    pub fn exit_args(&self) -> Vec<String> {
        vec![
            "-O".to_string(),
            "exit".to_string(),
            "-o".to_string(),
            format!("ControlPath={}", self.control_path),
            self.destination(),
        ]
    }

    /// Arguments for one `scp` copy reusing the control master. Note that
    /// `scp` takes the port with `-P`.
    pub fn scp_args(&self, source: &str, destination: &str) -> Vec<String> {
        vec![
            "-o".to_string(),
            format!("ControlPath={}", self.control_path),
            "-o".to_string(),
            "ControlMaster=auto".to_string(),
            "-P".to_string(),
            self.port.to_string(),
            "-i".to_string(),
            self.identity_file.to_string_lossy().into_owned(),
            source.to_string(),
            destination.to_string(),
        ]
    }

    /// `user@host:path` for scp.
    pub fn remote_spec(&self, remote_path: &str) -> String {
        format!("{}:{}", self.destination(), remote_path)
    }
}

/// The last command sent through the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastInvocation {
    pub command: String,
    pub at: DateTime<Utc>,
}

/// Observed state of the session, as reported by `status()`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub connected: bool,
    pub host: String,
    pub user: String,
    pub port: u16,
    pub control_socket_exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_command_time: Option<DateTime<Utc>>,
}

/// Owns a session identity and the diagnostics recorded against it.
///
/// No locking is done around command execution; concurrent commands each
/// get their own multiplexed sub-channel. The last-invocation record is
/// last-write-wins.
#[derive(Debug)]
pub struct SessionManager {
    identity: SessionIdentity,
    connection_timeout: Duration,
    last_invocation: Mutex<Option<LastInvocation>>,
}

impl SessionManager {
    /// Creates a manager and makes sure the control socket directory exists.
    pub fn new(identity: SessionIdentity, connection_timeout: Duration) -> Result<Self> {
        ensure_control_dir(&identity.control_socket())?;
        Ok(Self {
            identity,
            connection_timeout,
            last_invocation: Mutex::new(None),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            SessionIdentity::from_config(config),
            config.connection_timeout(),
        )
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    /// Probes the channel, starting the control master if needed.
    ///
    /// A failure is returned as [`Error::Transport`] carrying remediation
    /// steps; the manager never waits for an interactive second factor.
    pub fn connect(&self) -> Result<String> {
        info!("Connecting to {}", self.identity.connection_string());

        let result = run_ssh(
            &self.identity,
            &format!("echo '{}'", CONNECT_BANNER),
            self.connection_timeout,
        );

        match result.exit {
            ExitClass::Success => {
                info!("Connection to {} established", self.identity.host);
                Ok(format!(
                    "Connected to {} ({})",
                    self.identity.host,
                    self.identity.connection_string()
                ))
            }
            ExitClass::Timeout => Err(Error::Transport(diagnose_connect_failure(
                &format!(
                    "connection timed out after {:?}",
                    self.connection_timeout
                ),
                &self.identity,
            ))),
            _ => {
                warn!("Connection probe failed: {}", result.stderr);
                Err(Error::Transport(diagnose_connect_failure(
                    &result.stderr,
                    &self.identity,
                )))
            }
        }
    }

    /// Asks the control master to exit. An absent master counts as success.
    pub fn disconnect(&self) -> String {
        info!("Closing control master for {}", self.identity.destination());

        let result = super::executor::run_program(
            &self.identity.ssh_program,
            &self.identity.exit_args(),
            QUICK_PROBE_TIMEOUT,
        );

        if result.is_success() {
            format!("Disconnected from {}", self.identity.host)
        } else {
            debug!("Control master exit reported: {}", result.stderr);
            "Connection closed (or was not active)".to_string()
        }
    }

    /// Cheap structural check: does the control socket exist?
    ///
    /// A socket can outlive its master; the next command then reports a
    /// transport error.
    pub fn is_live(&self) -> bool {
        self.identity.control_socket().exists()
    }

    /// Reports observed liveness, re-probing the channel when a socket exists.
    pub fn status(&self) -> SessionStatus {
        let socket_exists = self.is_live();
        let connected = socket_exists
            && run_ssh(&self.identity, "echo ok", QUICK_PROBE_TIMEOUT).is_success();
        let last = self.last_invocation();

        SessionStatus {
            connected,
            host: self.identity.host.clone(),
            user: self.identity.user.clone(),
            port: self.identity.port,
            control_socket_exists: socket_exists,
            last_command: last.as_ref().map(|l| l.command.clone()),
            last_command_time: last.map(|l| l.at),
        }
    }

    /// Records `command` as the most recent invocation.
    pub fn record_invocation(&self, command: &str) {
        let record = LastInvocation {
            command: command.to_string(),
            at: Utc::now(),
        };
        match self.last_invocation.lock() {
            Ok(mut guard) => *guard = Some(record),
            Err(poisoned) => *poisoned.into_inner() = Some(record),
        }
    }

    pub fn last_invocation(&self) -> Option<LastInvocation> {
        match self.last_invocation.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

fn ensure_control_dir(socket: &Path) -> Result<()> {
    let Some(dir) = socket.parent() else {
        return Ok(());
    };
    if dir.as_os_str().is_empty() || dir.exists() {
        return Ok(());
    }

    debug!("Creating control socket directory {}", dir.display());
    create_private_dir(dir).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!(
                "Failed to create control socket directory: {}\n\n\
                 Directory: {}\n\n\
                 Suggestions:\n\
                 • Create it manually: mkdir -p -m 700 {}\n\
                 • Point control_path at a writable location",
                e,
                dir.display(),
                dir.display()
            ),
        ))
    })
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)
}
