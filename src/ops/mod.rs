//! Cluster operations built on the remote layer.
//!
//! A [`Cluster`] bundles the configuration, the shared session, the command
//! executor and the scp transfer. The scheduler, file and simulation
//! operations are implemented on it in their own modules; [`dispatch`] routes
//! an [`Operation`] to the right one and always yields a [`ToolResponse`].

pub mod dispatch;
pub mod files;
pub mod md;
pub mod policy;
pub mod slurm;

use log::error;
use serde::Serialize;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::remote::{CommandExecutor, CommandResult, ScpTransfer, SessionManager};

pub use dispatch::{dispatch, read_resource, Operation, Resource};
pub use policy::PathPolicy;
pub use slurm::OutputKind;

/// Text plus an error flag: the shape every operation reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    pub text: String,
    pub is_error: bool,
}

impl ToolResponse {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }

    /// Pretty-printed JSON of `value`.
    pub fn json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_string_pretty(value) {
            Ok(text) => Self::ok(text),
            Err(e) => {
                error!("Failed to serialize response: {}", e);
                Self::from(Error::from(e))
            }
        }
    }

    /// Passes a command result through unchanged.
    pub fn from_command(result: &CommandResult) -> Self {
        Self {
            text: result.message(),
            is_error: !result.is_success(),
        }
    }
}

impl From<Error> for ToolResponse {
    fn from(e: Error) -> Self {
        Self::error(e.to_string())
    }
}

impl<T: Serialize> From<Result<T>> for ToolResponse {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Self::json(&value),
            Err(e) => Self::from(e),
        }
    }
}

/// Everything an operation needs to reach the cluster.
#[derive(Debug, Clone)]
pub struct Cluster {
    config: Config,
    policy: PathPolicy,
    session: Arc<SessionManager>,
    executor: CommandExecutor,
    transfer: ScpTransfer,
}

impl Cluster {
    /// Builds the session from `config` and wires everything to it.
    pub fn from_config(config: Config) -> Result<Self> {
        let session = Arc::new(SessionManager::from_config(&config)?);
        Ok(Self::with_session(config, session))
    }

    /// Uses an existing session, for example one with custom ssh programs.
    pub fn with_session(config: Config, session: Arc<SessionManager>) -> Self {
        let executor = CommandExecutor::from_config(Arc::clone(&session), &config);
        let transfer =
            ScpTransfer::new(Arc::clone(&session)).with_timeout(config.long_command_timeout());
        Self {
            policy: PathPolicy::from_config(&config),
            config,
            session,
            executor,
            transfer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn policy(&self) -> &PathPolicy {
        &self.policy
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn executor(&self) -> &CommandExecutor {
        &self.executor
    }

    pub fn transfer(&self) -> &ScpTransfer {
        &self.transfer
    }

    /// Runs `command` under the default budget.
    pub(crate) fn run(&self, command: &str) -> CommandResult {
        self.executor.execute(command, None)
    }

    /// Checks a remote path, producing the refusal response on failure.
    pub(crate) fn allowed_path(&self, path: &str) -> std::result::Result<String, ToolResponse> {
        self.policy.check(path).map_err(|e| {
            ToolResponse::error(format!(
                "{}\nAllowed paths: {}",
                e,
                self.policy.bases().join(", ")
            ))
        })
    }
}
