//! Connection management, raw command execution and the operation catalog.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use hpgate::ops::{read_resource, Cluster, Operation, Resource};
use hpgate::Config;

use super::{emit, run_operation};

#[derive(Args)]
#[command(about = "Open the multiplexed SSH connection")]
pub struct ConnectCommand {
    /// Retry this many times with exponential backoff
    #[arg(long, default_value = "0")]
    retries: u32,
}

impl ConnectCommand {
    pub fn execute(self) -> Result<()> {
        run_operation(Operation::Connect {
            retries: self.retries,
        })
    }
}

#[derive(Args)]
#[command(about = "Close the control master")]
pub struct DisconnectCommand {}

impl DisconnectCommand {
    pub fn execute(self) -> Result<()> {
        run_operation(Operation::Disconnect)
    }
}

#[derive(Args)]
#[command(about = "Show connection state")]
pub struct StatusCommand {}

impl StatusCommand {
    pub fn execute(self) -> Result<()> {
        run_operation(Operation::Status)
    }
}

#[derive(Args)]
#[command(about = "Run a shell command on the login node")]
pub struct ExecCommand {
    /// Timeout in seconds (default: command_timeout_ms from the config)
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Command to run
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

impl ExecCommand {
    pub fn execute(self) -> Result<()> {
        run_operation(self.into_operation())
    }

    fn into_operation(self) -> Operation {
        Operation::Exec {
            command: self.command.join(" "),
            timeout_ms: self.timeout.map(|s| s.saturating_mul(1000)),
        }
    }
}

#[derive(Args)]
#[command(about = "List available operations")]
pub struct OperationsCommand {}

impl OperationsCommand {
    pub fn execute(self) -> Result<()> {
        let width = Operation::catalog()
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0);

        for (name, description) in Operation::catalog() {
            println!("  {:<width$}  {}", name, description, width = width);
        }
        Ok(())
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ResourceKind {
    /// Connection settings and socket state
    Config,
    /// Queue of the configured user
    Queue,
}

#[derive(Args)]
#[command(about = "Read a resource view")]
pub struct ResourceCommand {
    #[arg(value_enum)]
    kind: ResourceKind,
}

impl ResourceCommand {
    pub fn execute(self) -> Result<()> {
        let resource = match self.kind {
            ResourceKind::Config => Resource::Config,
            ResourceKind::Queue => Resource::Queue,
        };

        let config = Config::load().context("Failed to load configuration")?;
        let cluster = Cluster::from_config(config)?;
        emit(read_resource(&cluster, resource))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exec(timeout: Option<u64>) -> Operation {
        ExecCommand {
            timeout,
            command: vec!["squeue".to_string(), "-u".to_string(), "alice".to_string()],
        }
        .into_operation()
    }

    #[test]
    fn test_exec_timeout_in_milliseconds() {
        match exec(Some(30)) {
            Operation::Exec {
                command,
                timeout_ms,
            } => {
                assert_eq!(command, "squeue -u alice");
                assert_eq!(timeout_ms, Some(30_000));
            }
            _ => panic!("expected exec operation"),
        }
    }

    #[test]
    fn test_exec_huge_timeout_saturates() {
        match exec(Some(u64::MAX)) {
            Operation::Exec { timeout_ms, .. } => assert_eq!(timeout_ms, Some(u64::MAX)),
            _ => panic!("expected exec operation"),
        }
    }
}
