pub mod completions;
pub mod config;
pub mod files;
pub mod jobs;
pub mod md;
pub mod session;

use anyhow::{Context, Result};
use hpgate::ops::{dispatch, Cluster, Operation, ToolResponse};
use hpgate::Config;

/// Connects to the configured cluster and runs one operation.
pub fn run_operation(op: Operation) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let cluster = Cluster::from_config(config).context("Failed to set up the SSH session")?;
    emit(dispatch(&cluster, &op))
}

/// Prints a successful response; an error response becomes the command's
/// error so the process exits non-zero.
pub fn emit(response: ToolResponse) -> Result<()> {
    if response.is_error {
        anyhow::bail!("{}", response.text);
    }
    println!("{}", response.text);
    Ok(())
}
