//! Remote file commands.

use anyhow::{Context, Result};
use clap::Args;
use hpgate::ops::Operation;
use std::fs;
use std::io;
use std::path::PathBuf;

use super::run_operation;

#[derive(Args)]
#[command(about = "List a remote directory")]
pub struct LsCommand {
    path: String,

    /// Flags passed to ls
    #[arg(short, long, default_value = "-la", allow_hyphen_values = true)]
    options: String,
}

impl LsCommand {
    pub fn execute(self) -> Result<()> {
        run_operation(Operation::Ls {
            path: self.path,
            options: Some(self.options),
        })
    }
}

#[derive(Args)]
#[command(about = "Print a remote file")]
pub struct ReadCommand {
    path: String,

    /// Only print the last N lines
    #[arg(short = 'n', long)]
    lines: Option<u32>,
}

impl ReadCommand {
    pub fn execute(self) -> Result<()> {
        run_operation(Operation::Read {
            path: self.path,
            lines: self.lines,
        })
    }
}

#[derive(Args)]
#[command(about = "Write a remote file from a local file or stdin")]
pub struct WriteCommand {
    path: String,

    /// Local file with the content (reads stdin when omitted)
    #[arg(short, long)]
    from: Option<PathBuf>,
}

impl WriteCommand {
    pub fn execute(self) -> Result<()> {
        let content = match &self.from {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
            None => io::read_to_string(io::stdin()).context("Failed to read stdin")?,
        };

        run_operation(Operation::Write {
            path: self.path,
            content,
        })
    }
}

#[derive(Args)]
#[command(about = "Copy a local file to the cluster")]
pub struct UploadCommand {
    local_path: PathBuf,
    remote_path: String,
}

impl UploadCommand {
    pub fn execute(self) -> Result<()> {
        run_operation(Operation::Upload {
            local_path: self.local_path,
            remote_path: self.remote_path,
        })
    }
}

#[derive(Args)]
#[command(about = "Copy a remote file to the local machine")]
pub struct DownloadCommand {
    remote_path: String,
    local_path: PathBuf,
}

impl DownloadCommand {
    pub fn execute(self) -> Result<()> {
        run_operation(Operation::Download {
            remote_path: self.remote_path,
            local_path: self.local_path,
        })
    }
}

#[derive(Args)]
#[command(about = "Check whether a remote file exists")]
pub struct ExistsCommand {
    path: String,
}

impl ExistsCommand {
    pub fn execute(self) -> Result<()> {
        run_operation(Operation::Exists { path: self.path })
    }
}

#[derive(Args)]
#[command(about = "Show remote file metadata")]
pub struct StatCommand {
    path: String,
}

impl StatCommand {
    pub fn execute(self) -> Result<()> {
        run_operation(Operation::Stat { path: self.path })
    }
}
