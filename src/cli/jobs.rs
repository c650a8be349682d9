//! SLURM commands.

use anyhow::Result;
use clap::Args;
use hpgate::ops::{Operation, OutputKind};

use super::run_operation;

#[derive(Args)]
#[command(about = "Submit a batch script")]
pub struct SubmitCommand {
    /// Path of the script on the cluster
    script: String,

    /// Directory to submit from
    #[arg(short, long)]
    workdir: Option<String>,
}

impl SubmitCommand {
    pub fn execute(self) -> Result<()> {
        run_operation(Operation::Submit {
            script: self.script,
            workdir: self.workdir,
        })
    }
}

#[derive(Args)]
#[command(about = "List queued and running jobs")]
pub struct QueueCommand {
    /// Show jobs of this user (default: the configured user)
    #[arg(short, long)]
    user: Option<String>,

    /// Show a single job
    #[arg(short, long)]
    job: Option<String>,
}

impl QueueCommand {
    pub fn execute(self) -> Result<()> {
        run_operation(Operation::Queue {
            user: self.user,
            job_id: self.job,
        })
    }
}

#[derive(Args)]
#[command(about = "Show accounting records for a job")]
pub struct SacctCommand {
    job_id: String,
}

impl SacctCommand {
    pub fn execute(self) -> Result<()> {
        run_operation(Operation::Accounting {
            job_id: self.job_id,
        })
    }
}

#[derive(Args)]
#[command(about = "Cancel a job")]
pub struct CancelCommand {
    job_id: String,
}

impl CancelCommand {
    pub fn execute(self) -> Result<()> {
        run_operation(Operation::Cancel {
            job_id: self.job_id,
        })
    }
}

#[derive(Args)]
#[command(about = "Show the tail of a job's output files")]
pub struct JobOutputCommand {
    job_id: String,

    /// Which stream to show
    #[arg(short, long, value_enum, default_value = "both")]
    kind: OutputKind,
}

impl JobOutputCommand {
    pub fn execute(self) -> Result<()> {
        run_operation(Operation::JobOutput {
            job_id: self.job_id,
            kind: self.kind,
        })
    }
}

#[derive(Args)]
#[command(about = "Show the estimated start time of a pending job")]
pub struct EstimatedStartCommand {
    job_id: String,
}

impl EstimatedStartCommand {
    pub fn execute(self) -> Result<()> {
        run_operation(Operation::EstimatedStart {
            job_id: self.job_id,
        })
    }
}
