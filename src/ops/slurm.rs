//! SLURM job management.

use clap::ValueEnum;
use log::{debug, info};
use serde::Serialize;

use super::policy::{require, shell_quote};
use super::{Cluster, ToolResponse};
use crate::parsers::{
    parse_accounting, parse_job_output_paths, parse_queue, parse_submitted_job_id,
    AccountingEntry, QueueEntry, SACCT_FIELDS,
};
use crate::remote::NO_OUTPUT;

/// Column layout the queue parser expects.
pub const QUEUE_FORMAT: &str = "%.18i %.12P %.30j %.10u %.8T %.10M %.10l %.6D %R";

const START_FORMAT: &str = "%.18i %.12P %.30j %.10u %.8T %S";
const OUTPUT_TAIL_LINES: usize = 100;
const FALLBACK_SEARCH_LIMIT: usize = 5;

/// Which of a job's output streams to show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, serde::Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Stdout,
    Stderr,
    #[default]
    Both,
}

impl OutputKind {
    fn includes_stdout(self) -> bool {
        matches!(self, OutputKind::Stdout | OutputKind::Both)
    }

    fn includes_stderr(self) -> bool {
        matches!(self, OutputKind::Stderr | OutputKind::Both)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub success: bool,
    pub job_id: String,
    pub message: String,
    pub script: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueQuery {
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QueueReport {
    pub jobs: Vec<QueueEntry>,
    pub count: usize,
    pub query: QueueQuery,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountingReport {
    pub job_id: String,
    pub steps: Vec<AccountingEntry>,
}

impl Cluster {
    /// Submits a batch script, optionally from `workdir`.
    pub fn submit(&self, script: &str, workdir: Option<&str>) -> ToolResponse {
        let script = match require("script", script) {
            Ok(s) => s,
            Err(e) => return e.into(),
        };

        let command = match workdir {
            Some(dir) => format!("cd {} && sbatch {}", shell_quote(dir), shell_quote(script)),
            None => format!("sbatch {}", shell_quote(script)),
        };

        let result = self.run(&command);
        match parse_submitted_job_id(&result.stdout) {
            Some(job_id) if result.is_success() => {
                info!("Submitted job {}", job_id);
                ToolResponse::json(&Submission {
                    success: true,
                    message: format!("Job {} submitted successfully", job_id),
                    job_id,
                    script: script.to_string(),
                })
            }
            _ => ToolResponse::from_command(&result),
        }
    }

    /// Lists jobs for one job id, one user, or the configured user.
    pub fn queue(&self, user: Option<&str>, job_id: Option<&str>) -> ToolResponse {
        let mut command = format!("squeue --format=\"{}\"", QUEUE_FORMAT);
        let user = user
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(&self.config().user)
            .to_string();

        match job_id {
            Some(id) => command.push_str(&format!(" -j {}", shell_quote(id))),
            None => command.push_str(&format!(" -u {}", shell_quote(&user))),
        }

        let result = self.run(&command);
        if !result.is_success() {
            return ToolResponse::from_command(&result);
        }

        let jobs = parse_queue(&result.stdout);
        debug!("Queue has {} job(s)", jobs.len());
        ToolResponse::json(&QueueReport {
            count: jobs.len(),
            jobs,
            query: QueueQuery {
                user,
                job_id: job_id.map(str::to_string),
            },
        })
    }

    /// Accounting records for a job and its steps.
    pub fn accounting(&self, job_id: &str) -> ToolResponse {
        let job_id = match require("job id", job_id) {
            Ok(id) => id,
            Err(e) => return e.into(),
        };

        let command = format!(
            "sacct -j {} --format={} --noheader --parsable2",
            shell_quote(job_id),
            SACCT_FIELDS.join(",")
        );
        let result = self.run(&command);
        if !result.is_success() {
            return ToolResponse::from_command(&result);
        }

        ToolResponse::json(&AccountingReport {
            job_id: job_id.to_string(),
            steps: parse_accounting(&result.stdout),
        })
    }

    pub fn cancel(&self, job_id: &str) -> ToolResponse {
        let job_id = match require("job id", job_id) {
            Ok(id) => id,
            Err(e) => return e.into(),
        };

        let result = self.run(&format!("scancel {}", shell_quote(job_id)));
        if result.is_success() && result.stdout == NO_OUTPUT {
            info!("Cancelled job {}", job_id);
            return ToolResponse::ok(format!("Job {} cancelled successfully", job_id));
        }
        ToolResponse::from_command(&result)
    }

    /// Tail of a job's output files.
    ///
    /// The paths come from `scontrol`; once the job has left the controller
    /// the project base is searched for files named after the job id.
    pub fn job_output(&self, job_id: &str, kind: OutputKind) -> ToolResponse {
        let job_id = match require("job id", job_id) {
            Ok(id) => id,
            Err(e) => return e.into(),
        };

        let info = self.run(&format!("scontrol show job {}", shell_quote(job_id)));
        if !info.is_success() {
            debug!("scontrol failed for {}, searching project base", job_id);
            let pattern_out = shell_quote(&format!("*{}*.out", job_id));
            let pattern_err = shell_quote(&format!("*{}*.err", job_id));
            let command = format!(
                "find {} -name {} -o -name {} 2>/dev/null | head -{}",
                shell_quote(&self.config().project_base),
                pattern_out,
                pattern_err,
                FALLBACK_SEARCH_LIMIT
            );
            return ToolResponse::from_command(&self.run(&command));
        }

        let paths = parse_job_output_paths(&info.stdout);
        let mut sections = Vec::new();
        if kind.includes_stdout() {
            if let Some(path) = &paths.stdout {
                sections.push(self.output_section("STDOUT", path));
            }
        }
        if kind.includes_stderr() {
            if let Some(path) = &paths.stderr {
                sections.push(self.output_section("STDERR", path));
            }
        }

        if sections.is_empty() {
            ToolResponse::ok("No output files found")
        } else {
            ToolResponse::ok(sections.join("\n\n"))
        }
    }

    fn output_section(&self, label: &str, path: &str) -> String {
        let result = self.run(&format!("tail -{} {}", OUTPUT_TAIL_LINES, shell_quote(path)));
        let body = match result.message() {
            text if text.is_empty() || text == NO_OUTPUT => "(empty)".to_string(),
            text => text,
        };
        format!("=== {} ({}) ===\n{}", label, path, body)
    }

    /// Scheduler's start time estimate for a pending job.
    pub fn estimated_start(&self, job_id: &str) -> ToolResponse {
        let job_id = match require("job id", job_id) {
            Ok(id) => id,
            Err(e) => return e.into(),
        };

        let command = format!(
            "squeue -j {} --start --format=\"{}\"",
            shell_quote(job_id),
            START_FORMAT
        );
        ToolResponse::from_command(&self.run(&command))
    }
}
