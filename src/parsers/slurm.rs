//! Small extractors for sbatch and scontrol replies.

use super::markers::Marker;

static SUBMITTED: Marker = Marker::new(r"Submitted batch job (\d+)");
static STDOUT_PATH: Marker = Marker::new(r"StdOut=(\S+)");
static STDERR_PATH: Marker = Marker::new(r"StdErr=(\S+)");

/// Job id from `sbatch` output, if the submission was accepted.
pub fn parse_submitted_job_id(text: &str) -> Option<String> {
    SUBMITTED.capture(text, 1).map(str::to_string)
}

/// Output file paths named by `scontrol show job`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobOutputPaths {
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

impl JobOutputPaths {
    pub fn is_empty(&self) -> bool {
        self.stdout.is_none() && self.stderr.is_none()
    }
}

pub fn parse_job_output_paths(text: &str) -> JobOutputPaths {
    JobOutputPaths {
        stdout: STDOUT_PATH.capture(text, 1).map(str::to_string),
        stderr: STDERR_PATH.capture(text, 1).map(str::to_string),
    }
}
