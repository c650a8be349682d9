//! Operation routing.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::slurm::OutputKind;
use super::{Cluster, ToolResponse};
use crate::remote::{retry_with_backoff, RetryConfig};

/// Every operation the cluster gateway exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Operation {
    Connect {
        #[serde(default)]
        retries: u32,
    },
    Disconnect,
    Status,
    Exec {
        command: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
    Submit {
        script: String,
        #[serde(default)]
        workdir: Option<String>,
    },
    Queue {
        #[serde(default)]
        user: Option<String>,
        #[serde(default)]
        job_id: Option<String>,
    },
    Accounting {
        job_id: String,
    },
    Cancel {
        job_id: String,
    },
    JobOutput {
        job_id: String,
        #[serde(default)]
        kind: OutputKind,
    },
    EstimatedStart {
        job_id: String,
    },
    Ls {
        path: String,
        #[serde(default)]
        options: Option<String>,
    },
    Read {
        path: String,
        #[serde(default)]
        lines: Option<u32>,
    },
    Write {
        path: String,
        content: String,
    },
    Upload {
        local_path: PathBuf,
        remote_path: String,
    },
    Download {
        remote_path: String,
        local_path: PathBuf,
    },
    Exists {
        path: String,
    },
    Stat {
        path: String,
    },
    MdStatus {
        system_path: String,
    },
    Mdinfo {
        path: String,
    },
    ValidateRestart {
        rst7_path: String,
        prmtop_path: String,
    },
    Rmsd {
        traj_path: String,
        prmtop_path: String,
        #[serde(default)]
        mask: Option<String>,
    },
}

const CATALOG: &[(&str, &str)] = &[
    ("connect", "Open the multiplexed SSH connection to the cluster"),
    ("disconnect", "Close the control master"),
    ("status", "Report connection state and the last command run"),
    ("exec", "Run a shell command on the login node"),
    ("submit", "Submit a batch script with sbatch"),
    ("queue", "List queued and running jobs"),
    ("accounting", "Accounting records for a job and its steps"),
    ("cancel", "Cancel a job"),
    ("job_output", "Tail a job's stdout and stderr files"),
    ("estimated_start", "Scheduler estimate of a pending job's start time"),
    ("ls", "List a remote directory"),
    ("read", "Read a remote file, or its last lines"),
    ("write", "Write a remote file"),
    ("upload", "Copy a local file to the cluster"),
    ("download", "Copy a remote file to the local machine"),
    ("exists", "Check whether a remote file exists"),
    ("stat", "Show remote file metadata"),
    ("md_status", "Stage and progress of an AMBER run"),
    ("mdinfo", "Parse an AMBER mdinfo file"),
    ("validate_restart", "Check a restart file with cpptraj"),
    ("rmsd", "Quick RMSD statistics for a trajectory"),
];

impl Operation {
    /// Name and one-line description of every operation.
    pub fn catalog() -> &'static [(&'static str, &'static str)] {
        CATALOG
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Connect { .. } => "connect",
            Operation::Disconnect => "disconnect",
            Operation::Status => "status",
            Operation::Exec { .. } => "exec",
            Operation::Submit { .. } => "submit",
            Operation::Queue { .. } => "queue",
            Operation::Accounting { .. } => "accounting",
            Operation::Cancel { .. } => "cancel",
            Operation::JobOutput { .. } => "job_output",
            Operation::EstimatedStart { .. } => "estimated_start",
            Operation::Ls { .. } => "ls",
            Operation::Read { .. } => "read",
            Operation::Write { .. } => "write",
            Operation::Upload { .. } => "upload",
            Operation::Download { .. } => "download",
            Operation::Exists { .. } => "exists",
            Operation::Stat { .. } => "stat",
            Operation::MdStatus { .. } => "md_status",
            Operation::Mdinfo { .. } => "mdinfo",
            Operation::ValidateRestart { .. } => "validate_restart",
            Operation::Rmsd { .. } => "rmsd",
        }
    }
}

/// Runs `op` against `cluster`. Failures come back as error responses.
pub fn dispatch(cluster: &Cluster, op: &Operation) -> ToolResponse {
    debug!("Dispatching {}", op.name());

    let response = match op {
        Operation::Connect { retries } => connect(cluster, *retries),
        Operation::Disconnect => ToolResponse::ok(cluster.session().disconnect()),
        Operation::Status => ToolResponse::json(&cluster.session().status()),
        Operation::Exec {
            command,
            timeout_ms,
        } => {
            let timeout = timeout_ms.map(Duration::from_millis);
            ToolResponse::from_command(&cluster.executor().execute(command, timeout))
        }
        Operation::Submit { script, workdir } => cluster.submit(script, workdir.as_deref()),
        Operation::Queue { user, job_id } => cluster.queue(user.as_deref(), job_id.as_deref()),
        Operation::Accounting { job_id } => cluster.accounting(job_id),
        Operation::Cancel { job_id } => cluster.cancel(job_id),
        Operation::JobOutput { job_id, kind } => cluster.job_output(job_id, *kind),
        Operation::EstimatedStart { job_id } => cluster.estimated_start(job_id),
        Operation::Ls { path, options } => cluster.list_directory(path, options.as_deref()),
        Operation::Read { path, lines } => cluster.read_file(path, *lines),
        Operation::Write { path, content } => cluster.write_file(path, content),
        Operation::Upload {
            local_path,
            remote_path,
        } => cluster.upload(local_path, remote_path),
        Operation::Download {
            remote_path,
            local_path,
        } => cluster.download(remote_path, local_path),
        Operation::Exists { path } => cluster.exists(path),
        Operation::Stat { path } => cluster.file_info(path),
        Operation::MdStatus { system_path } => cluster.md_status(system_path),
        Operation::Mdinfo { path } => cluster.mdinfo(path),
        Operation::ValidateRestart {
            rst7_path,
            prmtop_path,
        } => cluster.validate_restart(rst7_path, prmtop_path),
        Operation::Rmsd {
            traj_path,
            prmtop_path,
            mask,
        } => cluster.rmsd(traj_path, prmtop_path, mask.as_deref()),
    };

    if response.is_error {
        warn!("{} failed", op.name());
    }
    response
}

fn connect(cluster: &Cluster, retries: u32) -> ToolResponse {
    let session = cluster.session();
    let result = if retries == 0 {
        session.connect()
    } else {
        let config = RetryConfig {
            max_retries: retries,
            ..RetryConfig::default()
        };
        retry_with_backoff(&config, || session.connect(), "connect")
    };

    match result {
        Ok(message) => ToolResponse::ok(message),
        Err(e) => e.into(),
    }
}

/// Read-only views exposed alongside the operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Config,
    Queue,
}

impl Resource {
    pub fn uri(self) -> &'static str {
        match self {
            Resource::Config => "hpg://config",
            Resource::Queue => "hpg://queue",
        }
    }

    pub fn from_uri(uri: &str) -> Option<Self> {
        [Resource::Config, Resource::Queue]
            .into_iter()
            .find(|r| r.uri() == uri)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigView<'a> {
    host: &'a str,
    user: &'a str,
    project_base: &'a str,
    connected: bool,
}

pub fn read_resource(cluster: &Cluster, resource: Resource) -> ToolResponse {
    match resource {
        Resource::Config => {
            let config = cluster.config();
            ToolResponse::json(&ConfigView {
                host: &config.host,
                user: &config.user,
                project_base: &config.project_base,
                connected: cluster.session().is_live(),
            })
        }
        Resource::Queue => cluster.queue(None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_matches_operation_names() {
        let ops = [
            Operation::Connect { retries: 0 },
            Operation::Disconnect,
            Operation::Status,
            Operation::Exec {
                command: "true".into(),
                timeout_ms: None,
            },
            Operation::Submit {
                script: "run.sh".into(),
                workdir: None,
            },
            Operation::Queue {
                user: None,
                job_id: None,
            },
            Operation::Accounting { job_id: "1".into() },
            Operation::Cancel { job_id: "1".into() },
            Operation::JobOutput {
                job_id: "1".into(),
                kind: OutputKind::Both,
            },
            Operation::EstimatedStart { job_id: "1".into() },
            Operation::Ls {
                path: "/home".into(),
                options: None,
            },
            Operation::Read {
                path: "/home/a".into(),
                lines: None,
            },
            Operation::Write {
                path: "/home/a".into(),
                content: String::new(),
            },
            Operation::Upload {
                local_path: "a".into(),
                remote_path: "/home/a".into(),
            },
            Operation::Download {
                remote_path: "/home/a".into(),
                local_path: "a".into(),
            },
            Operation::Exists {
                path: "/home/a".into(),
            },
            Operation::Stat {
                path: "/home/a".into(),
            },
            Operation::MdStatus {
                system_path: "/home/a".into(),
            },
            Operation::Mdinfo {
                path: "/home/a".into(),
            },
            Operation::ValidateRestart {
                rst7_path: "a".into(),
                prmtop_path: "b".into(),
            },
            Operation::Rmsd {
                traj_path: "a".into(),
                prmtop_path: "b".into(),
                mask: None,
            },
        ];

        let names: Vec<&str> = Operation::catalog().iter().map(|(n, _)| *n).collect();
        assert_eq!(names.len(), ops.len());
        for op in &ops {
            assert!(names.contains(&op.name()), "{} missing from catalog", op.name());
        }
    }

    #[test]
    fn test_operation_from_json() {
        let op: Operation = serde_json::from_str(
            r#"{"op": "job_output", "jobId": "42", "kind": "stderr"}"#,
        )
        .unwrap();
        assert_eq!(
            op,
            Operation::JobOutput {
                job_id: "42".into(),
                kind: OutputKind::Stderr,
            }
        );

        let op: Operation = serde_json::from_str(r#"{"op": "queue"}"#).unwrap();
        assert_eq!(
            op,
            Operation::Queue {
                user: None,
                job_id: None,
            }
        );
    }

    #[test]
    fn test_resource_uris() {
        assert_eq!(Resource::from_uri("hpg://config"), Some(Resource::Config));
        assert_eq!(Resource::from_uri("hpg://queue"), Some(Resource::Queue));
        assert_eq!(Resource::from_uri("hpg://nope"), None);
    }
}
