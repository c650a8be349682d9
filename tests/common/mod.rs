//! Fake cluster for integration tests.
//!
//! `ssh` is a shell script that touches the control socket and runs the
//! remote command locally with `sh -c`; `scp` copies between local paths
//! after stripping the `user@host:` prefix. SLURM and cpptraj are small
//! scripts on the fake `ssh`'s PATH.

#![allow(dead_code)]

use hpgate::ops::Cluster;
use hpgate::remote::{CommandExecutor, SessionIdentity, SessionManager};
use hpgate::Config;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const FAKE_SSH: &str = r#"#!/bin/sh
PATH="@BIN@:$PATH"
export PATH
control=""
exit_mode=0
while [ $# -gt 0 ]; do
  case "$1" in
    -O) shift; if [ "$1" = "exit" ]; then exit_mode=1; fi ;;
    -o) shift; case "$1" in ControlPath=*) control="${1#ControlPath=}" ;; esac ;;
    -p|-i) shift ;;
    --) shift; break ;;
  esac
  shift
done
if [ "$exit_mode" = 1 ]; then
  if [ -e "$control" ]; then
    rm -f "$control"
    echo "Exit request sent." >&2
    exit 0
  fi
  echo "Control socket connect($control): No such file or directory" >&2
  exit 255
fi
touch "$control"
exec sh -c "$1"
"#;

const FAKE_SCP: &str = r#"#!/bin/sh
src=""
dst=""
for arg in "$@"; do
  src="$dst"
  dst="$arg"
done
strip() {
  case "$1" in
    *@*:*) echo "${1#*:}" ;;
    *) echo "$1" ;;
  esac
}
exec cp "$(strip "$src")" "$(strip "$dst")"
"#;

const FAKE_SSH_DENIED: &str = r#"#!/bin/sh
echo "alice@hpg.test: Permission denied (publickey,keyboard-interactive)." >&2
exit 255
"#;

const FAKE_SSH_DEAD_MASTER: &str = r#"#!/bin/sh
echo "Control socket connect: Connection refused" >&2
echo "ssh: connect to host hpg.test port 2222: Connection timed out" >&2
exit 255
"#;

const FAKE_SBATCH: &str = r#"#!/bin/sh
if [ ! -f "$1" ]; then
  echo "sbatch: error: Unable to open file $1" >&2
  exit 1
fi
echo "Submitted batch job 4242"
"#;

const FAKE_SQUEUE: &str = r#"#!/bin/sh
echo "             JOBID    PARTITION                           NAME       USER    STATE       TIME TIME_LIMI  NODES NODELIST(REASON)"
echo "              4242  hpg-default                        prod_md      alice  RUNNING    1:02:03 4-00:00:00      1 c0709a-s3"
echo "              4243  hpg-default                          eq_md      alice  PENDING       0:00 4-00:00:00      1 (Priority)"
"#;

const FAKE_SACCT: &str = r#"#!/bin/sh
echo "4242|prod_md|hpg-default|lab|8|RUNNING|0:0|01:02:03|||2024-05-01T10:00:00|2024-05-01T10:05:00|Unknown"
echo "4242.batch|batch||lab|8|RUNNING|0:0|01:02:03|2048K|4096K|2024-05-01T10:05:00|2024-05-01T10:05:00|Unknown"
"#;

const FAKE_SCANCEL: &str = "#!/bin/sh\nexit 0\n";

const FAKE_SCONTROL: &str = r#"#!/bin/sh
case "$3" in
  4242)
    echo "JobId=4242 JobName=prod_md"
    echo "   StdErr=@PROJECT@/slurm-4242.err"
    echo "   StdIn=/dev/null"
    echo "   StdOut=@PROJECT@/slurm-4242.out"
    ;;
  *)
    echo "slurm_load_jobs error: Invalid job id specified" >&2
    exit 1
    ;;
esac
"#;

const FAKE_CPPTRAJ: &str = r#"#!/bin/sh
cat > /dev/null
echo "CPPTRAJ: Trajectory Analysis."
echo "  'prod.rst7' is an AMBER restart file, Parm system.prmtop: 21345 atoms"
echo "  Box: Orthogonal (61.2 61.2 61.2)"
"#;

pub struct FakeCluster {
    pub dir: TempDir,
    pub config: Config,
    pub session: Arc<SessionManager>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::with_ssh(FAKE_SSH)
    }

    /// A cluster whose ssh always fails authentication.
    pub fn denied() -> Self {
        Self::with_ssh(FAKE_SSH_DENIED)
    }

    /// A cluster whose master is gone while its socket file stays behind.
    pub fn dead_master() -> Self {
        let fake = Self::with_ssh(FAKE_SSH_DEAD_MASTER);
        let socket = fake.socket();
        if let Some(parent) = socket.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&socket, "").unwrap();
        fake
    }

    fn with_ssh(ssh_script: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let bin = dir.path().join("bin");
        let project = dir.path().join("project");
        fs::create_dir_all(&bin).unwrap();
        fs::create_dir_all(&project).unwrap();
        fs::create_dir_all(dir.path().join("local")).unwrap();

        let fill = |script: &str| {
            script
                .replace("@BIN@", &bin.display().to_string())
                .replace("@PROJECT@", &project.display().to_string())
        };
        write_script(&bin.join("ssh"), &fill(ssh_script));
        write_script(&bin.join("scp"), FAKE_SCP);
        write_script(&bin.join("sbatch"), FAKE_SBATCH);
        write_script(&bin.join("squeue"), FAKE_SQUEUE);
        write_script(&bin.join("sacct"), FAKE_SACCT);
        write_script(&bin.join("scancel"), FAKE_SCANCEL);
        write_script(&bin.join("scontrol"), &fill(FAKE_SCONTROL));
        write_script(&bin.join("cpptraj"), FAKE_CPPTRAJ);

        let control_path = dir.path().join("sockets").join("master");
        let config = Config {
            host: "hpg.test".to_string(),
            user: "alice".to_string(),
            port: 2222,
            control_path: control_path.display().to_string(),
            project_base: project.display().to_string(),
            command_timeout_ms: 10_000,
            ..Config::default()
        };

        let identity = SessionIdentity::from_config(&config)
            .with_ssh_program(bin.join("ssh"))
            .with_scp_program(bin.join("scp"));
        let session =
            Arc::new(SessionManager::new(identity, Duration::from_secs(10)).unwrap());

        Self {
            dir,
            config,
            session,
        }
    }

    pub fn cluster(&self) -> Cluster {
        Cluster::with_session(self.config.clone(), Arc::clone(&self.session))
    }

    pub fn executor(&self) -> CommandExecutor {
        CommandExecutor::from_config(Arc::clone(&self.session), &self.config)
    }

    pub fn socket(&self) -> PathBuf {
        self.session.identity().control_socket()
    }

    /// Directory standing in for the project storage root.
    pub fn project(&self) -> PathBuf {
        self.dir.path().join("project")
    }

    /// Directory standing in for the user's machine.
    pub fn local(&self) -> PathBuf {
        self.dir.path().join("local")
    }

    pub fn project_path(&self, name: &str) -> String {
        self.project().join(name).display().to_string()
    }
}

fn write_script(path: &Path, contents: &str) {
    fs::write(path, contents).unwrap();
    let mut perms = fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).unwrap();
}
