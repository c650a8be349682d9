//! SCP-based file transfer over the session's control master.
//!
//! Transfers are separate `scp` processes; they share the session's control
//! socket so no second authentication happens. Nothing here retries.

use log::{debug, info, warn};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::remote::executor::{run_program, ExitClass};
use crate::remote::session::SessionManager;

const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_secs(600);

/// Which way a file moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Upload,
    Download,
}

/// One file copy between the local machine and the cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    pub direction: Direction,
    pub local_path: String,
    pub remote_path: String,
}

/// Result of a transfer: a flag plus the captured diagnostic stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferOutcome {
    pub success: bool,
    pub diagnostic: String,
}

/// Handles scp transfers for one session.
#[derive(Debug, Clone)]
pub struct ScpTransfer {
    session: Arc<SessionManager>,
    timeout: Duration,
}

impl ScpTransfer {
    /// Create a new transfer handler for the given session.
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self {
            session,
            timeout: DEFAULT_TRANSFER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Copy a local file to the cluster.
    pub fn upload(&self, local_path: &Path, remote_path: &str) -> TransferOutcome {
        self.run(&TransferRequest {
            direction: Direction::Upload,
            local_path: local_path.to_string_lossy().into_owned(),
            remote_path: remote_path.to_string(),
        })
    }

    /// Copy a file from the cluster to the local machine.
    pub fn download(&self, remote_path: &str, local_path: &Path) -> TransferOutcome {
        self.run(&TransferRequest {
            direction: Direction::Download,
            local_path: local_path.to_string_lossy().into_owned(),
            remote_path: remote_path.to_string(),
        })
    }

    /// Runs one transfer request.
    pub fn run(&self, request: &TransferRequest) -> TransferOutcome {
        let identity = self.session.identity();
        let remote = identity.remote_spec(&request.remote_path);

        let (source, destination) = match request.direction {
            Direction::Upload => (request.local_path.as_str(), remote.as_str()),
            Direction::Download => (remote.as_str(), request.local_path.as_str()),
        };
        info!("scp {} -> {}", source, destination);

        let result = run_program(
            &identity.scp_program,
            &identity.scp_args(source, destination),
            self.timeout,
        );

        if result.is_success() {
            debug!("Transfer finished: {}", destination);
        } else {
            warn!("Transfer failed ({}): {}", result.exit, result.stderr);
        }

        let diagnostic = match result.exit {
            ExitClass::Timeout => result.message(),
            _ => result.stderr,
        };

        TransferOutcome {
            success: result.exit == ExitClass::Success,
            diagnostic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::SessionIdentity;
    use tempfile::TempDir;

    #[test]
    fn test_missing_scp_reports_diagnostic() {
        let dir = TempDir::new().unwrap();
        let identity = SessionIdentity::new("hpg.example.edu", "alice")
            .with_control_path(dir.path().join("ctl").to_string_lossy())
            .with_scp_program("/nonexistent/scp");
        let session = Arc::new(SessionManager::new(identity, Duration::from_secs(1)).unwrap());

        let outcome = ScpTransfer::new(session).upload(Path::new("a.txt"), "/blue/a.txt");
        assert!(!outcome.success);
        assert!(outcome.diagnostic.contains("failed to start"));
    }

    #[test]
    fn test_direction_serialization() {
        assert_eq!(serde_json::to_string(&Direction::Upload).unwrap(), "\"upload\"");
        assert_eq!(
            serde_json::to_string(&Direction::Download).unwrap(),
            "\"download\""
        );
    }
}
