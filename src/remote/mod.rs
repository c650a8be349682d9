//! Remote execution infrastructure for the cluster.
//!
//! This module provides the multiplexed SSH session, command execution under
//! a timeout, scp transfers, and connection diagnostics. Everything shells
//! out to the system OpenSSH client so existing `~/.ssh/config` settings and
//! the control master it maintains are reused.

pub mod diagnostics;
pub mod executor;
pub mod process;
pub mod retry;
pub mod session;
pub mod transfer;

pub use diagnostics::diagnose_connect_failure;
pub use executor::{CommandExecutor, CommandResult, ExitClass, NO_OUTPUT};
pub use retry::{retry_with_backoff, RetryConfig};
pub use session::{LastInvocation, SessionIdentity, SessionManager, SessionStatus};
pub use transfer::{Direction, ScpTransfer, TransferOutcome, TransferRequest};
