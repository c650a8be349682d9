//! hpgate drives a shared HPC cluster over one multiplexed SSH session.
//!
//! The [`remote`] layer owns the session, runs commands under a timeout and
//! copies files with scp. [`parsers`] turns scheduler and simulation tool
//! output into records without ever failing. [`ops`] builds the user-facing
//! operations on top of both.

pub mod config;
pub mod error;
pub mod ops;
pub mod parsers;
pub mod remote;

pub use config::Config;
pub use error::{Error, HpgateError, Result};
pub use ops::{dispatch, Cluster, Operation, ToolResponse};
