//! Total parsers for scheduler and simulation tool output.
//!
//! None of these return errors: absent or malformed input yields empty
//! collections or default fields.

pub mod accounting;
pub mod markers;
pub mod mdinfo;
pub mod queue;
pub mod simulation;
pub mod slurm;
pub mod validation;

pub use accounting::{parse_accounting, AccountingEntry, SACCT_FIELDS};
pub use mdinfo::{parse_mdinfo, MdInfo};
pub use queue::{parse_queue, QueueEntry};
pub use simulation::{parse_simulation_status, FileFlags, SimulationStatus, Stage};
pub use slurm::{parse_job_output_paths, parse_submitted_job_id, JobOutputPaths};
pub use validation::{parse_validation, ValidationReport};
