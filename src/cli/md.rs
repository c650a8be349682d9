//! AMBER simulation commands.

use anyhow::Result;
use clap::Args;
use hpgate::ops::md::DEFAULT_RMSD_MASK;
use hpgate::ops::Operation;

use super::run_operation;

#[derive(Args)]
#[command(about = "Show stage and progress of a simulation system")]
pub struct MdStatusCommand {
    /// System directory on the cluster
    system_path: String,
}

impl MdStatusCommand {
    pub fn execute(self) -> Result<()> {
        run_operation(Operation::MdStatus {
            system_path: self.system_path,
        })
    }
}

#[derive(Args)]
#[command(about = "Parse an mdinfo file")]
pub struct MdinfoCommand {
    path: String,
}

impl MdinfoCommand {
    pub fn execute(self) -> Result<()> {
        run_operation(Operation::Mdinfo { path: self.path })
    }
}

#[derive(Args)]
#[command(about = "Check a restart file with cpptraj")]
pub struct ValidateRst7Command {
    rst7_path: String,
    prmtop_path: String,
}

impl ValidateRst7Command {
    pub fn execute(self) -> Result<()> {
        run_operation(Operation::ValidateRestart {
            rst7_path: self.rst7_path,
            prmtop_path: self.prmtop_path,
        })
    }
}

#[derive(Args)]
#[command(about = "Quick RMSD statistics for a trajectory")]
pub struct RmsdCommand {
    traj_path: String,
    prmtop_path: String,

    /// Atom mask
    #[arg(short, long, default_value = DEFAULT_RMSD_MASK)]
    mask: String,
}

impl RmsdCommand {
    pub fn execute(self) -> Result<()> {
        run_operation(Operation::Rmsd {
            traj_path: self.traj_path,
            prmtop_path: self.prmtop_path,
            mask: Some(self.mask),
        })
    }
}
