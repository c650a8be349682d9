//! AMBER simulation monitoring.

use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;
use std::time::Duration;

use super::policy::{heredoc_safe, shell_quote};
use super::{Cluster, ToolResponse};
use crate::error::Result;
use crate::parsers::{
    parse_mdinfo, parse_simulation_status, parse_validation, SimulationStatus, ValidationReport,
};

/// Mask used by `rmsd` when none is given.
pub const DEFAULT_RMSD_MASK: &str = ":1-357@CA";

const VALIDATE_TIMEOUT: Duration = Duration::from_secs(30);
const RMSD_TIMEOUT: Duration = Duration::from_secs(120);

/// Prints the file status, latest mdinfo and recent-errors sections. Runs
/// inside the system directory.
const STATUS_PROBE: &str = r#"echo "=== File Status ==="
for f in *.prmtop 5vg3_solv.inpcrd heat.cpu.rst7 eq1.cpu.rst7 eq2.cpu.rst7 prod.nc prod.rst7; do
  if [ -f "$f" ]; then
    echo "$f: EXISTS ($(ls -lh "$f" | awk '{print $5}'))"
  else
    echo "$f: MISSING"
  fi
done

echo ""
echo "=== Latest mdinfo ==="
for f in prod.mdinfo eq2.cpu.mdinfo eq1.cpu.mdinfo heat.cpu.mdinfo; do
  if [ -f "$f" ]; then
    echo "--- $f ---"
    grep -E "NSTEP|Total steps|Completed|Remaining|ns/day" "$f"
    break
  fi
done

echo ""
echo "=== Recent Errors ==="
for f in *.out *.err; do
  if [ -f "$f" ]; then
    grep -i "error\|fail\|warning\|vlimit" "$f" 2>/dev/null | tail -5
  fi
done | head -20"#;

/// Summarizes the RMSD data file cpptraj wrote.
const RMSD_STATS: &str = r#"echo "=== RMSD Statistics ==="
awk 'NR>1 {sum+=$2; sumsq+=$2*$2; n++; if($2>max)max=$2; if(min==""||$2<min)min=$2}
     END {mean=sum/n; std=sqrt(sumsq/n-mean*mean);
          printf "Frames: %d\nMean: %.3f A\nStd: %.3f A\nMin: %.3f A\nMax: %.3f A\n",
                 n, mean, std, min, max}' /tmp/rmsd_quick_$$.dat
rm -f /tmp/rmsd_quick_$$.dat"#;

/// Simulation status plus where and when it was observed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MdStatusReport {
    pub system: String,
    #[serde(flatten)]
    pub status: SimulationStatus,
    pub last_update: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestartValidation {
    pub file: String,
    #[serde(flatten)]
    pub report: ValidationReport,
    pub raw_output: String,
}

/// Last path component of a system directory.
pub fn system_name(system_path: &str) -> String {
    system_path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or(system_path)
        .to_string()
}

fn cpptraj_script(prmtop: &str, body: &str) -> String {
    format!(
        "module load amber/25 2>/dev/null\ncpptraj -p \"{}\" << EOF\n{}\nEOF",
        prmtop, body
    )
}

impl Cluster {
    /// Stage, progress and problems of the run in `system_path`.
    pub fn md_status(&self, system_path: &str) -> ToolResponse {
        let path = match self.allowed_path(system_path) {
            Ok(p) => p,
            Err(refusal) => return refusal,
        };

        let command = format!("cd {} 2>/dev/null || exit 1\n{}", shell_quote(&path), STATUS_PROBE);
        let result = self.run(&command);
        if !result.is_success() {
            return ToolResponse::from_command(&result);
        }

        let status = parse_simulation_status(&result.stdout);
        info!("{} is in stage {:?}", path, status.stage);
        ToolResponse::json(&MdStatusReport {
            system: system_name(&path),
            status,
            last_update: Utc::now(),
        })
    }

    pub fn mdinfo(&self, mdinfo_path: &str) -> ToolResponse {
        let path = match self.allowed_path(mdinfo_path) {
            Ok(p) => p,
            Err(refusal) => return refusal,
        };

        let result = self.run(&format!("cat {}", shell_quote(&path)));
        if !result.is_success() {
            return ToolResponse::from_command(&result);
        }
        ToolResponse::json(&parse_mdinfo(&result.stdout))
    }

    /// Loads a restart file with cpptraj and reports whether it is readable.
    pub fn validate_restart(&self, rst7_path: &str, prmtop_path: &str) -> ToolResponse {
        let (rst7, prmtop) = match self.cpptraj_inputs(rst7_path, prmtop_path) {
            Ok(paths) => paths,
            Err(refusal) => return refusal,
        };

        let command = cpptraj_script(&prmtop, &format!("trajin \"{}\"\ntrajinfo", rst7));
        let result = self.executor().execute(&command, Some(VALIDATE_TIMEOUT));
        if !result.is_success() {
            return ToolResponse::from_command(&result);
        }

        ToolResponse::json(&RestartValidation {
            file: rst7,
            report: parse_validation(&result.stdout),
            raw_output: result.stdout,
        })
    }

    /// RMSD of a trajectory against its first frame, with summary statistics.
    pub fn rmsd(&self, traj_path: &str, prmtop_path: &str, mask: Option<&str>) -> ToolResponse {
        let (traj, prmtop) = match self.cpptraj_inputs(traj_path, prmtop_path) {
            Ok(paths) => paths,
            Err(refusal) => return refusal,
        };
        let mask = match heredoc_safe("mask", mask.unwrap_or(DEFAULT_RMSD_MASK)) {
            Ok(m) => m,
            Err(e) => return e.into(),
        };

        let body = format!(
            "trajin \"{}\"\nautoimage\nrms first {} out /tmp/rmsd_quick_$$.dat\nrun\nquit",
            traj, mask
        );
        let command = format!("{}\n{}", cpptraj_script(&prmtop, &body), RMSD_STATS);
        ToolResponse::from_command(&self.executor().execute(&command, Some(RMSD_TIMEOUT)))
    }

    fn cpptraj_inputs(
        &self,
        input: &str,
        prmtop: &str,
    ) -> std::result::Result<(String, String), ToolResponse> {
        let input = self.allowed_path(input)?;
        let prmtop = self.allowed_path(prmtop)?;
        let check = || -> Result<()> {
            heredoc_safe("input path", &input)?;
            heredoc_safe("topology path", &prmtop)?;
            Ok(())
        };
        check().map_err(ToolResponse::from)?;
        Ok((input, prmtop))
    }
}
