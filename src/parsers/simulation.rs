//! AMBER run status parser.
//!
//! Input is the report printed by the status probe script: a file status
//! section (`name: EXISTS (size)` / `name: MISSING`), the progress lines of
//! the newest mdinfo file, and a recent-errors section.

use serde::Serialize;

use super::markers::Marker;

/// Header of the section holding grepped error and warning lines.
pub const RECENT_ERRORS_HEADER: &str = "=== Recent Errors ===";

static NSTEP: Marker = Marker::new(r"NSTEP\s*=\s*(\d+)");
static TOTAL_STEPS: Marker = Marker::new(r"Total steps:\s*(\d+)");
static COMPLETED: Marker = Marker::new(r"Completed:\s*(\d+)\s*\(\s*([\d.]+)%\)");
static REMAINING: Marker = Marker::new(r"Estimated time remaining:\s*(.+)");
static ERROR_LINE: Marker = Marker::new(r"(?i)error|fail");
static WARNING_LINE: Marker = Marker::new(r"(?i)warning|vlimit");

/// Coarse lifecycle phase of a heat / eq1 / eq2 / production run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Heating,
    Eq1,
    Eq2,
    Production,
    #[default]
    Unknown,
}

/// Which expected files the status probe found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFlags {
    pub prmtop: bool,
    pub inpcrd: bool,
    pub heat_rst7: bool,
    pub eq1_rst7: bool,
    pub eq2_rst7: bool,
    pub prod_nc: bool,
    pub prod_rst7: bool,
}

impl FileFlags {
    fn from_report(text: &str) -> Self {
        let exists = |name: &str| text.contains(&format!("{}: EXISTS", name));
        Self {
            prmtop: exists("prmtop"),
            inpcrd: exists("inpcrd"),
            heat_rst7: exists("heat.cpu.rst7"),
            eq1_rst7: exists("eq1.cpu.rst7"),
            eq2_rst7: exists("eq2.cpu.rst7"),
            prod_nc: exists("prod.nc"),
            prod_rst7: exists("prod.rst7"),
        }
    }

    /// Latest stage the files show evidence of. A finished second
    /// equilibration counts as production.
    pub fn stage(&self) -> Stage {
        if self.prod_nc || self.eq2_rst7 {
            Stage::Production
        } else if self.eq1_rst7 {
            Stage::Eq2
        } else if self.heat_rst7 {
            Stage::Eq1
        } else {
            Stage::Heating
        }
    }
}

/// Status of a simulation run derived from one probe report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationStatus {
    pub stage: Stage,
    /// Percent complete, 0-100
    pub progress: f64,
    pub current_step: u64,
    pub total_steps: u64,
    #[serde(rename = "estimatedTimeRemaining")]
    pub estimated_remaining: String,
    pub files: FileFlags,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Default for SimulationStatus {
    fn default() -> Self {
        Self {
            stage: Stage::Unknown,
            progress: 0.0,
            current_step: 0,
            total_steps: 0,
            estimated_remaining: "unknown".to_string(),
            files: FileFlags::default(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Parses a status probe report. Absent markers leave their field at the
/// default; this never fails.
pub fn parse_simulation_status(text: &str) -> SimulationStatus {
    let files = FileFlags::from_report(text);
    let (errors, warnings) = classify_recent_errors(text);

    SimulationStatus {
        stage: files.stage(),
        progress: COMPLETED.parse_or_default(text, 2),
        current_step: NSTEP.parse_or_default(text, 1),
        total_steps: TOTAL_STEPS.parse_or_default(text, 1),
        estimated_remaining: REMAINING.text_or(text, 1, "unknown"),
        files,
        errors,
        warnings,
    }
}

/// Splits the recent-errors section into error lines and warning lines. A
/// line matching neither keyword set is dropped; one matching both is kept
/// in both.
fn classify_recent_errors(text: &str) -> (Vec<String>, Vec<String>) {
    let Some((_, section)) = text.split_once(RECENT_ERRORS_HEADER) else {
        return (Vec::new(), Vec::new());
    };

    let lines: Vec<&str> = section.lines().filter(|l| !l.trim().is_empty()).collect();
    let errors = lines
        .iter()
        .filter(|l| ERROR_LINE.is_match(l))
        .map(|l| l.to_string())
        .collect();
    let warnings = lines
        .iter()
        .filter(|l| WARNING_LINE.is_match(l))
        .map(|l| l.to_string())
        .collect();

    (errors, warnings)
}
