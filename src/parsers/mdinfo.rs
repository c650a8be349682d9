//! AMBER `mdinfo` file parser.

use serde::Serialize;

use super::markers::Marker;

static NSTEP: Marker = Marker::new(r"NSTEP\s*=\s*(\d+)");
static TOTAL_STEPS: Marker = Marker::new(r"Total steps:\s*(\d+)");
static COMPLETED: Marker = Marker::new(r"Completed:\s*(\d+)\s*\(\s*([\d.]+)%\)");
static REMAINING: Marker = Marker::new(r"Estimated time remaining:\s*(.+)");
static TEMPERATURE: Marker = Marker::new(r"TEMP\(K\)\s*=\s*([\d.]+)");
static PRESSURE: Marker = Marker::new(r"PRESS\s*=\s*([-\d.]+)");
static DENSITY: Marker = Marker::new(r"Density\s*=\s*([\d.]+)");
static TOTAL_ENERGY: Marker = Marker::new(r"Etot\s*=\s*([-\d.]+)");
static THROUGHPUT: Marker = Marker::new(r"ns/day\s*=\s*([\d.]+)");

/// Instantaneous state of a running MD engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MdInfo {
    pub current_step: u64,
    pub total_steps: u64,
    pub progress: f64,
    /// Kelvin
    pub temperature: f64,
    /// Bar
    pub pressure: f64,
    /// g/cm^3
    pub density: f64,
    /// kcal/mol
    pub total_energy: f64,
    pub ns_per_day: f64,
    #[serde(rename = "estimatedTimeRemaining")]
    pub estimated_remaining: String,
}

/// Parses an mdinfo file. Each value defaults to zero on its own when the
/// engine has not written it yet.
pub fn parse_mdinfo(text: &str) -> MdInfo {
    MdInfo {
        current_step: NSTEP.parse_or_default(text, 1),
        total_steps: TOTAL_STEPS.parse_or_default(text, 1),
        progress: COMPLETED.parse_or_default(text, 2),
        temperature: TEMPERATURE.parse_or_default(text, 1),
        pressure: PRESSURE.parse_or_default(text, 1),
        density: DENSITY.parse_or_default(text, 1),
        total_energy: TOTAL_ENERGY.parse_or_default(text, 1),
        ns_per_day: THROUGHPUT.parse_or_default(text, 1),
        estimated_remaining: REMAINING.text_or(text, 1, "unknown"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MDINFO: &str = "\
 NSTEP =    50000   TIME(PS) =     100.000  TEMP(K) =   299.87  PRESS =   -12.4
 Etot   =   -180123.4567  EKtot   =     45012.3456  EPtot      =   -225135.8023
 Density    =         1.0213

|  Average timings for last    5000 steps:
|     Elapsed(s) =      42.17 Per Step(ms) =       8.43
|         ns/day =      20.49   seconds/ns =    4216.53
|
|     Total steps:   500000 | Completed:    50000 ( 10.0%) | Remaining:   450000
|
|     Estimated time remaining:   5.3 hours
";

    #[test]
    fn test_full_mdinfo() {
        let info = parse_mdinfo(MDINFO);
        assert_eq!(info.current_step, 50000);
        assert_eq!(info.total_steps, 500000);
        assert_eq!(info.progress, 10.0);
        assert_eq!(info.temperature, 299.87);
        assert_eq!(info.pressure, -12.4);
        assert_eq!(info.density, 1.0213);
        assert_eq!(info.total_energy, -180123.4567);
        assert_eq!(info.ns_per_day, 20.49);
        assert_eq!(info.estimated_remaining, "5.3 hours");
    }

    #[test]
    fn test_empty_mdinfo() {
        let info = parse_mdinfo("");
        assert_eq!(info.current_step, 0);
        assert_eq!(info.progress, 0.0);
        assert_eq!(info.temperature, 0.0);
        assert_eq!(info.ns_per_day, 0.0);

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["pressure"], 0.0);
        assert_eq!(info.estimated_remaining, "unknown");
    }

    #[test]
    fn test_partial_mdinfo_keeps_present_values() {
        let info = parse_mdinfo(" NSTEP = 10  TEMP(K) = 100.5");
        assert_eq!(info.current_step, 10);
        assert_eq!(info.temperature, 100.5);
        assert_eq!(info.pressure, 0.0);
    }
}
