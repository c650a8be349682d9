//! cpptraj trajectory-info output parser.

use serde::Serialize;

use super::markers::Marker;

static ATOM_COUNT: Marker = Marker::new(r"(?i)(\d+)\s+atoms");
static BOX_INFO: Marker = Marker::new(r"Box:\s*(.+)");
static WARNING: Marker = Marker::new(r"Warning:.+");

/// Verdict on a restart file as reported by cpptraj.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub valid: bool,
    pub atom_count: u64,
    pub box_info: String,
    pub warnings: Vec<String>,
}

/// Parses cpptraj output. The file is valid unless the output mentions an
/// error anywhere. A missing atom count reads as 0 and a missing box as "".
pub fn parse_validation(text: &str) -> ValidationReport {
    ValidationReport {
        valid: !text.contains("Error") && !text.contains("error"),
        atom_count: ATOM_COUNT.parse_or_default(text, 1),
        box_info: BOX_INFO.text_or(text, 1, ""),
        warnings: WARNING
            .find_all(text)
            .into_iter()
            .map(|s| s.trim_end().to_string())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_restart() {
        let text = "\
CPPTRAJ: Trajectory Analysis.
  [trajin prod.rst7]
  'prod.rst7' is an AMBER restart file, Parm system.prmtop: 21345 atoms
  Box: Orthogonal (61.2 61.2 61.2)
Warning: Coordinates may be truncated.
";
        let report = parse_validation(text);
        assert!(report.valid);
        assert_eq!(report.atom_count, 21345);
        assert_eq!(report.box_info, "Orthogonal (61.2 61.2 61.2)");
        assert_eq!(report.warnings, vec!["Warning: Coordinates may be truncated."]);
    }

    #[test]
    fn test_error_makes_invalid() {
        let report = parse_validation("Error: Could not open prod.rst7");
        assert!(!report.valid);
        assert_eq!(report.atom_count, 0);
        assert_eq!(report.box_info, "");
        assert!(report.warnings.is_empty());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["atomCount"], 0);
        assert_eq!(json["boxInfo"], "");

        assert!(!parse_validation("read error at frame 3").valid);
    }

    #[test]
    fn test_atom_count_case_insensitive() {
        assert_eq!(parse_validation("512 ATOMS").atom_count, 512);
    }

    #[test]
    fn test_empty_output_is_valid() {
        let report = parse_validation("");
        assert!(report.valid);
        assert_eq!(report.atom_count, 0);
        assert_eq!(report.box_info, "");
    }

    #[test]
    fn test_parse_is_idempotent() {
        let text = "Parm system.prmtop: 42 atoms
  Box: None
Warning: odd
Error: bad frame
";
        assert_eq!(parse_validation(text), parse_validation(text));
    }
}
