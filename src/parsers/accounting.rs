//! `sacct --parsable2 --noheader` parser.

use serde::Serialize;

/// Columns requested from sacct, in order.
pub const SACCT_FIELDS: [&str; 13] = [
    "JobID",
    "JobName",
    "Partition",
    "Account",
    "AllocCPUS",
    "State",
    "ExitCode",
    "Elapsed",
    "MaxRSS",
    "MaxVMSize",
    "Submit",
    "Start",
    "End",
];

/// One accounting record: the job itself or one of its steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountingEntry {
    #[serde(rename = "JobID")]
    pub job_id: String,
    pub job_name: String,
    pub partition: String,
    pub account: String,
    #[serde(rename = "AllocCPUS")]
    pub alloc_cpus: String,
    pub state: String,
    pub exit_code: String,
    pub elapsed: String,
    #[serde(rename = "MaxRSS")]
    pub max_rss: String,
    #[serde(rename = "MaxVMSize")]
    pub max_vm_size: String,
    pub submit: String,
    pub start: String,
    pub end: String,
}

/// Parses pipe-delimited accounting lines. Missing trailing fields are empty;
/// lines without a job id are dropped.
pub fn parse_accounting(text: &str) -> Vec<AccountingEntry> {
    text.trim().lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<AccountingEntry> {
    let parts: Vec<&str> = line.split('|').collect();
    let field = |i: usize| parts.get(i).copied().unwrap_or_default().to_string();

    let job_id = field(0);
    if job_id.is_empty() {
        return None;
    }

    Some(AccountingEntry {
        job_id,
        job_name: field(1),
        partition: field(2),
        account: field(3),
        alloc_cpus: field(4),
        state: field(5),
        exit_code: field(6),
        elapsed: field(7),
        max_rss: field(8),
        max_vm_size: field(9),
        submit: field(10),
        start: field(11),
        end: field(12),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
12345|prod_md|gpu|lab|8|COMPLETED|0:0|01:02:03|||2024-05-01T10:00:00|2024-05-01T10:05:00|2024-05-01T11:07:03
12345.batch|batch||lab|8|COMPLETED|0:0|01:02:03|2048K|4096K|2024-05-01T10:05:00|2024-05-01T10:05:00|2024-05-01T11:07:03";

    #[test]
    fn test_job_and_steps() {
        let entries = parse_accounting(SAMPLE);
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].job_id, "12345");
        assert_eq!(entries[0].state, "COMPLETED");
        assert_eq!(entries[0].max_rss, "");
        assert_eq!(entries[0].end, "2024-05-01T11:07:03");

        assert_eq!(entries[1].job_id, "12345.batch");
        assert_eq!(entries[1].partition, "");
        assert_eq!(entries[1].max_rss, "2048K");
    }

    #[test]
    fn test_truncated_line_defaults_trailing_fields() {
        let entries = parse_accounting("777|short|gpu");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].partition, "gpu");
        assert_eq!(entries[0].state, "");
        assert_eq!(entries[0].end, "");
    }

    #[test]
    fn test_lines_without_job_id_are_dropped() {
        assert!(parse_accounting("").is_empty());
        assert!(parse_accounting("|orphan|gpu").is_empty());
    }

    #[test]
    fn test_parse_is_idempotent() {
        assert_eq!(parse_accounting(SAMPLE), parse_accounting(SAMPLE));
    }

    #[test]
    fn test_serialized_keys_match_sacct_columns() {
        let json = serde_json::to_value(&parse_accounting(SAMPLE)[1]).unwrap();
        let obj = json.as_object().unwrap();
        for field in SACCT_FIELDS {
            assert!(obj.contains_key(field), "missing key {}", field);
        }
        assert_eq!(obj.len(), SACCT_FIELDS.len());
        assert_eq!(json["MaxVMSize"], "4096K");
    }
}
