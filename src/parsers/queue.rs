//! `squeue` listing parser.
//!
//! Expects the whitespace table produced by
//! `squeue --format="%.18i %.12P %.30j %.10u %.8T %.10M %.10l %.6D %R"`,
//! header line first.

use serde::Serialize;

/// Number of fixed columns before the free-text node list.
const FIXED_COLUMNS: usize = 8;

/// One row of the job queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub job_id: String,
    pub partition: String,
    pub name: String,
    pub user: String,
    pub state: String,
    pub time_used: String,
    pub time_limit: String,
    pub node_count: String,
    /// Node list, or the pending reason in parentheses
    pub node_list: String,
}

/// Parses a queue listing. The first line is discarded as the header; rows
/// without a job id are dropped.
pub fn parse_queue(text: &str) -> Vec<QueueEntry> {
    text.trim()
        .lines()
        .skip(1)
        .filter_map(parse_row)
        .collect()
}

fn parse_row(line: &str) -> Option<QueueEntry> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let field = |i: usize| tokens.get(i).copied().unwrap_or_default().to_string();

    let job_id = field(0);
    if job_id.is_empty() {
        return None;
    }

    Some(QueueEntry {
        job_id,
        partition: field(1),
        name: field(2),
        user: field(3),
        state: field(4),
        time_used: field(5),
        time_limit: field(6),
        node_count: field(7),
        node_list: tokens.get(FIXED_COLUMNS..).unwrap_or_default().join(" "),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "JOBID PART NAME USER ST TIME LIMIT NODES NODELIST";

    #[test]
    fn test_single_running_job() {
        let text = format!("{}\n123 normal job1 alice R 1:00 2:00 1 node01", HEADER);
        let jobs = parse_queue(&text);

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job_id, "123");
        assert_eq!(jobs[0].partition, "normal");
        assert_eq!(jobs[0].name, "job1");
        assert_eq!(jobs[0].user, "alice");
        assert_eq!(jobs[0].state, "R");
        assert_eq!(jobs[0].time_used, "1:00");
        assert_eq!(jobs[0].time_limit, "2:00");
        assert_eq!(jobs[0].node_count, "1");
        assert_eq!(jobs[0].node_list, "node01");
    }

    #[test]
    fn test_header_only_is_empty() {
        assert!(parse_queue(HEADER).is_empty());
        assert!(parse_queue("").is_empty());
        assert!(parse_queue("(no output)").is_empty());
    }

    #[test]
    fn test_pending_reason_is_rejoined() {
        let text = format!(
            "{}\n  4567   hpg-default  prod_md  alice  PENDING  0:00  4-00:00:00  1  (Priority, QOS limit)",
            HEADER
        );
        let jobs = parse_queue(&text);
        assert_eq!(jobs[0].state, "PENDING");
        assert_eq!(jobs[0].node_list, "(Priority, QOS limit)");
    }

    #[test]
    fn test_short_rows_default_missing_fields() {
        let text = format!("{}\n99 gpu\n\n   \n100", HEADER);
        let jobs = parse_queue(&text);

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].partition, "gpu");
        assert_eq!(jobs[0].state, "");
        assert_eq!(jobs[0].node_list, "");
        assert_eq!(jobs[1].job_id, "100");
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let text = format!(
            "{}\n1 a b c R 0:01 1:00 2 c[01-02]\n2 a b c PD 0:00 1:00 1 (Resources)",
            HEADER
        );
        assert_eq!(parse_queue(&text), parse_queue(&text));
    }

    #[test]
    fn test_serialized_field_names() {
        let text = format!("{}\n123 normal job1 alice R 1:00 2:00 1 node01", HEADER);
        let json = serde_json::to_value(&parse_queue(&text)[0]).unwrap();
        assert_eq!(json["jobId"], "123");
        assert_eq!(json["nodeList"], "node01");
        assert_eq!(json["timeLimit"], "2:00");
    }
}
