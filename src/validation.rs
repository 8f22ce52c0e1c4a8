use log::info;
use thiserror::Error;

use crate::time_entry::TimeEntry;

/// 同期できないtime entryの理由。
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("Found entry without a description. All entries must contain a description.")]
    EmptyDescription,

    #[error("Entry [{description}] does not seem to be a Jira ticket and doesn't have a Toggl project assigned.")]
    MissingProjectAssignment { description: String },

    #[error("Entry [{description}] is still running (duration {duration}s). Stop the timer before syncing.")]
    NegativeDuration { description: String, duration: i64 },
}

/// descriptionがチケットキーのprefixで始まる場合はチケットへ直接記録するtime entryとなる。
pub fn is_jira_ticket(entry: &TimeEntry, ticket_key_prefix: &str) -> bool {
    entry.description.starts_with(ticket_key_prefix)
}

/// すべてのtime entryを検証し、見つかった問題をすべて返す。
///
/// 1件のtime entryに複数の問題がある場合はそのすべてを返す。
pub fn validate_entries(time_entries: &[TimeEntry], ticket_key_prefix: &str) -> Vec<ValidationIssue> {
    info!("Validating time entries...");
    time_entries
        .iter()
        .flat_map(|entry| validate_entry(entry, ticket_key_prefix))
        .collect()
}

fn validate_entry(entry: &TimeEntry, ticket_key_prefix: &str) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if entry.description.is_empty() {
        issues.push(ValidationIssue::EmptyDescription);
    }
    if !is_jira_ticket(entry, ticket_key_prefix) && entry.project_id.is_none() {
        issues.push(ValidationIssue::MissingProjectAssignment {
            description: entry.description.clone(),
        });
    }
    if entry.duration < 0 {
        issues.push(ValidationIssue::NegativeDuration {
            description: entry.description.clone(),
            duration: entry.duration,
        });
    }

    issues
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{is_jira_ticket, validate_entries, ValidationIssue};
    use crate::time_entry::TimeEntry;

    fn entry(project_id: Option<i64>, description: &str, duration: i64) -> TimeEntry {
        TimeEntry {
            id: 1,
            project_id,
            description: description.to_string(),
            duration,
        }
    }

    #[rstest]
    #[case::ticket("ENG-1002", true)]
    #[case::no_separator("ENGINEERING", true)]
    #[case::case_sensitive("eng-1002", false)]
    #[case::prefix_in_middle("Fix ENG-1002", false)]
    #[case::empty("", false)]
    fn test_is_jira_ticket(#[case] description: &str, #[case] expected: bool) {
        assert_eq!(is_jira_ticket(&entry(None, description, 0), "ENG"), expected);
    }

    #[rstest]
    #[case::ticket_without_project(entry(None, "ENG-1002", 240))]
    #[case::ticket_with_project(entry(Some(10), "ENG-1002", 240))]
    #[case::overhead_with_project(entry(Some(1), "Writing tests", 120))]
    #[case::zero_duration(entry(Some(1), "Writing tests", 0))]
    fn test_validate_ok(#[case] input: TimeEntry) {
        assert!(validate_entries(&[input], "ENG").is_empty());
    }

    #[rstest]
    #[case::empty_description(
        entry(Some(1), "", 120),
        vec![ValidationIssue::EmptyDescription],
    )]
    #[case::overhead_without_project(
        entry(None, "Coffee break", 300),
        vec![ValidationIssue::MissingProjectAssignment { description: "Coffee break".to_string() }],
    )]
    #[case::negative_duration(
        entry(Some(10), "New project (still working on it!)", -1),
        vec![ValidationIssue::NegativeDuration {
            description: "New project (still working on it!)".to_string(),
            duration: -1,
        }],
    )]
    #[case::all_rules(
        entry(None, "", -1630161422),
        vec![
            ValidationIssue::EmptyDescription,
            ValidationIssue::MissingProjectAssignment { description: "".to_string() },
            ValidationIssue::NegativeDuration { description: "".to_string(), duration: -1630161422 },
        ],
    )]
    fn test_validate_ng(#[case] input: TimeEntry, #[case] expected: Vec<ValidationIssue>) {
        assert_eq!(validate_entries(&[input], "ENG"), expected);
    }

    /// 問題のあるtime entryがあっても後続のtime entryの検証を続ける。
    #[test]
    fn test_validate_collects_every_entry() {
        let input = vec![
            entry(None, "Coffee break", 300),
            entry(Some(1), "Writing tests", 120),
            entry(Some(1), "", 60),
        ];

        let issues = validate_entries(&input, "ENG");

        assert_eq!(
            issues,
            vec![
                ValidationIssue::MissingProjectAssignment {
                    description: "Coffee break".to_string()
                },
                ValidationIssue::EmptyDescription,
            ]
        );
    }
}
