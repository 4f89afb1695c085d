use indexmap::IndexMap;

use super::percentage;
use crate::insights::{ChangeFailureReport, ChangeFailureStatistics};
use crate::providers::types::{Run, RunResult, WorkItem};

/// Relate failure-tagged bugs to the successful deployments of the same window.
///
/// `bugs` are expected to be pre-filtered by tag and creation date. Only
/// `deployments` that succeeded count towards the denominator.
pub fn calculate_change_failure(
    bugs: Vec<WorkItem>,
    deployments: &[Run],
    window_days: u32,
) -> ChangeFailureReport {
    let total_deployments = deployments
        .iter()
        .filter(|r| r.result == RunResult::Succeeded)
        .count();

    let statistics = ChangeFailureStatistics {
        total_bugs: bugs.len(),
        total_deployments,
        change_failure_rate: percentage(bugs.len(), total_deployments),
        period: format!("Last {window_days} days"),
    };

    ChangeFailureReport {
        statistics,
        bugs_by_severity: group_by_severity(&bugs),
        bugs,
    }
}

pub fn group_by_severity(bugs: &[WorkItem]) -> IndexMap<String, Vec<WorkItem>> {
    bugs.iter().fold(IndexMap::new(), |mut groups, bug| {
        groups
            .entry(bug.severity.clone())
            .or_insert_with(Vec::new)
            .push(bug.clone());
        groups
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::providers::types::RunState;

    fn bug(id: u64, severity: &str) -> WorkItem {
        WorkItem {
            id,
            title: format!("Bug {id}"),
            state: "Active".to_string(),
            created_date: "2024-03-02T08:00:00Z".parse().unwrap(),
            severity: severity.to_string(),
            tags: BTreeSet::from(["env-failure".to_string()]),
            assignee: "Unassigned".to_string(),
            url: format!("https://tracker.test/_workitems/edit/{id}"),
        }
    }

    fn deployments(succeeded: usize, failed: usize) -> Vec<Run> {
        let outcomes = std::iter::repeat(RunResult::Succeeded)
            .take(succeeded)
            .chain(std::iter::repeat(RunResult::Failed).take(failed));

        outcomes
            .enumerate()
            .map(|(i, result)| Run {
                id: i as u64,
                name: format!("deploy-{i}"),
                created_date: "2024-03-01T12:00:00Z".parse().unwrap(),
                finished_date: None,
                state: RunState::Completed,
                result,
            })
            .collect()
    }

    #[test]
    fn test_two_bugs_over_ten_deployments() {
        let report = calculate_change_failure(
            vec![bug(1, "2 - High"), bug(2, "3 - Medium")],
            &deployments(10, 0),
            30,
        );

        assert_eq!(report.statistics.change_failure_rate, 20.0);
        assert_eq!(report.statistics.total_bugs, 2);
        assert_eq!(report.statistics.total_deployments, 10);
        assert_eq!(report.statistics.period, "Last 30 days");
    }

    #[test]
    fn test_zero_deployments_reports_zero_rate() {
        let report = calculate_change_failure(vec![bug(1, "1 - Critical")], &[], 7);

        assert_eq!(report.statistics.change_failure_rate, 0.0);
        assert_eq!(report.statistics.total_deployments, 0);
    }

    #[test]
    fn test_failed_deployments_are_not_counted() {
        let report = calculate_change_failure(vec![bug(1, "2 - High")], &deployments(3, 5), 7);

        assert_eq!(report.statistics.total_deployments, 3);
        assert_eq!(report.statistics.change_failure_rate, 33.33);
    }

    #[test]
    fn test_groups_bugs_by_free_form_severity() {
        let report = calculate_change_failure(
            vec![
                bug(1, "2 - High"),
                bug(2, "1 - Critical"),
                bug(3, "2 - High"),
                bug(4, "Sev-X"),
            ],
            &deployments(4, 0),
            7,
        );

        let severities: Vec<_> = report.bugs_by_severity.keys().cloned().collect();
        assert_eq!(severities, vec!["2 - High", "1 - Critical", "Sev-X"]);

        let high: Vec<u64> = report.bugs_by_severity["2 - High"].iter().map(|b| b.id).collect();
        assert_eq!(high, vec![1, 3]);
        assert_eq!(report.bugs.len(), 4);
    }

    #[test]
    fn test_no_bugs_is_a_zero_rate() {
        let report = calculate_change_failure(vec![], &deployments(5, 0), 7);

        assert_eq!(report.statistics.change_failure_rate, 0.0);
        assert!(report.bugs_by_severity.is_empty());
    }
}
