use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a pipeline run as reported by the tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunState {
    #[default]
    Unknown,
    InProgress,
    Canceling,
    Completed,
}

/// Final outcome of a run. Runs that have not finished carry `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunResult {
    Succeeded,
    Failed,
    Canceled,
    #[default]
    None,
}

impl RunResult {
    pub fn label(self) -> &'static str {
        match self {
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Canceled => "Cancelled",
            Self::None => "No Result",
        }
    }
}

/// A single pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub id: u64,
    pub name: String,
    pub created_date: DateTime<Utc>,
    #[serde(default)]
    pub finished_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub state: RunState,
    #[serde(default, deserialize_with = "deserialize_result")]
    pub result: RunResult,
}

// The tracker sends `"result": null` for runs still in progress.
fn deserialize_result<'de, D>(deserializer: D) -> std::result::Result<RunResult, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<RunResult>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Latest build of a pipeline definition, the key to its coverage data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Build {
    pub id: u64,
    pub build_number: String,
}

/// A completed pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub id: u64,
    pub title: String,
    pub author_id: String,
    pub author_display_name: String,
    pub author_unique_name: String,
    pub created_date: DateTime<Utc>,
    pub closed_date: DateTime<Utc>,
}

/// A bug work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub id: u64,
    pub title: String,
    pub state: String,
    pub created_date: DateTime<Utc>,
    pub severity: String,
    pub tags: BTreeSet<String>,
    pub assignee: String,
    pub url: String,
}

/// One coverage statistic of one module in a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageModule {
    pub label: String,
    pub covered: u64,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_deserializes_completed_run() {
        let run: Run = serde_json::from_str(
            r#"{
                "id": 42,
                "name": "20240301.1",
                "createdDate": "2024-03-01T10:15:00.123Z",
                "finishedDate": "2024-03-01T10:25:00Z",
                "state": "completed",
                "result": "succeeded"
            }"#,
        )
        .unwrap();

        assert_eq!(run.id, 42);
        assert_eq!(run.state, RunState::Completed);
        assert_eq!(run.result, RunResult::Succeeded);
        assert!(run.finished_date.is_some());
    }

    #[test]
    fn test_run_without_result_maps_to_none() {
        let run: Run = serde_json::from_str(
            r#"{"id": 1, "name": "r", "createdDate": "2024-03-01T10:15:00Z", "state": "inProgress", "result": null}"#,
        )
        .unwrap();

        assert_eq!(run.result, RunResult::None);
        assert_eq!(run.state, RunState::InProgress);
        assert_eq!(run.finished_date, None);
    }

    #[test]
    fn test_unknown_result_is_rejected() {
        let parsed = serde_json::from_str::<Run>(
            r#"{"id": 1, "name": "r", "createdDate": "2024-03-01T10:15:00Z", "result": "exploded"}"#,
        );

        assert!(parsed.is_err());
    }

    #[test]
    fn test_labels_are_total() {
        assert_eq!(RunResult::Canceled.label(), "Cancelled");
        assert_eq!(RunResult::None.label(), "No Result");
        assert_eq!(RunResult::Failed.label(), "Failed");
    }
}
