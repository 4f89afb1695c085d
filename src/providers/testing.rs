use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::types::{Build, CoverageModule, PullRequest, Run, RunResult, RunState, WorkItem};
use super::Tracker;
use crate::error::{DeployLensError, Result};

/// In-memory tracker for exercising code written against `Tracker`.
#[derive(Default)]
pub struct FakeTracker {
    pub runs: HashMap<String, Vec<Run>>,
    pub builds: HashMap<String, Build>,
    pub coverage: HashMap<u64, Vec<CoverageModule>>,
    pub pull_requests: HashMap<String, Vec<PullRequest>>,
    pub work_items: Vec<WorkItem>,
    pub failing_pipelines: Vec<String>,
}

impl FakeTracker {
    /// Register a pipeline whose latest run and build both carry `build_id`.
    pub fn with_pipeline(
        mut self,
        pipeline_id: &str,
        build_id: u64,
        modules: Vec<CoverageModule>,
    ) -> Self {
        self.runs.insert(
            pipeline_id.to_string(),
            vec![Run {
                id: build_id,
                name: format!("2024.{build_id}"),
                created_date: "2024-03-01T10:00:00Z".parse().unwrap(),
                finished_date: None,
                state: RunState::Completed,
                result: RunResult::Succeeded,
            }],
        );
        self.builds.insert(
            pipeline_id.to_string(),
            Build {
                id: build_id,
                build_number: format!("2024.{build_id}"),
            },
        );
        self.coverage.insert(build_id, modules);
        self
    }
}

#[async_trait]
impl Tracker for FakeTracker {
    async fn list_runs(&self, pipeline_id: &str, top: usize) -> Result<Vec<Run>> {
        if self.failing_pipelines.iter().any(|p| p == pipeline_id) {
            return Err(DeployLensError::Api(format!(
                "Failed to fetch runs for pipeline {pipeline_id}"
            )));
        }
        let runs = self.runs.get(pipeline_id).cloned().unwrap_or_default();
        Ok(runs.into_iter().take(top).collect())
    }

    async fn latest_build(&self, pipeline_id: &str) -> Result<Option<Build>> {
        Ok(self.builds.get(pipeline_id).cloned())
    }

    async fn list_coverage(&self, build_id: u64) -> Result<Vec<CoverageModule>> {
        self.coverage
            .get(&build_id)
            .cloned()
            .ok_or_else(|| DeployLensError::Api("404 Not Found".to_string()))
    }

    async fn list_pull_requests(&self, repository_id: &str, top: usize) -> Result<Vec<PullRequest>> {
        self.pull_requests
            .get(repository_id)
            .map(|prs| prs.iter().take(top).cloned().collect())
            .ok_or_else(|| {
                DeployLensError::Api(format!("404 - repository {repository_id} not found"))
            })
    }

    // Compares calendar dates only, as the tracker's query language does.
    async fn list_work_items(&self, tag: &str, since: DateTime<Utc>) -> Result<Vec<WorkItem>> {
        Ok(self
            .work_items
            .iter()
            .filter(|w| w.tags.contains(tag) && w.created_date.date_naive() >= since.date_naive())
            .cloned()
            .collect())
    }

    fn build_results_url(&self, build_id: u64) -> Result<String> {
        Ok(format!(
            "https://tracker.test/_build/results?buildId={build_id}"
        ))
    }
}
