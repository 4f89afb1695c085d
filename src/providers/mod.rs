pub mod azure;
#[cfg(test)]
pub mod testing;
pub mod types;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use types::{Build, CoverageModule, PullRequest, Run, WorkItem};

/// Read-only access to the upstream issue/CI tracker.
#[async_trait]
pub trait Tracker: Send + Sync {
    /// Most recent runs of a pipeline, newest first.
    async fn list_runs(&self, pipeline_id: &str, top: usize) -> Result<Vec<Run>>;

    /// Latest build of a pipeline definition, if it has ever built.
    async fn latest_build(&self, pipeline_id: &str) -> Result<Option<Build>>;

    async fn list_coverage(&self, build_id: u64) -> Result<Vec<CoverageModule>>;

    /// Completed pull requests of a repository.
    async fn list_pull_requests(&self, repository_id: &str, top: usize)
        -> Result<Vec<PullRequest>>;

    /// Bugs carrying `tag` created at or after `since`.
    async fn list_work_items(&self, tag: &str, since: DateTime<Utc>) -> Result<Vec<WorkItem>>;

    /// Web UI address of a build's results page.
    fn build_results_url(&self, build_id: u64) -> Result<String>;
}
