mod core;
mod pipelines;
mod pull_requests;
mod work_items;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use self::core::AzureDevOpsClient;
use crate::error::Result;
use crate::providers::types::{Build, CoverageModule, PullRequest, Run, WorkItem};
use crate::providers::Tracker;

#[async_trait]
impl Tracker for AzureDevOpsClient {
    async fn list_runs(&self, pipeline_id: &str, top: usize) -> Result<Vec<Run>> {
        self.fetch_runs(pipeline_id, top).await
    }

    async fn latest_build(&self, pipeline_id: &str) -> Result<Option<Build>> {
        self.fetch_latest_build(pipeline_id).await
    }

    async fn list_coverage(&self, build_id: u64) -> Result<Vec<CoverageModule>> {
        self.fetch_coverage(build_id).await
    }

    async fn list_pull_requests(
        &self,
        repository_id: &str,
        top: usize,
    ) -> Result<Vec<PullRequest>> {
        self.fetch_completed_pull_requests(repository_id, top).await
    }

    async fn list_work_items(&self, tag: &str, since: DateTime<Utc>) -> Result<Vec<WorkItem>> {
        self.fetch_tagged_bugs(tag, since).await
    }

    fn build_results_url(&self, build_id: u64) -> Result<String> {
        AzureDevOpsClient::build_results_url(self, build_id)
    }
}
