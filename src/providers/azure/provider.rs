use chrono::{DateTime, Duration, Utc};
use log::{info, warn};

use super::client::AzureDevOpsClient;
use crate::config::{NamedTarget, TrackerConfig};
use crate::error::Result;
use crate::insights::{
    ChangeFailureReport, CoverageOverview, LeadTimeReport, PipelineRuns, Report,
};
use crate::metrics::change_failure::calculate_change_failure;
use crate::metrics::coverage::collect_pipeline_coverage;
use crate::metrics::lead_time::{analyze_lead_time, DesignatedUser};
use crate::metrics::run_stats::calculate_run_statistics;
use crate::providers::types::RunResult;
use crate::providers::Tracker;

const PROVIDER_NAME: &str = "Azure DevOps";
const MAX_RUNS_IN_REPORT: usize = 100;

pub struct AzureDevOpsProvider<T = AzureDevOpsClient> {
    tracker: T,
    project: String,
}

impl AzureDevOpsProvider {
    pub fn new(config: &TrackerConfig) -> Result<Self> {
        let client = AzureDevOpsClient::new(config)?;

        Ok(Self::with_tracker(client, &config.project))
    }
}

impl<T: Tracker> AzureDevOpsProvider<T> {
    pub fn with_tracker(tracker: T, project: &str) -> Self {
        Self {
            tracker,
            project: project.to_string(),
        }
    }

    fn report<D>(&self, data: D) -> Report<D> {
        Report {
            provider: PROVIDER_NAME.to_string(),
            project: self.project.clone(),
            collected_at: Utc::now(),
            data,
        }
    }

    pub async fn collect_run_statistics(
        &self,
        pipeline_id: &str,
        days: u32,
        top: usize,
    ) -> Result<Report<PipelineRuns>> {
        info!("Fetching up to {top} runs for pipeline {pipeline_id}...");

        let cutoff = window_start(days);
        let mut runs = self.tracker.list_runs(pipeline_id, top).await?;
        runs.retain(|r| r.created_date >= cutoff);

        if runs.is_empty() {
            warn!("No runs found for pipeline {pipeline_id} in the last {days} days");
        }

        let statistics = calculate_run_statistics(&runs, days);
        runs.truncate(MAX_RUNS_IN_REPORT);

        Ok(self.report(PipelineRuns {
            pipeline_id: pipeline_id.to_string(),
            statistics,
            runs,
        }))
    }

    pub async fn collect_coverage(&self, pipelines: &[NamedTarget]) -> Report<CoverageOverview> {
        if pipelines.is_empty() {
            warn!("No unit test pipelines configured");
        }

        let pipelines = collect_pipeline_coverage(&self.tracker, pipelines).await;

        self.report(CoverageOverview { pipelines })
    }

    pub async fn collect_change_failure(
        &self,
        tag: &str,
        deploy_pipeline_id: &str,
        days: u32,
        top: usize,
    ) -> Result<Report<ChangeFailureReport>> {
        let cutoff = window_start(days);

        info!("Fetching bugs tagged '{tag}' and deployments of pipeline {deploy_pipeline_id}...");

        let (bugs, runs) = tokio::join!(
            self.tracker.list_work_items(tag, cutoff),
            self.tracker.list_runs(deploy_pipeline_id, top),
        );

        let deployments: Vec<_> = runs?
            .into_iter()
            .filter(|r| r.result == RunResult::Succeeded && r.created_date >= cutoff)
            .collect();

        if deployments.is_empty() {
            warn!("No successful deployments in the last {days} days");
        }

        // The tracker's bug query only compares dates
        let mut bugs = bugs?;
        bugs.retain(|b| b.created_date >= cutoff);

        Ok(self.report(calculate_change_failure(bugs, &deployments, days)))
    }

    pub async fn collect_lead_time(
        &self,
        repository: &NamedTarget,
        user: &DesignatedUser,
        days: u32,
        top: usize,
    ) -> Result<Report<LeadTimeReport>> {
        let cutoff = window_start(days);

        let mut pull_requests = self
            .tracker
            .list_pull_requests(&repository.id, top)
            .await?;
        pull_requests.retain(|pr| pr.closed_date >= cutoff);

        info!(
            "Processed {} pull requests closed in the last {days} days",
            pull_requests.len()
        );

        if pull_requests.is_empty() {
            warn!("No completed pull requests for repository {}", repository.name);
        }

        let analysis = analyze_lead_time(&pull_requests, user);

        Ok(self.report(LeadTimeReport {
            repository_id: repository.id.clone(),
            repository_name: repository.name.clone(),
            designated_user: user.as_str().to_string(),
            analysis,
        }))
    }
}

fn window_start(days: u32) -> DateTime<Utc> {
    Utc::now() - Duration::days(i64::from(days))
}
