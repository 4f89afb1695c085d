use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::providers::types::{PullRequest, Run, WorkItem};

/// Envelope written by every CLI command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report<T> {
    pub provider: String,
    pub project: String,
    pub collected_at: DateTime<Utc>,
    #[serde(flatten)]
    pub data: T,
}

/// Connection settings as seen by the CLI. The token is reduced to a flag.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSettings {
    pub base_url: String,
    pub organization: Option<String>,
    pub project: Option<String>,
    pub pipeline_id: Option<String>,
    pub has_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: String,
    pub service: String,
    pub timestamp: DateTime<Utc>,
    pub config: HealthSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DailyRunStats {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatistics {
    pub total_runs: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub success_rate: f64,
    pub deploy_frequency: f64,
    pub window_days: u32,
    pub daily_stats: BTreeMap<String, DailyRunStats>,
    pub hourly_stats: [usize; 24],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRuns {
    pub pipeline_id: String,
    pub statistics: RunStatistics,
    pub runs: Vec<Run>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageSummary {
    pub lines_total: u64,
    pub lines_covered: u64,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageLinks {
    pub coverage: String,
    pub tests: String,
    pub build: String,
}

/// Coverage lookup outcome for one configured pipeline.
///
/// Failed lookups keep whatever run metadata was already known and set `error`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineCoverage {
    pub pipeline_id: String,
    pub pipeline_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage: Option<CoverageSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<CoverageLinks>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CoverageOverview {
    pub pipelines: Vec<PipelineCoverage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeFailureStatistics {
    pub total_bugs: usize,
    pub total_deployments: usize,
    pub change_failure_rate: f64,
    pub period: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeFailureReport {
    pub statistics: ChangeFailureStatistics,
    pub bugs_by_severity: IndexMap<String, Vec<WorkItem>>,
    pub bugs: Vec<WorkItem>,
}

/// Span between a non-designated merge and the designated user's next merge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cycle {
    pub cycle_number: usize,
    #[serde(rename = "startPR")]
    pub start_pr: PullRequest,
    #[serde(rename = "endPR")]
    pub end_pr: PullRequest,
    pub lead_time_hours: f64,
    pub lead_time_days: f64,
    #[serde(rename = "totalPRsInCycle")]
    pub total_prs_in_cycle: usize,
    #[serde(rename = "memberPRs")]
    pub member_prs: Vec<PullRequest>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadTimeStatistics {
    pub total_cycles: usize,
    #[serde(rename = "totalPRs")]
    pub total_prs: usize,
    pub avg_lead_time_hours: f64,
    pub avg_lead_time_days: f64,
    pub median_lead_time_hours: f64,
    pub min_lead_time_hours: f64,
    pub max_lead_time_hours: f64,
    pub deployment_frequency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLeadTime {
    pub count: usize,
    pub total_lead_time: f64,
    pub avg_lead_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadTimeAnalysis {
    pub statistics: LeadTimeStatistics,
    pub cycles: Vec<Cycle>,
    pub daily_stats: BTreeMap<String, DailyLeadTime>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadTimeReport {
    pub repository_id: String,
    pub repository_name: String,
    pub designated_user: String,
    #[serde(flatten)]
    pub analysis: LeadTimeAnalysis,
}
