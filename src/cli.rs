use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use log::{info, warn};
use serde::Serialize;
use std::path::PathBuf;

use crate::auth::Token;
use crate::config::{parse_target_list, require, TrackerConfig, DEFAULT_BASE_URL};
use crate::error::DeployLensError;
use crate::insights::{HealthReport, HealthSettings};
use crate::metrics::lead_time::DesignatedUser;
use crate::providers::azure::AzureDevOpsProvider;

#[derive(Parser)]
#[command(name = "deploylens")]
#[command(author, version, about = "Deployment metrics for Azure DevOps", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output file path (defaults to stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Pretty print JSON output
    #[arg(long, global = true, default_value_t = false)]
    pretty: bool,

    /// Azure DevOps organization
    #[arg(long, global = true, env = "AZURE_DEVOPS_ORG")]
    org: Option<String>,

    /// Azure DevOps project
    #[arg(long, global = true, env = "AZURE_DEVOPS_PROJECT")]
    project: Option<String>,

    /// Personal access token
    #[arg(long, global = true, env = "AZURE_DEVOPS_TOKEN", hide_env_values = true)]
    token: Option<Token>,

    /// Azure DevOps instance URL
    #[arg(long, global = true, default_value = DEFAULT_BASE_URL)]
    base_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Report the resolved tracker settings without contacting the tracker
    Health {
        /// Pipeline ID
        #[arg(short, long, env = "AZURE_DEVOPS_PIPELINE_ID")]
        pipeline: Option<String>,
    },

    /// List the configured pipelines
    Pipelines {
        /// Pipelines as `id:name`, comma-separated
        #[arg(long, env = "PIPELINE_LIST", default_value = "")]
        pipelines: String,
    },

    /// Run success/failure statistics for one pipeline
    Runs {
        /// Pipeline ID
        #[arg(short, long, env = "AZURE_DEVOPS_PIPELINE_ID")]
        pipeline: Option<String>,

        /// Window size in days
        #[arg(short, long, default_value_t = 7)]
        days: u32,

        /// Maximum number of runs to fetch
        #[arg(short, long, default_value_t = 1000)]
        top: usize,
    },

    /// Line coverage of the latest build of each unit test pipeline
    Coverage {
        /// Pipelines as `id:name`, comma-separated
        #[arg(long, env = "PIPELINE_UNIT_TEST", default_value = "")]
        pipelines: String,
    },

    /// Tagged bugs per successful deployment
    ChangeFailure {
        /// Tag marking bugs caused by a change
        #[arg(long, env = "BUG_TAG")]
        tag: Option<String>,

        /// Pipeline whose successful runs count as deployments
        #[arg(long, env = "DEPLOY_PIPELINE_ID")]
        deploy_pipeline: Option<String>,

        /// Window size in days
        #[arg(short, long, default_value_t = 30)]
        days: u32,

        /// Maximum number of deployment runs to fetch
        #[arg(short, long, default_value_t = 1000)]
        top: usize,
    },

    /// Lead time for changes, in cycles closed by the designated user's merges
    LeadTime {
        /// Repositories as `id:name`, comma-separated
        #[arg(long, env = "REPOSITORY_ID", default_value = "")]
        repositories: String,

        /// Repository ID to analyze (defaults to the first configured)
        #[arg(short, long)]
        repository: Option<String>,

        /// Identity whose merges close a cycle (id, unique name or display name)
        #[arg(long, env = "DESIGNATED_USER")]
        designated_user: Option<String>,

        /// Window size in days
        #[arg(short, long, default_value_t = 30)]
        days: u32,

        /// Maximum number of pull requests to fetch
        #[arg(short, long, default_value_t = 1000)]
        top: usize,
    },
}

impl Cli {
    fn provider(&self) -> Result<AzureDevOpsProvider> {
        let config = TrackerConfig::resolve(
            &self.base_url,
            self.org.as_deref(),
            self.project.as_deref(),
            self.token.as_ref(),
        )?;

        Ok(AzureDevOpsProvider::new(&config)?)
    }

    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Health { pipeline } => {
                let report = self.health(pipeline.as_deref());
                if let Some(error) = &report.error {
                    warn!("{error}");
                }
                self.write(&report)
            }
            Commands::Pipelines { pipelines } => {
                let pipelines = parse_target_list(pipelines, "Pipeline");
                if pipelines.is_empty() {
                    return Err(DeployLensError::Config("PIPELINE_LIST not configured".to_string()).into());
                }
                self.write(&pipelines)
            }
            Commands::Runs {
                pipeline,
                days,
                top,
            } => {
                let pipeline = require(pipeline.as_deref(), "AZURE_DEVOPS_PIPELINE_ID")?;
                let provider = self.provider()?;

                info!("Collecting run statistics for pipeline: {pipeline}");
                let report = provider.collect_run_statistics(pipeline, *days, *top).await?;
                self.write(&report)
            }
            Commands::Coverage { pipelines } => {
                let pipelines = parse_target_list(pipelines, "Pipeline");
                let provider = self.provider()?;

                info!("Collecting coverage for {} pipelines", pipelines.len());
                let report = provider.collect_coverage(&pipelines).await;
                self.write(&report)
            }
            Commands::ChangeFailure {
                tag,
                deploy_pipeline,
                days,
                top,
            } => {
                let tag = require(tag.as_deref(), "BUG_TAG")?;
                let deploy_pipeline = require(deploy_pipeline.as_deref(), "DEPLOY_PIPELINE_ID")?;
                let provider = self.provider()?;

                info!("Collecting change failure rate for the last {days} days");
                let report = provider
                    .collect_change_failure(tag, deploy_pipeline, *days, *top)
                    .await?;
                self.write(&report)
            }
            Commands::LeadTime {
                repositories,
                repository,
                designated_user,
                days,
                top,
            } => {
                let repositories = parse_target_list(repositories, "Repository");
                let selected = match repository {
                    Some(id) => repositories.into_iter().find(|r| &r.id == id),
                    None => repositories.into_iter().next(),
                }
                .ok_or_else(|| DeployLensError::Config("REPOSITORY_ID not configured".to_string()))?;
                let user = DesignatedUser::new(require(designated_user.as_deref(), "DESIGNATED_USER")?);
                let provider = self.provider()?;

                info!("Collecting lead time for repository: {}", selected.name);
                let report = provider
                    .collect_lead_time(&selected, &user, *days, *top)
                    .await?;
                self.write(&report)
            }
        }
    }

    fn health(&self, pipeline_id: Option<&str>) -> HealthReport {
        let resolved = TrackerConfig::resolve(
            &self.base_url,
            self.org.as_deref(),
            self.project.as_deref(),
            self.token.as_ref(),
        );
        let setting = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        HealthReport {
            status: if resolved.is_ok() { "ok" } else { "misconfigured" }.to_string(),
            service: env!("CARGO_PKG_NAME").to_string(),
            timestamp: Utc::now(),
            config: HealthSettings {
                base_url: self.base_url.clone(),
                organization: setting(self.org.as_deref()),
                project: setting(self.project.as_deref()),
                pipeline_id: setting(pipeline_id),
                has_token: self.token.as_ref().is_some_and(|t| !t.is_empty()),
            },
            error: resolved.err().map(|e| e.to_string()),
        }
    }

    fn write<T: Serialize>(&self, value: &T) -> Result<()> {
        let json_output = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };

        if let Some(output_path) = &self.output {
            std::fs::write(output_path, json_output)?;
            info!("Report written to: {}", output_path.display());
        } else {
            println!("{json_output}");
        }

        Ok(())
    }
}
