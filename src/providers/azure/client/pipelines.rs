use serde::Deserialize;

use super::core::{AzureDevOpsClient, ListResponse, API_VERSION};
use crate::error::Result;
use crate::providers::types::{Build, CoverageModule, Run};

const COVERAGE_API_VERSION: &str = "7.1-preview.1";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildDto {
    id: u64,
    #[serde(default)]
    build_number: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CodeCoverageResponse {
    #[serde(default)]
    coverage_data: Vec<CoverageDataDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoverageDataDto {
    #[serde(default)]
    coverage_stats: Vec<CoverageStatDto>,
}

#[derive(Debug, Deserialize)]
struct CoverageStatDto {
    #[serde(default)]
    label: String,
    #[serde(default)]
    covered: u64,
    #[serde(default)]
    total: u64,
}

impl From<CoverageStatDto> for CoverageModule {
    fn from(stat: CoverageStatDto) -> Self {
        Self {
            label: stat.label,
            covered: stat.covered,
            total: stat.total,
        }
    }
}

impl AzureDevOpsClient {
    /// Fetch the most recent runs of a pipeline, newest first.
    pub async fn fetch_runs(&self, pipeline_id: &str, top: usize) -> Result<Vec<Run>> {
        let url = self.api_url(&["pipelines", pipeline_id, "runs"])?;
        let request = self
            .get(url)
            .query(&[("api-version", API_VERSION)])
            .query(&[("$top", top)]);

        let response: ListResponse<Run> = self.send_json(request).await?;
        Ok(response.value)
    }

    /// Fetch the latest build of a build definition.
    pub async fn fetch_latest_build(&self, definition_id: &str) -> Result<Option<Build>> {
        let url = self.api_url(&["build", "builds"])?;
        let request = self.get(url).query(&[
            ("definitions", definition_id),
            ("$top", "1"),
            ("api-version", API_VERSION),
        ]);

        let response: ListResponse<BuildDto> = self.send_json(request).await?;
        Ok(response.value.into_iter().next().map(|b| Build {
            id: b.id,
            build_number: b.build_number,
        }))
    }

    /// Fetch every coverage statistic of every module in a build.
    pub async fn fetch_coverage(&self, build_id: u64) -> Result<Vec<CoverageModule>> {
        let url = self.api_url(&["test", "codecoverage"])?;
        let request = self
            .get(url)
            .query(&[("buildId", build_id.to_string())])
            .query(&[("api-version", COVERAGE_API_VERSION)]);

        let response: CodeCoverageResponse = self.send_json(request).await?;
        Ok(response
            .coverage_data
            .into_iter()
            .flat_map(|module| module.coverage_stats)
            .map(CoverageModule::from)
            .collect())
    }

    /// Web address of a build's results page.
    pub fn build_results_url(&self, build_id: u64) -> Result<String> {
        let mut url = self.project_path(&["_build", "results"])?;
        url.query_pairs_mut()
            .append_pair("buildId", &build_id.to_string());
        Ok(url.to_string())
    }
}
