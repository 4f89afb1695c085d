use chrono::{DateTime, Utc};
use log::info;
use serde::Deserialize;

use super::core::{AzureDevOpsClient, ListResponse, API_VERSION};
use crate::error::Result;
use crate::providers::types::PullRequest;

const PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullRequestDto {
    pull_request_id: u64,
    #[serde(default)]
    title: String,
    created_by: IdentityDto,
    creation_date: DateTime<Utc>,
    closed_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityDto {
    #[serde(default)]
    id: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    unique_name: String,
}

impl PullRequestDto {
    // Completed PRs always carry a close date; anything else is not a merge.
    fn into_pull_request(self) -> Option<PullRequest> {
        Some(PullRequest {
            id: self.pull_request_id,
            title: self.title,
            author_id: self.created_by.id,
            author_display_name: self.created_by.display_name,
            author_unique_name: self.created_by.unique_name,
            created_date: self.creation_date,
            closed_date: self.closed_date?,
        })
    }
}

impl AzureDevOpsClient {
    /// Fetch up to `limit` completed pull requests, most recently closed first.
    pub async fn fetch_completed_pull_requests(
        &self,
        repository_id: &str,
        limit: usize,
    ) -> Result<Vec<PullRequest>> {
        let url = self.api_url(&["git", "repositories", repository_id, "pullrequests"])?;
        let mut all_pull_requests = Vec::new();
        let mut skip = 0;

        info!("Fetching up to {limit} completed pull requests...");

        while all_pull_requests.len() < limit {
            let top = PAGE_SIZE.min(limit - all_pull_requests.len());
            let request = self
                .get(url.clone())
                .query(&[
                    ("searchCriteria.status", "completed"),
                    ("api-version", API_VERSION),
                ])
                .query(&[("$top", top), ("$skip", skip)]);

            let page: ListResponse<PullRequestDto> = self.send_json(request).await?;
            let fetched_count = page.value.len();

            all_pull_requests.extend(
                page.value
                    .into_iter()
                    .filter_map(PullRequestDto::into_pull_request),
            );

            if fetched_count < top {
                break;
            }
            skip += fetched_count;
        }

        all_pull_requests.truncate(limit);
        info!("Fetched {} completed pull requests", all_pull_requests.len());
        Ok(all_pull_requests)
    }
}
