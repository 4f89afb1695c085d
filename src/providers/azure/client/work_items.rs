use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use futures::{stream, StreamExt, TryStreamExt};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::core::{AzureDevOpsClient, ListResponse, API_VERSION};
use crate::error::Result;
use crate::providers::types::WorkItem;

const BATCH_SIZE: usize = 200;
const CONCURRENCY: usize = 4;

const FIELDS: [&str; 6] = [
    "System.Title",
    "System.State",
    "System.CreatedDate",
    "System.Tags",
    "System.AssignedTo",
    "Microsoft.VSTS.Common.Severity",
];

#[derive(Debug, Serialize)]
struct WiqlRequest {
    query: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WiqlResponse {
    #[serde(default)]
    work_items: Vec<WorkItemRef>,
}

#[derive(Debug, Deserialize)]
struct WorkItemRef {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct WorkItemDto {
    id: u64,
    fields: WorkItemFields,
}

#[derive(Debug, Deserialize)]
struct WorkItemFields {
    #[serde(rename = "System.Title", default)]
    title: String,
    #[serde(rename = "System.State", default)]
    state: String,
    #[serde(rename = "System.CreatedDate")]
    created_date: DateTime<Utc>,
    #[serde(rename = "System.Tags", default)]
    tags: Option<String>,
    // An identity object on current API versions, a plain string on older ones
    #[serde(rename = "System.AssignedTo", default)]
    assigned_to: Option<Value>,
    #[serde(rename = "Microsoft.VSTS.Common.Severity", default)]
    severity: Option<String>,
}

/// Build the WIQL query selecting tagged bugs created since `since`.
pub fn bug_query(tag: &str, since: DateTime<Utc>) -> String {
    format!(
        "SELECT [System.Id] FROM WorkItems \
         WHERE [System.TeamProject] = @project \
         AND [System.WorkItemType] = 'Bug' \
         AND [System.Tags] CONTAINS '{}' \
         AND [System.CreatedDate] >= '{}' \
         ORDER BY [System.CreatedDate] DESC",
        tag.replace('\'', "''"),
        since.format("%Y-%m-%d")
    )
}

fn split_tags(raw: Option<&str>) -> BTreeSet<String> {
    raw.unwrap_or_default()
        .split(';')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn assignee_name(value: Option<&Value>) -> String {
    match value {
        Some(Value::Object(identity)) => identity
            .get("displayName")
            .and_then(Value::as_str)
            .unwrap_or("Unassigned")
            .to_string(),
        Some(Value::String(name)) if !name.is_empty() => name.clone(),
        _ => "Unassigned".to_string(),
    }
}

impl AzureDevOpsClient {
    /// Fetch bugs tagged with `tag` and created at or after `since`.
    pub async fn fetch_tagged_bugs(&self, tag: &str, since: DateTime<Utc>) -> Result<Vec<WorkItem>> {
        let ids = self.query_bug_ids(tag, since).await?;

        info!("Fetching {} tagged bugs in batches of {BATCH_SIZE}...", ids.len());

        let requests: Vec<_> = ids
            .chunks(BATCH_SIZE)
            .map(|batch| self.fetch_work_item_batch(batch))
            .collect();

        let batches: Vec<Vec<WorkItemDto>> = stream::iter(requests)
            .buffered(CONCURRENCY)
            .try_collect()
            .await?;

        batches
            .into_iter()
            .flatten()
            .map(|dto| self.to_work_item(dto))
            .collect()
    }

    async fn query_bug_ids(&self, tag: &str, since: DateTime<Utc>) -> Result<Vec<u64>> {
        let url = self.api_url(&["wit", "wiql"])?;
        let request = self
            .post(url)
            .query(&[("api-version", API_VERSION)])
            .json(&WiqlRequest {
                query: bug_query(tag, since),
            });

        let response: WiqlResponse = self.send_json(request).await?;
        Ok(response.work_items.into_iter().map(|w| w.id).collect())
    }

    async fn fetch_work_item_batch(&self, ids: &[u64]) -> Result<Vec<WorkItemDto>> {
        let url = self.api_url(&["wit", "workitems"])?;
        let ids = ids
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let fields = FIELDS.join(",");
        let request = self.get(url).query(&[
            ("ids", ids.as_str()),
            ("fields", fields.as_str()),
            ("api-version", API_VERSION),
        ]);

        let response: ListResponse<WorkItemDto> = self.send_json(request).await?;
        Ok(response.value)
    }

    fn to_work_item(&self, dto: WorkItemDto) -> Result<WorkItem> {
        let id = dto.id.to_string();
        let url = self.project_path(&["_workitems", "edit", &id])?;
        let fields = dto.fields;

        Ok(WorkItem {
            id: dto.id,
            title: fields.title,
            state: fields.state,
            created_date: fields.created_date,
            severity: fields.severity.unwrap_or_default(),
            tags: split_tags(fields.tags.as_deref()),
            assignee: assignee_name(fields.assigned_to.as_ref()),
            url: url.to_string(),
        })
    }
}
