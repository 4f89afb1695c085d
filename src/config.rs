use serde::Serialize;

use crate::auth::Token;
use crate::error::{DeployLensError, Result};

pub const DEFAULT_BASE_URL: &str = "https://dev.azure.com";

/// A configured pipeline or repository, written as `id:name` in config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedTarget {
    pub id: String,
    pub name: String,
}

impl NamedTarget {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Parse one `id:name` item. A missing name becomes `"{kind} {id}"`.
    pub fn parse(raw: &str, kind: &str) -> Option<Self> {
        let (id, name) = match raw.split_once(':') {
            Some((id, name)) => (id.trim(), name.trim()),
            None => (raw.trim(), ""),
        };

        if id.is_empty() {
            return None;
        }

        let name = if name.is_empty() {
            format!("{kind} {id}")
        } else {
            name.to_string()
        };

        Some(Self::new(id, name))
    }
}

/// Parse a comma-separated `id:name` list, dropping entries without an id.
pub fn parse_target_list(raw: &str, kind: &str) -> Vec<NamedTarget> {
    raw.split(',')
        .filter_map(|item| NamedTarget::parse(item, kind))
        .collect()
}

/// Fail with a `Config` error naming `setting` when a value is absent or blank.
pub fn require<'a>(value: Option<&'a str>, setting: &str) -> Result<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DeployLensError::Config(format!("{setting} not configured")))
}

/// Connection settings for the tracker, validated as a whole.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub base_url: String,
    pub organization: String,
    pub project: String,
    pub token: Token,
}

impl TrackerConfig {
    pub fn resolve(
        base_url: &str,
        organization: Option<&str>,
        project: Option<&str>,
        token: Option<&Token>,
    ) -> Result<Self> {
        let organization = organization.map(str::trim).filter(|s| !s.is_empty());
        let project = project.map(str::trim).filter(|s| !s.is_empty());
        let token = token.filter(|t| !t.is_empty());

        let missing: Vec<&str> = [
            ("AZURE_DEVOPS_ORG", organization.is_none()),
            ("AZURE_DEVOPS_PROJECT", project.is_none()),
            ("AZURE_DEVOPS_TOKEN", token.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        match (organization, project, token) {
            (Some(organization), Some(project), Some(token)) => Ok(Self {
                base_url: base_url.to_string(),
                organization: organization.to_string(),
                project: project.to_string(),
                token: token.clone(),
            }),
            _ => Err(DeployLensError::Config(format!(
                "Azure DevOps configuration missing: {}",
                missing.join(", ")
            ))),
        }
    }
}
