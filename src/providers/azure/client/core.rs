use log::debug;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::auth::Token;
use crate::config::TrackerConfig;
use crate::error::{DeployLensError, Result};

pub const API_VERSION: &str = "7.1";

/// Standard `{ "count": n, "value": [...] }` list envelope.
#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

pub struct AzureDevOpsClient {
    client: Client,
    project_url: Url,
    token: Token,
}

impl AzureDevOpsClient {
    pub fn new(config: &TrackerConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent("DeployLens/0.1.0")
            .build()
            .map_err(|e| DeployLensError::Config(format!("Failed to create HTTP client: {e}")))?;

        let mut project_url = Url::parse(&config.base_url)
            .map_err(|e| DeployLensError::Config(format!("Invalid base URL: {e}")))?;
        project_url
            .path_segments_mut()
            .map_err(|()| {
                DeployLensError::Config(format!("Base URL cannot be a base: {}", config.base_url))
            })?
            .pop_if_empty()
            .push(&config.organization)
            .push(&config.project)
            .push("");

        Ok(Self {
            client,
            project_url,
            token: config.token.clone(),
        })
    }

    /// `{base}/{org}/{project}/{segments...}`, each segment percent-encoded.
    pub fn project_path(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.project_url.clone();
        url.path_segments_mut()
            .map_err(|()| DeployLensError::Config("Invalid project URL".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub fn api_url(&self, segments: &[&str]) -> Result<Url> {
        let mut all = Vec::with_capacity(segments.len() + 1);
        all.push("_apis");
        all.extend_from_slice(segments);
        self.project_path(&all)
    }

    pub fn get(&self, url: Url) -> RequestBuilder {
        self.client.get(url)
    }

    pub fn post(&self, url: Url) -> RequestBuilder {
        self.client.post(url)
    }

    fn auth_request(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth("", Some(self.token.as_str()))
    }

    /// Send an authenticated request and decode a JSON body.
    ///
    /// Non-success statuses become `Api` errors carrying the response body.
    pub async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let request = self.auth_request(request).build()?;
        debug!("{} {}", request.method(), request.url());

        let response = self.client.execute(request).await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(DeployLensError::Api(format!("{status} - {body}")));
        }

        Ok(serde_json::from_str(&body)?)
    }
}
