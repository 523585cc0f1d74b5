use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::StatusCode;
use serde::Deserialize;

use super::WorkItemSource;
use crate::config::Config;
use crate::error::{ExportError, Result};
use crate::model::work_item::WorkItem;
use crate::util::html::html_to_text;

pub const API_VERSION: &str = "7.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ERROR_BODY: usize = 300;

pub struct AzureDevOpsClient {
    base_url: String,
    organization: String,
    project: String,
    auth_header: String,
    client: reqwest::Client,
}

impl AzureDevOpsClient {
    pub fn new(config: &Config) -> Result<Self> {
        // PATs go in the password slot with an empty username.
        let encoded =
            base64::engine::general_purpose::STANDARD.encode(format!(":{}", config.pat));
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ExportError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            organization: config.organization.clone(),
            project: config.project.clone(),
            auth_header: format!("Basic {encoded}"),
            client,
        })
    }

    pub fn work_item_url(&self, id: u32) -> String {
        format!(
            "{}/{}/{}/_apis/wit/workitems/{id}?api-version={API_VERSION}",
            self.base_url,
            urlencoding::encode(&self.organization),
            urlencoding::encode(&self.project),
        )
    }
}

#[derive(Deserialize)]
struct WorkItemResponse {
    #[serde(default)]
    fields: WorkItemFields,
}

#[derive(Deserialize, Default)]
struct WorkItemFields {
    #[serde(rename = "System.Title")]
    title: Option<String>,
    #[serde(rename = "System.WorkItemType")]
    work_item_type: Option<String>,
    #[serde(rename = "Microsoft.VSTS.Common.AcceptanceCriteria")]
    acceptance_criteria: Option<String>,
}

#[async_trait]
impl WorkItemSource for AzureDevOpsClient {
    fn name(&self) -> &str {
        "Azure DevOps"
    }

    async fn fetch(&self, id: u32) -> Result<WorkItem> {
        let url = self.work_item_url(id);
        tracing::debug!(%url, "fetching work item");

        let resp = self
            .client
            .get(&url)
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ExportError::Network(describe_transport_error(&e)))?;

        let status = resp.status();
        tracing::debug!(status = status.as_u16(), "work item response");
        match status {
            // A rejected PAT can come back as a 203 sign-in page instead of a 401.
            StatusCode::UNAUTHORIZED
            | StatusCode::FORBIDDEN
            | StatusCode::NON_AUTHORITATIVE_INFORMATION => {
                return Err(ExportError::Auth {
                    status: status.as_u16(),
                });
            }
            StatusCode::NOT_FOUND => return Err(ExportError::NotFound(id)),
            s if !s.is_success() => {
                let body = resp.text().await.unwrap_or_default();
                let body: String = body.chars().take(MAX_ERROR_BODY).collect();
                return Err(ExportError::Network(format!(
                    "unexpected HTTP {status} for work item {id}: {}",
                    body.trim()
                )));
            }
            _ => {}
        }

        let parsed: WorkItemResponse = resp.json().await.map_err(|e| {
            ExportError::Network(format!("failed to parse response for work item {id}: {e}"))
        })?;
        let fields = parsed.fields;

        let item_type = fields.work_item_type.unwrap_or_else(|| "Unknown".into());
        let acceptance_criteria = fields
            .acceptance_criteria
            .as_deref()
            .map(html_to_text)
            .unwrap_or_default();
        if acceptance_criteria.is_empty() {
            tracing::info!(id, item_type = %item_type, "work item has no acceptance criteria");
        }

        Ok(WorkItem {
            id,
            item_type,
            title: fields.title.unwrap_or_else(|| "untitled".into()),
            acceptance_criteria,
        })
    }
}

fn describe_transport_error(err: &reqwest::Error) -> String {
    let mut msg = if err.is_timeout() {
        format!("request timed out after {}s", REQUEST_TIMEOUT.as_secs())
    } else if err.is_connect() {
        "could not connect to server".to_string()
    } else {
        "request failed".to_string()
    };
    let mut source: Option<&dyn std::error::Error> = Some(err);
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}
