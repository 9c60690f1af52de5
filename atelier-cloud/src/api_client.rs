//! HTTP client for the shared-project registry service.
//!
//! Every call is a JSON POST to `{api_base_url}/project/{op}`.

use crate::api::RemoteProjectApi;
use crate::config::CloudConfig;
use crate::error::{CloudError, CloudResult};
use crate::types::*;
use async_trait::async_trait;
use atelier_types::{ProjectDocument, SharedProjectSummary, SharedRef};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// reqwest-backed [`RemoteProjectApi`].
pub struct HttpProjectApi {
    client: Client,
    config: CloudConfig,
}

impl HttpProjectApi {
    pub fn new(config: CloudConfig) -> CloudResult<Self> {
        if config.api_base_url.is_empty() {
            return Err(CloudError::Config("api_base_url is empty".to_string()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &CloudConfig {
        &self.config
    }

    async fn post(&self, op: &str, body: &impl Serialize) -> CloudResult<reqwest::Response> {
        let url = format!(
            "{}/project/{}",
            self.config.api_base_url.trim_end_matches('/'),
            op
        );
        debug!("POST {url}");
        Ok(self.client.post(&url).json(body).send().await?)
    }
}

#[async_trait]
impl RemoteProjectApi for HttpProjectApi {
    async fn list(&self, request: &PageRequest) -> CloudResult<Vec<SharedProjectSummary>> {
        let resp = self
            .post("ls", request)
            .await?
            .error_for_status()
            .map_err(|e| CloudError::Api(e.to_string()))?;

        let data: ListResponse = resp.json().await?;
        Ok(data.projects)
    }

    async fn open(&self, shared_uid: &str) -> CloudResult<Option<ProjectDocument>> {
        let resp = self
            .post("o", &serde_json::json!({ "uid": shared_uid }))
            .await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            debug!("shared project {shared_uid} not found");
            return Ok(None);
        }

        let resp = resp
            .error_for_status()
            .map_err(|e| CloudError::Api(e.to_string()))?;

        let data: OpenResponse = resp.json().await?;
        Ok(data
            .projects
            .and_then(|projects| projects.into_iter().next())
            .map(|opened| opened.data))
    }

    async fn copy(&self, cors_token: &str, data: &ProjectDocument) -> CloudResult<ShareReceipt> {
        let resp = self
            .post(
                "cp",
                &serde_json::json!({ "cors_token": cors_token, "data": data }),
            )
            .await?
            .error_for_status()
            .map_err(|e| CloudError::Api(e.to_string()))?;

        Ok(resp.json().await?)
    }

    async fn write(&self, cors_token: &str, data: &ProjectDocument) -> CloudResult<String> {
        let resp = self
            .post(
                "w",
                &serde_json::json!({ "cors_token": cors_token, "data": data }),
            )
            .await?
            .error_for_status()
            .map_err(|e| CloudError::Api(e.to_string()))?;

        let data: UidResponse = resp.json().await?;
        Ok(data.uid)
    }

    async fn remove(&self, shared: &SharedRef, cors_token: &str) -> CloudResult<String> {
        let resp = self
            .post(
                "rm",
                &serde_json::json!({
                    "uid": shared.uid,
                    "token": shared.token,
                    "cors_token": cors_token,
                }),
            )
            .await?
            .error_for_status()
            .map_err(|e| CloudError::Api(e.to_string()))?;

        let data: UidResponse = resp.json().await?;
        Ok(data.uid)
    }
}
