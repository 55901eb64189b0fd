//! Octopus Deploy API access.
//!
//! Every endpoint the pipeline consumes is a method on [`DeployApi`];
//! [`OctopusClient`] is the reqwest-backed implementation and an in-memory
//! fake lives in [`testing`] for unit tests. A method returning `None` covers
//! non-2xx statuses, transport failures and undecodable bodies alike; the
//! caller decides whether that is fatal to its own unit of work. Nothing is
//! retried.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::error::OctoError;
use crate::models::{
    DeploymentPage, Environment, Project, ProjectDetail, ProjectGroup, Release, TaskRecord,
};

#[async_trait]
pub trait DeployApi: Send + Sync {
    async fn projects_all(&self) -> Option<Vec<Project>>;
    async fn project_detail(&self, id: &str) -> Option<ProjectDetail>;
    async fn project_groups_all(&self) -> Option<Vec<ProjectGroup>>;
    async fn environments_all(&self) -> Option<Vec<Environment>>;
    async fn deployments_page(
        &self,
        project_id: &str,
        environment_id: &str,
        skip: usize,
        take: usize,
    ) -> Option<DeploymentPage>;
    async fn release(&self, id: &str) -> Option<Release>;
    async fn task(&self, id: &str) -> Option<TaskRecord>;
}

pub struct OctopusClient {
    http: reqwest::Client,
    server_url: String,
    space_id: String,
}

impl OctopusClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Octopus-ApiKey",
            HeaderValue::from_str(&config.api_key).map_err(|_| OctoError::InvalidApiKey)?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.insecure)
            .build()?;

        Ok(Self {
            http,
            server_url: config.server_url.clone(),
            space_id: config.space_id.clone(),
        })
    }

    async fn request<T: DeserializeOwned>(&self, endpoint: &str) -> Option<T> {
        let url = format!("{}/api/{}/{}", self.server_url, self.space_id, endpoint);
        tracing::debug!("Making API request to: {url}");

        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!("API request failed: {url}: {err}");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("API request failed: {status} - {body}");
            return None;
        }

        match response.json::<T>().await {
            Ok(parsed) => {
                tracing::debug!("API request successful: {url}");
                Some(parsed)
            }
            Err(err) => {
                tracing::warn!("Could not decode response from {url}: {err}");
                None
            }
        }
    }
}

#[async_trait]
impl DeployApi for OctopusClient {
    async fn projects_all(&self) -> Option<Vec<Project>> {
        self.request("projects/all").await
    }

    async fn project_detail(&self, id: &str) -> Option<ProjectDetail> {
        self.request(&format!("projects/{id}")).await
    }

    async fn project_groups_all(&self) -> Option<Vec<ProjectGroup>> {
        self.request("projectgroups/all").await
    }

    async fn environments_all(&self) -> Option<Vec<Environment>> {
        self.request("environments/all").await
    }

    async fn deployments_page(
        &self,
        project_id: &str,
        environment_id: &str,
        skip: usize,
        take: usize,
    ) -> Option<DeploymentPage> {
        self.request(&format!(
            "deployments?projects={project_id}&environments={environment_id}&skip={skip}&take={take}"
        ))
        .await
    }

    async fn release(&self, id: &str) -> Option<Release> {
        self.request(&format!("releases/{id}")).await
    }

    async fn task(&self, id: &str) -> Option<TaskRecord> {
        self.request(&format!("tasks/{id}")).await
    }
}
