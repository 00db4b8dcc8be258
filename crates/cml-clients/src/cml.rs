//! Cloudera Machine Learning API v2 client.
//!
//! Implements `PlatformApi` over the workspace REST API using a bearer API key.

use crate::http::{build_client, send_json, trim_base_url, DEFAULT_TIMEOUT};
use async_trait::async_trait;
use cml_abstraction::{
    ApiError, ApiResult, CreateModelBuildRequest, CreateModelDeploymentRequest, CreateModelRequest,
    CreateProjectRequest, CreateRegisteredModelRequest, ListProjectsQuery, ListProjectsResponse,
    ModelBuild, ModelDeployment, ModelEntity, PlatformApi, Project, RegisteredModel,
};
use reqwest::Client;
use std::env;
use std::time::Duration;
use tracing::debug;

/// Environment variable holding the workspace API URL.
pub const API_URL_ENV: &str = "CDSW_API_URL";
/// Environment variable holding the API v2 key.
pub const API_KEY_ENV: &str = "CDSW_APIV2_KEY";

/// CML API v2 client.
#[derive(Debug, Clone)]
pub struct CmlClient {
    /// Workspace root URL, without any `/api/vN` suffix.
    base_url: String,
    /// The API key sent as a bearer token.
    api_key: String,
    /// HTTP client for making requests.
    client: Client,
}

impl CmlClient {
    /// Creates a client from `CDSW_API_URL` and `CDSW_APIV2_KEY`.
    ///
    /// # Errors
    /// Returns `ApiError::Configuration` if either variable is unset.
    #[allow(clippy::disallowed_methods)] // env::var is needed for credential loading
    pub fn from_env(timeout: Duration) -> ApiResult<Self> {
        let api_url = env::var(API_URL_ENV).map_err(|_| {
            ApiError::Configuration(format!("{API_URL_ENV} environment variable not set"))
        })?;
        let api_key = env::var(API_KEY_ENV).map_err(|_| {
            ApiError::Configuration(format!("{API_KEY_ENV} environment variable not set"))
        })?;

        Self::with_timeout(api_url, api_key, timeout)
    }

    /// Creates a client for an explicit URL and key with the default timeout.
    ///
    /// `api_url` may be the bare workspace URL or the `/api/v1` URL the
    /// workbench exports; the version suffix is stripped.
    pub fn with_api_key(api_url: impl AsRef<str>, api_key: impl Into<String>) -> ApiResult<Self> {
        Self::with_timeout(api_url, api_key, DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom request timeout.
    pub fn with_timeout(
        api_url: impl AsRef<str>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> ApiResult<Self> {
        let base_url = Self::workspace_root(api_url.as_ref());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ApiError::Configuration(format!(
                "API URL must start with http:// or https://, got: {base_url}"
            )));
        }

        Ok(Self { base_url, api_key: api_key.into(), client: build_client(timeout)? })
    }

    /// Returns the workspace root the client talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn workspace_root(api_url: &str) -> String {
        let trimmed = trim_base_url(api_url);
        for suffix in ["/api/v1", "/api/v2"] {
            if let Some(root) = trimmed.strip_suffix(suffix) {
                return root.to_string();
            }
        }
        trimmed
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v2{}", self.base_url, path)
    }
}

#[async_trait]
impl PlatformApi for CmlClient {
    async fn create_registered_model(
        &self,
        request: &CreateRegisteredModelRequest,
    ) -> ApiResult<RegisteredModel> {
        debug!(
            experiment_id = %request.experiment_id,
            run_id = %request.run_id,
            model_name = %request.model_name,
            "Registering model from experiment run"
        );
        let url = self.url("/registry/registeredModels");
        send_json(
            "create_registered_model",
            self.client.post(&url).bearer_auth(&self.api_key).json(request),
        )
        .await
    }

    async fn create_project(&self, request: &CreateProjectRequest) -> ApiResult<Project> {
        debug!(name = %request.name, git_url = %request.git_url, "Creating project");
        let url = self.url("/projects");
        send_json("create_project", self.client.post(&url).bearer_auth(&self.api_key).json(request))
            .await
    }

    async fn list_projects(&self, query: &ListProjectsQuery) -> ApiResult<ListProjectsResponse> {
        debug!(query = ?query, "Listing projects");
        let url = self.url("/projects");
        send_json("list_projects", self.client.get(&url).bearer_auth(&self.api_key).query(query))
            .await
    }

    async fn create_model(
        &self,
        project_id: &str,
        request: &CreateModelRequest,
    ) -> ApiResult<ModelEntity> {
        debug!(project_id, name = %request.name, "Creating model");
        let url = self.url(&format!("/projects/{project_id}/models"));
        send_json("create_model", self.client.post(&url).bearer_auth(&self.api_key).json(request))
            .await
    }

    async fn create_model_build(
        &self,
        project_id: &str,
        model_id: &str,
        request: &CreateModelBuildRequest,
    ) -> ApiResult<ModelBuild> {
        debug!(
            project_id,
            model_id,
            runtime = %request.runtime_identifier,
            "Creating model build"
        );
        let url = self.url(&format!("/projects/{project_id}/models/{model_id}/builds"));
        send_json(
            "create_model_build",
            self.client.post(&url).bearer_auth(&self.api_key).json(request),
        )
        .await
    }

    async fn create_model_deployment(
        &self,
        project_id: &str,
        model_id: &str,
        build_id: &str,
        request: &CreateModelDeploymentRequest,
    ) -> ApiResult<ModelDeployment> {
        debug!(
            project_id,
            model_id,
            build_id,
            cpu = %request.cpu,
            memory = %request.memory,
            "Creating model deployment"
        );
        let url = self.url(&format!(
            "/projects/{project_id}/models/{model_id}/builds/{build_id}/deployments"
        ));
        send_json(
            "create_model_deployment",
            self.client.post(&url).bearer_auth(&self.api_key).json(request),
        )
        .await
    }
}
