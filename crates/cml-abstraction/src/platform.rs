//! ML platform (CML API v2) resources and the trait the pipeline drives.

use crate::ApiResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/v2/registry/registeredModels`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRegisteredModelRequest {
    /// Project that owns the experiment run.
    pub project_id: String,
    pub experiment_id: String,
    pub run_id: String,
    pub model_name: String,
    /// Artifact path of the logged model inside the run.
    pub model_path: String,
}

/// A model registered in the platform's model registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredModel {
    pub model_id: String,
    #[serde(default)]
    pub name: String,
    /// Versions in the order the registry returned them.
    #[serde(default)]
    pub model_versions: Vec<RegisteredModelVersion>,
}

impl RegisteredModel {
    /// The version the pipeline builds from.
    #[must_use]
    pub fn first_version(&self) -> Option<&RegisteredModelVersion> {
        self.model_versions.first()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredModelVersion {
    pub model_version_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
}

/// Body of `POST /api/v2/projects`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    /// Project template kind; `"git"` clones `git_url`.
    pub template: String,
    pub git_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectOwner {
    pub username: String,
}

/// A platform project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<ProjectOwner>,
}

/// Query parameters of `GET /api/v2/projects`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListProjectsQuery {
    /// JSON-encoded filter, e.g. `{"owner.username":"alice"}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListProjectsResponse {
    #[serde(default)]
    pub projects: Vec<Project>,
    /// Empty or absent on the last page.
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl ListProjectsResponse {
    /// Token for the next page, treating an empty string as "no more pages".
    #[must_use]
    pub fn next_page(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Body of `POST /api/v2/projects/{project_id}/models`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateModelRequest {
    pub project_id: String,
    pub name: String,
    pub description: String,
    pub registered_model_id: String,
}

/// A model object inside a project, bound to a registered model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEntity {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Body of `POST /api/v2/projects/{project_id}/models/{model_id}/builds`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateModelBuildRequest {
    pub registered_model_version_id: String,
    /// Container runtime image the build runs on.
    pub runtime_identifier: String,
    pub comment: String,
    pub model_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelBuild {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Body of `POST .../builds/{build_id}/deployments`.
///
/// The platform accepts the resource quantities as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateModelDeploymentRequest {
    pub cpu: String,
    pub memory: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDeployment {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// The platform operations the deployment pipeline needs.
///
/// Implementations must be `Send + Sync` so a single client can be shared
/// through the deployment context.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Registers a model from an experiment run.
    async fn create_registered_model(
        &self,
        request: &CreateRegisteredModelRequest,
    ) -> ApiResult<RegisteredModel>;

    /// Creates a new project. Never deduplicates by name.
    async fn create_project(&self, request: &CreateProjectRequest) -> ApiResult<Project>;

    /// Returns one page of projects matching the query.
    async fn list_projects(&self, query: &ListProjectsQuery) -> ApiResult<ListProjectsResponse>;

    /// Creates a model object in `project_id`.
    async fn create_model(
        &self,
        project_id: &str,
        request: &CreateModelRequest,
    ) -> ApiResult<ModelEntity>;

    /// Starts a build of `model_id`. The build runs asynchronously on the platform.
    async fn create_model_build(
        &self,
        project_id: &str,
        model_id: &str,
        request: &CreateModelBuildRequest,
    ) -> ApiResult<ModelBuild>;

    /// Deploys `build_id`. Returns as soon as the platform accepts the request.
    async fn create_model_deployment(
        &self,
        project_id: &str,
        model_id: &str,
        build_id: &str,
        request: &CreateModelDeploymentRequest,
    ) -> ApiResult<ModelDeployment>;
}
