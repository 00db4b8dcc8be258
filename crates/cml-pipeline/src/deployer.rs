//! Thin wrappers around the platform calls the pipeline makes.
//!
//! Each method issues exactly one API request (listing may page), logs a
//! failure under the operation's name, and rejects responses whose
//! identifier is empty so nothing downstream runs with a blank id.

use crate::config::RunSelection;
use crate::context::{DeploymentContext, SessionId};
use crate::error::{PipelineError, PipelineResult};
use crate::operation::Operation;
use cml_abstraction::{
    ApiError, CreateModelBuildRequest, CreateModelDeploymentRequest, CreateModelRequest,
    CreateProjectRequest, CreateRegisteredModelRequest, ExperimentRun, ListProjectsQuery,
    ModelBuild, ModelDeployment, ModelEntity, Project, RegisteredModel, SearchRunsQuery,
};
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

/// Runtime image every model build runs on.
pub const RUNTIME_IDENTIFIER: &str =
    "docker.repository.cloudera.com/cloudera/cdsw/ml-runtime-workbench-python3.9-standard:2023.08.2-b8";
pub const BUILD_COMMENT: &str = "invoking model build";
pub const DEPLOYMENT_CPU: &str = "2";
pub const DEPLOYMENT_MEMORY: &str = "4";
pub const PROJECT_TEMPLATE: &str = "git";
const PROJECT_PAGE_SIZE: u32 = 100;

/// Issues the individual platform calls for one deployment context.
#[derive(Debug, Clone, Copy)]
pub struct ModelDeployer<'a> {
    ctx: &'a DeploymentContext,
}

impl<'a> ModelDeployer<'a> {
    #[must_use]
    pub fn new(ctx: &'a DeploymentContext) -> Self {
        Self { ctx }
    }

    /// Finds the run to promote from the named experiment.
    pub async fn resolve_run(
        &self,
        experiment_name: &str,
        selection: RunSelection,
    ) -> PipelineResult<ExperimentRun> {
        let experiment = self
            .ctx
            .tracker()
            .get_experiment_by_name(experiment_name)
            .await
            .map_err(failed(Operation::GetExperimentByName))?;
        require_id(Operation::GetExperimentByName, "experiment_id", &experiment.experiment_id)?;

        let mut query = SearchRunsQuery::newest_first(experiment.experiment_id.clone());
        // Earliest is the last row, so only Latest can stop after one.
        if selection == RunSelection::Latest {
            query.max_results = Some(1);
        }

        let mut runs = self
            .ctx
            .tracker()
            .search_runs(&query)
            .await
            .map_err(failed(Operation::SearchRuns))?;
        debug!(experiment_id = %experiment.experiment_id, run_count = runs.len(), "Found runs");

        let run = match selection {
            RunSelection::Latest => runs.into_iter().next(),
            RunSelection::Earliest => runs.pop(),
        }
        .ok_or_else(|| {
            error!(experiment = experiment_name, "Experiment has no active runs");
            PipelineError::NoRuns { experiment: experiment_name.to_string() }
        })?;
        require_id(Operation::SearchRuns, "run_id", &run.run_id)?;

        info!(
            experiment_id = %run.experiment_id,
            run_id = %run.run_id,
            selection = ?selection,
            "Resolved experiment run"
        );
        Ok(run)
    }

    /// Registers `model_name` from the artifact at `model_path` in the given run.
    ///
    /// The registered model belongs to the source project from the context.
    pub async fn register_model_from_run(
        &self,
        model_name: &str,
        experiment_id: &str,
        run_id: &str,
        model_path: &str,
        session_id: &SessionId,
    ) -> PipelineResult<RegisteredModel> {
        let request = CreateRegisteredModelRequest {
            project_id: self.ctx.project_id().to_string(),
            experiment_id: experiment_id.to_string(),
            run_id: run_id.to_string(),
            model_name: model_name.to_string(),
            model_path: model_path.to_string(),
        };
        debug!(session_id = %session_id, request = ?request, "Registering model");

        let model = self
            .ctx
            .platform()
            .create_registered_model(&request)
            .await
            .map_err(failed(Operation::CreateRegisteredModel))?;
        require_id(Operation::CreateRegisteredModel, "model_id", &model.model_id)?;

        info!(model_id = %model.model_id, versions = model.model_versions.len(), "Registered model");
        Ok(model)
    }

    /// Creates a git-templated project. Never checks for an existing one.
    pub async fn create_project(&self, name: &str, template_url: &str) -> PipelineResult<Project> {
        let request = CreateProjectRequest {
            name: name.to_string(),
            template: PROJECT_TEMPLATE.to_string(),
            git_url: template_url.to_string(),
        };

        let project = self
            .ctx
            .platform()
            .create_project(&request)
            .await
            .map_err(failed(Operation::CreateProject))?;
        require_id(Operation::CreateProject, "id", &project.id)?;

        info!(project_id = %project.id, name = %project.name, "Created project");
        Ok(project)
    }

    /// Lists every project owned by `username`, following page tokens.
    pub async fn list_projects_for_owner(&self, username: &str) -> PipelineResult<Vec<Project>> {
        let search_filter = serde_json::json!({ "owner.username": username }).to_string();
        let mut query = ListProjectsQuery {
            search_filter: Some(search_filter),
            page_size: Some(PROJECT_PAGE_SIZE),
            page_token: None,
        };
        let mut projects = Vec::new();
        let mut seen_tokens = HashSet::new();

        loop {
            let page = self
                .ctx
                .platform()
                .list_projects(&query)
                .await
                .map_err(failed(Operation::ListProjects))?;
            let next = page.next_page().map(str::to_string);
            projects.extend(page.projects);

            match next {
                Some(token) if seen_tokens.insert(token.clone()) => query.page_token = Some(token),
                Some(token) => {
                    warn!(owner = username, page_token = %token, "Project listing repeated a page token");
                    break;
                }
                None => break,
            }
        }

        debug!(owner = username, project_count = projects.len(), "Listed projects");
        Ok(projects)
    }

    /// Returns the owner's first project called `name`, if any.
    pub async fn find_project(&self, username: &str, name: &str) -> PipelineResult<Option<Project>> {
        let projects = self.list_projects_for_owner(username).await?;
        Ok(projects.into_iter().find(|p| p.name == name && !p.id.is_empty()))
    }

    /// Creates a model object in `project_id` bound to `registered_model_id`.
    pub async fn create_model(
        &self,
        project_id: &str,
        name: &str,
        registered_model_id: &str,
        description: &str,
    ) -> PipelineResult<ModelEntity> {
        let request = CreateModelRequest {
            project_id: project_id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            registered_model_id: registered_model_id.to_string(),
        };

        let model = self
            .ctx
            .platform()
            .create_model(project_id, &request)
            .await
            .map_err(failed(Operation::CreateModel))?;
        require_id(Operation::CreateModel, "id", &model.id)?;

        info!(project_id, model_entity_id = %model.id, "Created model");
        Ok(model)
    }

    /// Starts a build of the model object on the fixed runtime image.
    ///
    /// The build is not awaited.
    pub async fn create_model_build(
        &self,
        project_id: &str,
        model_version_id: &str,
        model_entity_id: &str,
    ) -> PipelineResult<ModelBuild> {
        let request = CreateModelBuildRequest {
            registered_model_version_id: model_version_id.to_string(),
            runtime_identifier: RUNTIME_IDENTIFIER.to_string(),
            comment: BUILD_COMMENT.to_string(),
            model_id: model_entity_id.to_string(),
        };

        let build = self
            .ctx
            .platform()
            .create_model_build(project_id, model_entity_id, &request)
            .await
            .map_err(failed(Operation::CreateModelBuild))?;
        require_id(Operation::CreateModelBuild, "id", &build.id)?;

        info!(build_id = %build.id, status = ?build.status, "Created model build");
        Ok(build)
    }

    /// Deploys a build with the fixed resource request. Readiness is not awaited.
    pub async fn create_model_deployment(
        &self,
        build_id: &str,
        project_id: &str,
        model_entity_id: &str,
    ) -> PipelineResult<ModelDeployment> {
        let request = CreateModelDeploymentRequest {
            cpu: DEPLOYMENT_CPU.to_string(),
            memory: DEPLOYMENT_MEMORY.to_string(),
        };

        let deployment = self
            .ctx
            .platform()
            .create_model_deployment(project_id, model_entity_id, build_id, &request)
            .await
            .map_err(failed(Operation::CreateModelDeployment))?;
        require_id(Operation::CreateModelDeployment, "id", &deployment.id)?;

        info!(deployment_id = %deployment.id, status = ?deployment.status, "Created model deployment");
        Ok(deployment)
    }
}

fn failed(operation: Operation) -> impl FnOnce(ApiError) -> PipelineError {
    move |source| {
        error!(operation = %operation, error = %source, "Platform call failed");
        PipelineError::Stage { operation, source }
    }
}

fn require_id(operation: Operation, field: &'static str, value: &str) -> PipelineResult<()> {
    if value.trim().is_empty() {
        error!(operation = %operation, field, "Response is missing an identifier");
        return Err(PipelineError::MissingIdentifier { operation, field });
    }
    Ok(())
}
