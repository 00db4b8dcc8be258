//! In-memory platform and tracker fakes shared by the pipeline tests.

#![allow(dead_code)]

use async_trait::async_trait;
use cml_abstraction::{
    ApiError, ApiResult, CreateModelBuildRequest, CreateModelDeploymentRequest, CreateModelRequest,
    CreateProjectRequest, CreateRegisteredModelRequest, Experiment, ExperimentRun,
    ExperimentTracker, ListProjectsQuery, ListProjectsResponse, ModelBuild, ModelDeployment,
    ModelEntity, PlatformApi, Project, ProjectOwner, RegisteredModel, RegisteredModelVersion,
    SearchRunsQuery,
};
use cml_pipeline::{
    DeploymentContext, DeploymentPipeline, DeploySettings, EnvSettings, Operation, ProgressEvent,
    ProgressSink, SessionId,
};
use std::sync::{Arc, Mutex};

pub const SOURCE_PROJECT_ID: &str = "src-proj";
pub const OWNER: &str = "alice";
pub const SESSION: &str = "0a1b2c3d";
pub const EXPERIMENT_ID: &str = "7";

/// One recorded platform call with the arguments it received.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateRegisteredModel(CreateRegisteredModelRequest),
    CreateProject(CreateProjectRequest),
    ListProjects(ListProjectsQuery),
    CreateModel { project_id: String, request: CreateModelRequest },
    CreateModelBuild { project_id: String, model_id: String, request: CreateModelBuildRequest },
    CreateModelDeployment {
        project_id: String,
        model_id: String,
        build_id: String,
        request: CreateModelDeploymentRequest,
    },
}

impl Call {
    pub fn operation(&self) -> Operation {
        match self {
            Self::CreateRegisteredModel(_) => Operation::CreateRegisteredModel,
            Self::CreateProject(_) => Operation::CreateProject,
            Self::ListProjects(_) => Operation::ListProjects,
            Self::CreateModel { .. } => Operation::CreateModel,
            Self::CreateModelBuild { .. } => Operation::CreateModelBuild,
            Self::CreateModelDeployment { .. } => Operation::CreateModelDeployment,
        }
    }
}

pub fn project(id: &str, name: &str) -> Project {
    Project {
        id: id.to_string(),
        name: name.to_string(),
        owner: Some(ProjectOwner { username: OWNER.to_string() }),
    }
}

/// Returns m1/v1/p1/e1/b1/d1 and records every call.
pub struct FakePlatform {
    calls: Mutex<Vec<Call>>,
    failing: Option<Operation>,
    blank_id: Option<Operation>,
    versions: Vec<RegisteredModelVersion>,
    /// Listing pages; page N is requested with token `page-N`.
    pages: Vec<ListProjectsResponse>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: None,
            blank_id: None,
            versions: vec![RegisteredModelVersion { model_version_id: "v1".to_string(), version: Some(1) }],
            pages: vec![ListProjectsResponse {
                projects: vec![project("p0", "scratch"), project("p1", "mlops_prd_prj")],
                next_page_token: Some(String::new()),
            }],
        }
    }

    pub fn failing(mut self, operation: Operation) -> Self {
        self.failing = Some(operation);
        self
    }

    pub fn blank_id(mut self, operation: Operation) -> Self {
        self.blank_id = Some(operation);
        self
    }

    pub fn with_versions(mut self, versions: Vec<RegisteredModelVersion>) -> Self {
        self.versions = versions;
        self
    }

    pub fn with_pages(mut self, pages: Vec<ListProjectsResponse>) -> Self {
        self.pages = pages;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn operations(&self) -> Vec<Operation> {
        self.calls().iter().map(Call::operation).collect()
    }

    pub fn count(&self, operation: Operation) -> usize {
        self.operations().into_iter().filter(|op| *op == operation).count()
    }

    fn record(&self, call: Call) -> ApiResult<()> {
        let operation = call.operation();
        self.calls.lock().unwrap().push(call);
        if self.failing == Some(operation) {
            return Err(ApiError::Status { status: 500, message: format!("simulated {operation} failure") });
        }
        Ok(())
    }

    fn id(&self, operation: Operation, id: &str) -> String {
        if self.blank_id == Some(operation) { String::new() } else { id.to_string() }
    }
}

#[async_trait]
impl PlatformApi for FakePlatform {
    async fn create_registered_model(
        &self,
        request: &CreateRegisteredModelRequest,
    ) -> ApiResult<RegisteredModel> {
        self.record(Call::CreateRegisteredModel(request.clone()))?;
        Ok(RegisteredModel {
            model_id: self.id(Operation::CreateRegisteredModel, "m1"),
            name: request.model_name.clone(),
            model_versions: self.versions.clone(),
        })
    }

    async fn create_project(&self, request: &CreateProjectRequest) -> ApiResult<Project> {
        self.record(Call::CreateProject(request.clone()))?;
        Ok(project(&self.id(Operation::CreateProject, "p1"), &request.name))
    }

    async fn list_projects(&self, query: &ListProjectsQuery) -> ApiResult<ListProjectsResponse> {
        self.record(Call::ListProjects(query.clone()))?;
        let index = query
            .page_token
            .as_deref()
            .and_then(|t| t.strip_prefix("page-"))
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(0);
        Ok(self.pages.get(index).cloned().unwrap_or_default())
    }

    async fn create_model(
        &self,
        project_id: &str,
        request: &CreateModelRequest,
    ) -> ApiResult<ModelEntity> {
        self.record(Call::CreateModel { project_id: project_id.to_string(), request: request.clone() })?;
        Ok(ModelEntity {
            id: self.id(Operation::CreateModel, "e1"),
            name: request.name.clone(),
            description: request.description.clone(),
        })
    }

    async fn create_model_build(
        &self,
        project_id: &str,
        model_id: &str,
        request: &CreateModelBuildRequest,
    ) -> ApiResult<ModelBuild> {
        self.record(Call::CreateModelBuild {
            project_id: project_id.to_string(),
            model_id: model_id.to_string(),
            request: request.clone(),
        })?;
        Ok(ModelBuild { id: self.id(Operation::CreateModelBuild, "b1"), status: Some("pending".to_string()) })
    }

    async fn create_model_deployment(
        &self,
        project_id: &str,
        model_id: &str,
        build_id: &str,
        request: &CreateModelDeploymentRequest,
    ) -> ApiResult<ModelDeployment> {
        self.record(Call::CreateModelDeployment {
            project_id: project_id.to_string(),
            model_id: model_id.to_string(),
            build_id: build_id.to_string(),
            request: request.clone(),
        })?;
        Ok(ModelDeployment {
            id: self.id(Operation::CreateModelDeployment, "d1"),
            status: Some("deploying".to_string()),
        })
    }
}

/// Serves one experiment whose runs are returned newest first.
pub struct FakeTracker {
    runs: Vec<ExperimentRun>,
    failing: Option<Operation>,
    searches: Mutex<Vec<SearchRunsQuery>>,
}

pub fn run(run_id: &str, start_time: i64) -> ExperimentRun {
    ExperimentRun {
        experiment_id: EXPERIMENT_ID.to_string(),
        run_id: run_id.to_string(),
        start_time: Some(start_time),
        status: Some("FINISHED".to_string()),
    }
}

impl FakeTracker {
    pub fn new() -> Self {
        Self::with_runs(vec![run("r1", 1_696_118_400_000)])
    }

    pub fn with_runs(runs: Vec<ExperimentRun>) -> Self {
        Self { runs, failing: None, searches: Mutex::new(Vec::new()) }
    }

    pub fn failing(mut self, operation: Operation) -> Self {
        self.failing = Some(operation);
        self
    }

    pub fn searches(&self) -> Vec<SearchRunsQuery> {
        self.searches.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExperimentTracker for FakeTracker {
    async fn get_experiment_by_name(&self, name: &str) -> ApiResult<Experiment> {
        if self.failing == Some(Operation::GetExperimentByName) {
            return Err(ApiError::NotFound(format!("experiment {name}")));
        }
        Ok(Experiment {
            experiment_id: EXPERIMENT_ID.to_string(),
            name: name.to_string(),
            lifecycle_stage: Some("active".to_string()),
        })
    }

    async fn search_runs(&self, query: &SearchRunsQuery) -> ApiResult<Vec<ExperimentRun>> {
        self.searches.lock().unwrap().push(query.clone());
        if self.failing == Some(Operation::SearchRuns) {
            return Err(ApiError::RequestError("tracker unreachable".to_string()));
        }
        let mut runs = self.runs.clone();
        if let Some(max) = query.max_results {
            runs.truncate(max as usize);
        }
        Ok(runs)
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingSink {
    fn on_event(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn context(platform: Arc<FakePlatform>, tracker: Arc<FakeTracker>) -> DeploymentContext {
    let env = EnvSettings { project_id: SOURCE_PROJECT_ID.to_string(), username: OWNER.to_string() };
    DeploymentContext::new(platform, tracker, env).with_session_id(SessionId(SESSION.to_string()))
}

pub struct Harness {
    pub platform: Arc<FakePlatform>,
    pub tracker: Arc<FakeTracker>,
    pub sink: Arc<RecordingSink>,
    pub pipeline: DeploymentPipeline,
}

pub fn harness(platform: FakePlatform, tracker: FakeTracker, settings: DeploySettings) -> Harness {
    let platform = Arc::new(platform);
    let tracker = Arc::new(tracker);
    let sink = Arc::new(RecordingSink::default());
    let pipeline = DeploymentPipeline::new(context(platform.clone(), tracker.clone()), settings)
        .with_progress(sink.clone());
    Harness { platform, tracker, sink, pipeline }
}
