//! The linear deployment pipeline.

use crate::config::{DeploySettings, ProjectPolicy};
use crate::context::{DeploymentContext, SessionId};
use crate::deployer::ModelDeployer;
use crate::error::{PipelineError, PipelineResult};
use crate::operation::{Operation, Stage};
use crate::progress::{NullProgressSink, ProgressEvent, ProgressSink};
use chrono::{DateTime, Utc};
use cml_abstraction::Project;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

/// Identifiers of resources a run has created so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedResources {
    pub registered_model_id: Option<String>,
    /// Only set when the run created the project rather than reusing one.
    pub project_id: Option<String>,
    pub model_entity_id: Option<String>,
    pub build_id: Option<String>,
}

impl CreatedResources {
    /// `(kind, id)` pairs in creation order.
    #[must_use]
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("registered model", &self.registered_model_id),
            ("project", &self.project_id),
            ("model", &self.model_entity_id),
            ("build", &self.build_id),
        ]
        .into_iter()
        .filter_map(|(kind, id)| id.as_deref().map(|id| (kind, id)))
        .collect()
    }
}

/// Identifiers produced by a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentOutcome {
    pub session_id: SessionId,
    pub experiment_id: String,
    pub run_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_started_at: Option<DateTime<Utc>>,
    pub model_name: String,
    pub registered_model_id: String,
    pub model_version_id: String,
    pub project_id: String,
    pub project_reused: bool,
    pub model_entity_id: String,
    pub build_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_status: Option<String>,
    pub deployment_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_status: Option<String>,
    pub finished_at: DateTime<Utc>,
}

/// Runs the stages in order, halting on the first failure.
pub struct DeploymentPipeline {
    ctx: DeploymentContext,
    settings: DeploySettings,
    progress: Arc<dyn ProgressSink>,
}

impl DeploymentPipeline {
    #[must_use]
    pub fn new(ctx: DeploymentContext, settings: DeploySettings) -> Self {
        Self { ctx, settings, progress: Arc::new(NullProgressSink) }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    #[must_use]
    pub fn context(&self) -> &DeploymentContext {
        &self.ctx
    }

    pub async fn run(&self) -> PipelineResult<DeploymentOutcome> {
        let settings = &self.settings;
        let deployer = ModelDeployer::new(&self.ctx);
        let mut created = CreatedResources::default();

        self.progress.on_event(ProgressEvent::Started { session_id: self.ctx.session_id().clone() });
        info!(
            session_id = %self.ctx.session_id(),
            source_project_id = %self.ctx.project_id(),
            owner = %self.ctx.username(),
            experiment = %settings.experiment_name,
            "Starting deployment pipeline"
        );

        let run = self
            .stage(
                Stage::ResolveRun,
                &created,
                deployer.resolve_run(&settings.experiment_name, settings.run_selection),
            )
            .await?;
        self.completed(Stage::ResolveRun, &run.run_id);

        let model_name = self.ctx.model_name(&settings.model_name_prefix);
        let registered = self
            .stage(
                Stage::RegisterModel,
                &created,
                deployer.register_model_from_run(
                    &model_name,
                    &run.experiment_id,
                    &run.run_id,
                    &settings.model_path,
                    self.ctx.session_id(),
                ),
            )
            .await?;
        created.registered_model_id = Some(registered.model_id.clone());

        let model_version_id = match registered.first_version() {
            Some(v) if !v.model_version_id.trim().is_empty() => v.model_version_id.clone(),
            _ => {
                let err = PipelineError::MissingIdentifier {
                    operation: Operation::CreateRegisteredModel,
                    field: "model_versions[0].model_version_id",
                };
                return Err(self.fail(Stage::RegisterModel, err, &created));
            }
        };
        self.completed(Stage::RegisterModel, &registered.model_id);

        let (project, project_reused) = self
            .stage(Stage::ProvisionProject, &created, self.provision_project(&deployer))
            .await?;
        if !project_reused {
            created.project_id = Some(project.id.clone());
        }
        self.completed(Stage::ProvisionProject, &project.id);

        // A reused project was just found in the owner's listing.
        if settings.verify_project && !project_reused {
            self.stage(Stage::VerifyProject, &created, self.verify_project(&deployer, &project.id))
                .await?;
            self.completed(Stage::VerifyProject, &project.id);
        }

        let entity = self
            .stage(
                Stage::CreateModel,
                &created,
                deployer.create_model(
                    &project.id,
                    &model_name,
                    &registered.model_id,
                    &settings.model_description,
                ),
            )
            .await?;
        created.model_entity_id = Some(entity.id.clone());
        self.completed(Stage::CreateModel, &entity.id);

        let build = self
            .stage(
                Stage::CreateBuild,
                &created,
                deployer.create_model_build(&project.id, &model_version_id, &entity.id),
            )
            .await?;
        created.build_id = Some(build.id.clone());
        self.completed(Stage::CreateBuild, &build.id);

        let deployment = self
            .stage(
                Stage::CreateDeployment,
                &created,
                deployer.create_model_deployment(&build.id, &project.id, &entity.id),
            )
            .await?;
        self.completed(Stage::CreateDeployment, &deployment.id);

        self.progress.on_event(ProgressEvent::Finished { deployment_id: deployment.id.clone() });
        info!(
            deployment_id = %deployment.id,
            build_id = %build.id,
            project_id = %project.id,
            "Deployment requested"
        );

        Ok(DeploymentOutcome {
            session_id: self.ctx.session_id().clone(),
            experiment_id: run.experiment_id,
            run_id: run.run_id,
            run_started_at: run.start_time.and_then(DateTime::<Utc>::from_timestamp_millis),
            model_name,
            registered_model_id: registered.model_id,
            model_version_id,
            project_id: project.id,
            project_reused,
            model_entity_id: entity.id,
            build_id: build.id,
            build_status: build.status,
            deployment_id: deployment.id,
            deployment_status: deployment.status,
            finished_at: Utc::now(),
        })
    }

    async fn provision_project(&self, deployer: &ModelDeployer<'_>) -> PipelineResult<(Project, bool)> {
        let name = &self.settings.project_name;
        let git_url = &self.settings.project_git_url;

        match self.settings.project_policy {
            ProjectPolicy::AlwaysCreate => Ok((deployer.create_project(name, git_url).await?, false)),
            ProjectPolicy::ReuseExisting => {
                if let Some(existing) = deployer.find_project(self.ctx.username(), name).await? {
                    info!(project_id = %existing.id, name = %name, "Reusing existing project");
                    return Ok((existing, true));
                }
                Ok((deployer.create_project(name, git_url).await?, false))
            }
        }
    }

    async fn verify_project(&self, deployer: &ModelDeployer<'_>, project_id: &str) -> PipelineResult<()> {
        let owner = self.ctx.username();
        let projects = deployer.list_projects_for_owner(owner).await?;
        if projects.iter().any(|p| p.id == project_id) {
            return Ok(());
        }
        Err(PipelineError::ProjectNotVisible {
            project_id: project_id.to_string(),
            owner: owner.to_string(),
        })
    }

    async fn stage<T>(
        &self,
        stage: Stage,
        created: &CreatedResources,
        work: impl Future<Output = PipelineResult<T>>,
    ) -> PipelineResult<T> {
        self.progress.on_event(ProgressEvent::StageStarted { stage });
        work.await.map_err(|err| self.fail(stage, err, created))
    }

    fn completed(&self, stage: Stage, id: &str) {
        self.progress.on_event(ProgressEvent::StageCompleted { stage, id: id.to_string() });
    }

    fn fail(&self, stage: Stage, err: PipelineError, created: &CreatedResources) -> PipelineError {
        warn!(
            stage = %stage,
            operation = ?err.operation(),
            status = ?err.status_code(),
            error = %err,
            created = ?created,
            "Deployment pipeline halted; created resources are left in place"
        );
        self.progress.on_event(ProgressEvent::StageFailed {
            stage,
            operation: err.operation(),
            status: err.status_code(),
            error: err.to_string(),
            created: created.clone(),
        });
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_resources_entries_in_order() {
        let created = CreatedResources {
            registered_model_id: Some("m1".to_string()),
            project_id: None,
            model_entity_id: Some("e1".to_string()),
            ..Default::default()
        };
        assert_eq!(created.entries(), vec![("registered model", "m1"), ("model", "e1")]);
        assert!(CreatedResources::default().entries().is_empty());
    }
}
