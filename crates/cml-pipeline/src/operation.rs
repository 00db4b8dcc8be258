use serde::{Deserialize, Serialize};

/// A single platform or tracker API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    GetExperimentByName,
    SearchRuns,
    CreateRegisteredModel,
    CreateProject,
    ListProjects,
    CreateModel,
    CreateModelBuild,
    CreateModelDeployment,
}

impl Operation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetExperimentByName => "get_experiment_by_name",
            Self::SearchRuns => "search_runs",
            Self::CreateRegisteredModel => "create_registered_model",
            Self::CreateProject => "create_project",
            Self::ListProjects => "list_projects",
            Self::CreateModel => "create_model",
            Self::CreateModelBuild => "create_model_build",
            Self::CreateModelDeployment => "create_model_deployment",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A step of the deployment pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ResolveRun,
    RegisterModel,
    ProvisionProject,
    VerifyProject,
    CreateModel,
    CreateBuild,
    CreateDeployment,
}

impl Stage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ResolveRun => "resolve-run",
            Self::RegisterModel => "register-model",
            Self::ProvisionProject => "provision-project",
            Self::VerifyProject => "verify-project",
            Self::CreateModel => "create-model",
            Self::CreateBuild => "create-build",
            Self::CreateDeployment => "create-deployment",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
