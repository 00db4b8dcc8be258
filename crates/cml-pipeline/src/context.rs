//! Deployment context: the clients and identity a pipeline run works with.

use crate::error::{PipelineError, PipelineResult};
use cml_abstraction::{ExperimentTracker, PlatformApi};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Environment variable naming the project the experiment lives in.
pub const PROJECT_ID_ENV: &str = "CDSW_PROJECT_ID";
/// Environment variable naming the user that owns the deployment.
pub const PROJECT_OWNER_ENV: &str = "PROJECT_OWNER";

/// Identity values the workbench provides through the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvSettings {
    /// Source project holding the experiment run.
    pub project_id: String,
    /// Owner username, used for naming and project lookups.
    pub username: String,
}

impl EnvSettings {
    /// Reads `CDSW_PROJECT_ID` and `PROJECT_OWNER` from the process environment.
    #[allow(clippy::disallowed_methods)] // env::var is the source of these values
    pub fn from_env() -> PipelineResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads both values through `lookup`. Unset and blank values are errors.
    pub fn from_lookup<F>(lookup: F) -> PipelineResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| PipelineError::MissingEnv(key.to_string()))
        };

        Ok(Self { project_id: read(PROJECT_ID_ENV)?, username: read(PROJECT_OWNER_ENV)? })
    }
}

/// Random per-invocation suffix keeping model names unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Four random bytes, hex encoded.
    #[must_use]
    pub fn generate() -> Self {
        Self(hex::encode(rand::random::<[u8; 4]>()))
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Everything a pipeline run needs besides its settings.
#[derive(Clone)]
pub struct DeploymentContext {
    platform: Arc<dyn PlatformApi>,
    tracker: Arc<dyn ExperimentTracker>,
    env: EnvSettings,
    session_id: SessionId,
}

impl DeploymentContext {
    /// Creates a context with a freshly generated session id.
    #[must_use]
    pub fn new(
        platform: Arc<dyn PlatformApi>,
        tracker: Arc<dyn ExperimentTracker>,
        env: EnvSettings,
    ) -> Self {
        Self { platform, tracker, env, session_id: SessionId::generate() }
    }

    #[must_use]
    pub fn with_session_id(mut self, session_id: SessionId) -> Self {
        self.session_id = session_id;
        self
    }

    #[must_use]
    pub fn platform(&self) -> &dyn PlatformApi {
        self.platform.as_ref()
    }

    #[must_use]
    pub fn tracker(&self) -> &dyn ExperimentTracker {
        self.tracker.as_ref()
    }

    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.env.project_id
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.env.username
    }

    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// `<prefix>-<username>-<session>`, shared by the registered model and the model object.
    #[must_use]
    pub fn model_name(&self, prefix: &str) -> String {
        format!("{prefix}-{}-{}", self.env.username, self.session_id)
    }
}

impl std::fmt::Debug for DeploymentContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentContext")
            .field("env", &self.env)
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}
