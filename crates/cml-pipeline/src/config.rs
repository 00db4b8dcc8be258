//! Deployment configuration file support.
//!
//! Every setting is optional in the file; `DeployConfig::resolve` fills in the
//! defaults and validates the result.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_EXPERIMENT_NAME: &str = "MySparkMlClf";
pub const DEFAULT_MODEL_PATH: &str = "best-model";
pub const DEFAULT_MODEL_NAME_PREFIX: &str = "SparkClf";
pub const DEFAULT_MODEL_DESCRIPTION: &str = "My Spark Clf";
pub const DEFAULT_PROJECT_NAME: &str = "mlops_prd_prj";
pub const DEFAULT_PROJECT_GIT_URL: &str = "https://github.com/pdefusco/MLOps_CML_PRD_Proj.git";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// What to do when the target project may already exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectPolicy {
    /// Create a new project on every run, even if one with the same name exists.
    #[default]
    AlwaysCreate,
    /// Reuse the owner's first project with the configured name.
    ReuseExisting,
}

/// Which run of the experiment to promote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunSelection {
    /// Most recently started active run.
    #[default]
    Latest,
    /// Earliest started active run.
    Earliest,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentSection {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub run_selection: Option<RunSelection>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSection {
    /// Artifact path of the logged model inside the run.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub name_prefix: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSection {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub git_url: Option<String>,
    #[serde(default)]
    pub policy: Option<ProjectPolicy>,
    /// Check that the owner's project listing shows the target project.
    #[serde(default)]
    pub verify: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSection {
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Deployment configuration as read from TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployConfig {
    #[serde(default)]
    pub experiment: ExperimentSection,
    #[serde(default)]
    pub model: ModelSection,
    #[serde(default)]
    pub project: ProjectSection,
    #[serde(default)]
    pub client: ClientSection,
}

/// Fully resolved settings the pipeline runs with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploySettings {
    pub experiment_name: String,
    pub run_selection: RunSelection,
    pub model_path: String,
    pub model_name_prefix: String,
    pub model_description: String,
    pub project_name: String,
    pub project_git_url: String,
    pub project_policy: ProjectPolicy,
    pub verify_project: bool,
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            experiment_name: DEFAULT_EXPERIMENT_NAME.to_string(),
            run_selection: RunSelection::Latest,
            model_path: DEFAULT_MODEL_PATH.to_string(),
            model_name_prefix: DEFAULT_MODEL_NAME_PREFIX.to_string(),
            model_description: DEFAULT_MODEL_DESCRIPTION.to_string(),
            project_name: DEFAULT_PROJECT_NAME.to_string(),
            project_git_url: DEFAULT_PROJECT_GIT_URL.to_string(),
            project_policy: ProjectPolicy::AlwaysCreate,
            verify_project: true,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    /// Failed to read configuration file.
    #[error("Failed to read configuration file: {0}")]
    ReadError(String),

    /// Failed to parse configuration file.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

impl DeployConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))
    }

    /// Global configuration file path (`~/.cml-deploy/config.toml`).
    pub fn default_global_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".cml-deploy")
            .join("config.toml")
    }

    /// Local configuration file path (`./.cml-deploy.toml`).
    pub fn default_local_path() -> PathBuf {
        PathBuf::from(".cml-deploy.toml")
    }

    /// Discover and load configuration files.
    ///
    /// Loads the global file, then the local file, then `explicit` if given.
    /// Later files override earlier ones. Missing discovered files are skipped;
    /// a missing or broken explicit file is an error.
    pub fn discover_and_load(explicit: Option<&Path>) -> ConfigResult<Self> {
        let mut config = Self::default();

        for path in [Self::default_global_path(), Self::default_local_path()] {
            match Self::load_from_file(&path) {
                Ok(found) => config.merge(&found),
                Err(ConfigError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }

        if let Some(path) = explicit {
            config.merge(&Self::load_from_file(path)?);
        }

        Ok(config)
    }

    /// Merge another configuration into this one.
    ///
    /// Values from `other` override values in `self` if they are Some.
    pub fn merge(&mut self, other: &Self) {
        merge_opt(&mut self.experiment.name, &other.experiment.name);
        merge_opt(&mut self.experiment.run_selection, &other.experiment.run_selection);
        merge_opt(&mut self.model.path, &other.model.path);
        merge_opt(&mut self.model.name_prefix, &other.model.name_prefix);
        merge_opt(&mut self.model.description, &other.model.description);
        merge_opt(&mut self.project.name, &other.project.name);
        merge_opt(&mut self.project.git_url, &other.project.git_url);
        merge_opt(&mut self.project.policy, &other.project.policy);
        merge_opt(&mut self.project.verify, &other.project.verify);
        merge_opt(&mut self.client.timeout_secs, &other.client.timeout_secs);
    }

    /// Fill in defaults and validate.
    pub fn resolve(&self) -> ConfigResult<DeploySettings> {
        let defaults = DeploySettings::default();

        let settings = DeploySettings {
            experiment_name: self.experiment.name.clone().unwrap_or(defaults.experiment_name),
            run_selection: self.experiment.run_selection.unwrap_or(defaults.run_selection),
            model_path: self.model.path.clone().unwrap_or(defaults.model_path),
            model_name_prefix: self.model.name_prefix.clone().unwrap_or(defaults.model_name_prefix),
            model_description: self.model.description.clone().unwrap_or(defaults.model_description),
            project_name: self.project.name.clone().unwrap_or(defaults.project_name),
            project_git_url: self.project.git_url.clone().unwrap_or(defaults.project_git_url),
            project_policy: self.project.policy.unwrap_or(defaults.project_policy),
            verify_project: self.project.verify.unwrap_or(defaults.verify_project),
            timeout: self.client.timeout_secs.map_or(defaults.timeout, Duration::from_secs),
        };

        settings.validate()?;
        Ok(settings)
    }
}

impl DeploySettings {
    pub fn validate(&self) -> ConfigResult<()> {
        let required = [
            ("experiment.name", &self.experiment_name),
            ("model.path", &self.model_path),
            ("model.name_prefix", &self.model_name_prefix),
            ("project.name", &self.project_name),
            ("project.git_url", &self.project_git_url),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue(format!("{key} must not be empty")));
            }
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidValue("client.timeout_secs must be >= 1".to_string()));
        }
        Ok(())
    }
}

fn merge_opt<T: Clone>(target: &mut Option<T>, other: &Option<T>) {
    if let Some(value) = other {
        *target = Some(value.clone());
    }
}
