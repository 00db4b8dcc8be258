use crate::config::ConfigError;
use crate::operation::Operation;
use cml_abstraction::ApiError;
use thiserror::Error;

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("required environment variable {0} is not set")]
    MissingEnv(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{operation} failed: {source}")]
    Stage {
        operation: Operation,
        #[source]
        source: ApiError,
    },

    #[error("{operation} response is missing {field}")]
    MissingIdentifier { operation: Operation, field: &'static str },

    #[error("experiment '{experiment}' has no runs")]
    NoRuns { experiment: String },

    #[error("project {project_id} is not listed among the projects of {owner}")]
    ProjectNotVisible { project_id: String, owner: String },
}

impl PipelineError {
    /// The API operation this error came from, if it came from one.
    #[must_use]
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::Stage { operation, .. } | Self::MissingIdentifier { operation, .. } => {
                Some(*operation)
            }
            Self::NoRuns { .. } => Some(Operation::SearchRuns),
            Self::ProjectNotVisible { .. } => Some(Operation::ListProjects),
            Self::MissingEnv(_) | Self::Config(_) => None,
        }
    }

    /// HTTP status of the failed platform call, if the platform answered.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Stage { source, .. } => source.status_code(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_error_names_operation() {
        let err = PipelineError::Stage {
            operation: Operation::CreateProject,
            source: ApiError::Status { status: 409, message: "exists".to_string() },
        };
        assert_eq!(err.to_string(), "create_project failed: API error (409): exists");
        assert_eq!(err.operation(), Some(Operation::CreateProject));
        assert_eq!(err.status_code(), Some(409));
    }

    #[test]
    fn test_unanswered_calls_have_no_status() {
        let err = PipelineError::Stage {
            operation: Operation::SearchRuns,
            source: ApiError::RequestError("connection refused".to_string()),
        };
        assert_eq!(err.status_code(), None);
        assert_eq!(PipelineError::NoRuns { experiment: "x".into() }.status_code(), None);
    }

    #[test]
    fn test_environment_errors_have_no_operation() {
        assert_eq!(PipelineError::MissingEnv("CDSW_PROJECT_ID".into()).operation(), None);
    }
}
