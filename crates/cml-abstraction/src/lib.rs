//! Platform abstraction layer for cml-deploy.
//!
//! This crate defines the traits the deployment pipeline talks to and the
//! request/response types exchanged with the ML platform and the experiment
//! tracker. Concrete HTTP implementations live in `cml-clients`.

pub mod platform;
pub mod tracker;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use platform::{
    CreateModelBuildRequest, CreateModelDeploymentRequest, CreateModelRequest,
    CreateProjectRequest, CreateRegisteredModelRequest, ListProjectsQuery, ListProjectsResponse,
    ModelBuild, ModelDeployment, ModelEntity, PlatformApi, Project, ProjectOwner, RegisteredModel,
    RegisteredModelVersion,
};
pub use tracker::{Experiment, ExperimentRun, ExperimentTracker, RunViewType, SearchRunsQuery};

/// Represents an error returned by a platform or tracker API call.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiError {
    /// The request never produced a response (connection refused, timeout, TLS).
    #[error("Request Error: {0}")]
    RequestError(String),

    /// The API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, or a placeholder if it could not be read.
        message: String,
    },

    /// Credentials were rejected (401/403).
    #[error("Authentication failed ({status}): {message}")]
    Unauthorized {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// The addressed resource does not exist (404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// The response body could not be decoded.
    #[error("Serialization Error: {0}")]
    SerializationError(String),

    /// The client is missing its base URL or credentials.
    #[error("Client configuration error: {0}")]
    Configuration(String),
}

impl ApiError {
    /// Maps a non-success HTTP status and body onto the matching variant.
    #[must_use]
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => Self::Unauthorized { status, message },
            404 => Self::NotFound(message),
            _ => Self::Status { status, message },
        }
    }

    /// Returns the HTTP status code carried by this error, if any.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } | Self::Unauthorized { status, .. } => Some(*status),
            Self::NotFound(_) => Some(404),
            _ => None,
        }
    }
}

/// Result alias for API calls.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
