//! cml-deploy pipeline
//!
//! Promotes the latest run of an experiment to a serving endpoint:
//! - Resolving the run from the experiment tracker
//! - Registering the model and provisioning the target project (`ModelDeployer`)
//! - Building and deploying it in order (`DeploymentPipeline`)
//! - Reporting stage progress (`ProgressSink`)

pub mod config;
pub mod context;
pub mod deployer;
pub mod error;
pub mod operation;
pub mod pipeline;
pub mod progress;
pub mod sample;

pub use config::{
    ConfigError, ConfigResult, DeployConfig, DeploySettings, ProjectPolicy, RunSelection,
};
pub use context::{DeploymentContext, EnvSettings, SessionId};
pub use deployer::ModelDeployer;
pub use error::{PipelineError, PipelineResult};
pub use operation::{Operation, Stage};
pub use pipeline::{CreatedResources, DeploymentOutcome, DeploymentPipeline};
pub use progress::{NullProgressSink, ProgressEvent, ProgressSink, StdoutProgressSink};
pub use sample::{sample_request, DataframeSplit, InferenceRequest};
