//! HTTP implementations of the cml-deploy platform traits.
//!
//! # Clients
//!
//! - **CmlClient**: Cloudera Machine Learning API v2 (`CDSW_API_URL` + `CDSW_APIV2_KEY`)
//! - **MlflowClient**: MLflow tracking REST API (`MLFLOW_TRACKING_URI`)

pub mod cml;
mod http;
pub mod mlflow;

pub use cml::CmlClient;
pub use http::DEFAULT_TIMEOUT;
pub use mlflow::MlflowClient;
