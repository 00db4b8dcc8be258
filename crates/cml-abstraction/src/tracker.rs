//! Experiment tracker (MLflow) types and trait.

use crate::ApiResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experiment {
    pub experiment_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle_stage: Option<String>,
}

/// A recorded training run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentRun {
    pub experiment_id: String,
    pub run_id: String,
    /// Milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunViewType {
    #[default]
    ActiveOnly,
    DeletedOnly,
    All,
}

/// Body of `POST /api/2.0/mlflow/runs/search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRunsQuery {
    pub experiment_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<String>,
    #[serde(default)]
    pub run_view_type: RunViewType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
}

impl SearchRunsQuery {
    /// Active runs of one experiment, newest first.
    #[must_use]
    pub fn newest_first(experiment_id: impl Into<String>) -> Self {
        Self {
            experiment_ids: vec![experiment_id.into()],
            order_by: vec!["attributes.start_time DESC".to_string()],
            run_view_type: RunViewType::ActiveOnly,
            max_results: None,
        }
    }
}

/// Read access to experiment tracking history.
#[async_trait]
pub trait ExperimentTracker: Send + Sync {
    /// Looks an experiment up by its unique name.
    async fn get_experiment_by_name(&self, name: &str) -> ApiResult<Experiment>;

    /// Returns the runs matching the query, in the order the tracker sorted them.
    async fn search_runs(&self, query: &SearchRunsQuery) -> ApiResult<Vec<ExperimentRun>>;
}
