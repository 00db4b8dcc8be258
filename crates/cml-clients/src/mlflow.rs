//! MLflow tracking REST client.

use crate::http::{build_client, send_json, trim_base_url, DEFAULT_TIMEOUT};
use async_trait::async_trait;
use cml_abstraction::{
    ApiError, ApiResult, Experiment, ExperimentRun, ExperimentTracker, SearchRunsQuery,
};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::debug;

/// Environment variable holding the tracking server URL.
pub const TRACKING_URI_ENV: &str = "MLFLOW_TRACKING_URI";
/// Optional bearer token for the tracking server.
pub const TRACKING_TOKEN_ENV: &str = "MLFLOW_TRACKING_TOKEN";

/// MLflow tracking client.
#[derive(Debug, Clone)]
pub struct MlflowClient {
    base_url: String,
    token: Option<String>,
    client: Client,
}

impl MlflowClient {
    /// Creates a client from `MLFLOW_TRACKING_URI` and the optional `MLFLOW_TRACKING_TOKEN`.
    #[allow(clippy::disallowed_methods)] // env::var is needed for endpoint loading
    pub fn from_env(timeout: Duration) -> ApiResult<Self> {
        let base_url = env::var(TRACKING_URI_ENV).map_err(|_| {
            ApiError::Configuration(format!("{TRACKING_URI_ENV} environment variable not set"))
        })?;
        let token = env::var(TRACKING_TOKEN_ENV).ok().filter(|t| !t.is_empty());

        Self::with_timeout(base_url, token, timeout)
    }

    /// Creates a client for an explicit tracking server.
    pub fn new(base_url: impl AsRef<str>) -> ApiResult<Self> {
        Self::with_timeout(base_url, None, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl AsRef<str>,
        token: Option<String>,
        timeout: Duration,
    ) -> ApiResult<Self> {
        let base_url = trim_base_url(base_url.as_ref());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ApiError::Configuration(format!(
                "tracking URI must start with http:// or https://, got: {base_url}"
            )));
        }

        Ok(Self { base_url, token, client: build_client(timeout)? })
    }

    /// Sets the bearer token sent with every request.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/2.0/mlflow{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl ExperimentTracker for MlflowClient {
    async fn get_experiment_by_name(&self, name: &str) -> ApiResult<Experiment> {
        debug!(experiment_name = %name, "Resolving experiment by name");
        let url = self.url("/experiments/get-by-name");
        let request = self.authorize(self.client.get(&url).query(&[("experiment_name", name)]));
        let response: GetExperimentResponse = send_json("get_experiment_by_name", request).await?;
        Ok(response.experiment)
    }

    async fn search_runs(&self, query: &SearchRunsQuery) -> ApiResult<Vec<ExperimentRun>> {
        let url = self.url("/runs/search");
        let mut runs = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let body = SearchRunsBody { query, page_token: page_token.as_deref() };
            let request = self.authorize(self.client.post(&url).json(&body));
            let page: SearchRunsResponse = send_json("search_runs", request).await?;

            runs.extend(page.runs.into_iter().map(|r| ExperimentRun {
                experiment_id: r.info.experiment_id,
                run_id: r.info.run_id,
                start_time: r.info.start_time,
                status: r.info.status,
            }));

            if let Some(max) = query.max_results {
                if runs.len() >= max as usize {
                    runs.truncate(max as usize);
                    break;
                }
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(
            experiment_ids = ?query.experiment_ids,
            run_count = runs.len(),
            "Searched experiment runs"
        );
        Ok(runs)
    }
}

// MLflow REST request/response structures

#[derive(Debug, Serialize)]
struct SearchRunsBody<'a> {
    #[serde(flatten)]
    query: &'a SearchRunsQuery,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct GetExperimentResponse {
    experiment: Experiment,
}

#[derive(Debug, Deserialize)]
struct SearchRunsResponse {
    #[serde(default)]
    runs: Vec<MlflowRun>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MlflowRun {
    info: MlflowRunInfo,
}

#[derive(Debug, Deserialize)]
struct MlflowRunInfo {
    run_id: String,
    experiment_id: String,
    #[serde(default, deserialize_with = "int64_field")]
    start_time: Option<i64>,
    #[serde(default)]
    status: Option<String>,
}

/// MLflow may encode int64 fields as JSON numbers or as strings.
fn int64_field<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(i64),
        String(String),
    }

    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::String(s)) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_info_accepts_string_start_time() {
        let info: MlflowRunInfo = serde_json::from_str(
            r#"{"run_id": "r1", "experiment_id": "7", "start_time": "1696118400000"}"#,
        )
        .unwrap();
        assert_eq!(info.start_time, Some(1_696_118_400_000));

        let info: MlflowRunInfo =
            serde_json::from_str(r#"{"run_id": "r1", "experiment_id": "7"}"#).unwrap();
        assert_eq!(info.start_time, None);
    }

    #[test]
    fn test_search_body_flattens_query_and_page_token() {
        let query = SearchRunsQuery::newest_first("7");
        let body = SearchRunsBody { query: &query, page_token: Some("next") };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["experiment_ids"], serde_json::json!(["7"]));
        assert_eq!(value["page_token"], "next");
    }

    #[test]
    fn test_rejects_uri_without_scheme() {
        assert!(MlflowClient::new("localhost:5000").is_err());
    }
}
