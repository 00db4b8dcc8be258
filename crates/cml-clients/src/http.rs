//! Request plumbing shared by the CML and MLflow clients.

use cml_abstraction::{ApiError, ApiResult};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};

/// Request timeout applied when the caller does not pick one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub(crate) fn build_client(timeout: Duration) -> ApiResult<Client> {
    Client::builder().timeout(timeout).build().map_err(|e| {
        ApiError::Configuration(format!("Failed to build HTTP client: {}", e))
    })
}

/// Strips trailing slashes so paths can be appended with `format!("{base}{path}")`.
pub(crate) fn trim_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Sends `request` and decodes a JSON body, mapping failures onto `ApiError`.
///
/// `operation` is the API operation name used in log fields.
pub(crate) async fn send_json<T: DeserializeOwned>(
    operation: &str,
    request: RequestBuilder,
) -> ApiResult<T> {
    let response = request.send().await.map_err(|e| {
        error!(operation, error = %e, "Failed to send request");
        ApiError::RequestError(format!("Network error: {}", e))
    })?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
        error!(
            operation,
            status = %status,
            error = %error_text,
            "API returned error status"
        );
        return Err(ApiError::from_status(status.as_u16(), error_text));
    }

    let body = response.text().await.map_err(|e| {
        error!(operation, error = %e, "Failed to read response body");
        ApiError::RequestError(format!("Failed to read response: {}", e))
    })?;
    debug!(operation, bytes = body.len(), "API call succeeded");

    serde_json::from_str(&body).map_err(|e| {
        error!(operation, error = %e, "Failed to parse API response");
        ApiError::SerializationError(format!("Failed to parse response: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_base_url() {
        assert_eq!(trim_base_url("http://host:8080/"), "http://host:8080");
        assert_eq!(trim_base_url("http://host:8080"), "http://host:8080");
        assert_eq!(trim_base_url("http://host//"), "http://host");
    }
}
