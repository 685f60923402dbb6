//! HTTP utilities for talking to the Google Ads REST interface

use crate::error::{PlannerError, PlannerResult};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// HTTP client wrapper with planner-specific error handling
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    default_timeout: Duration,
}

/// Google API error envelope: `{"error": {"code": .., "message": .., "status": ..}}`
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client with custom timeout
    pub fn with_timeout(timeout_ms: u64) -> PlannerResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("keyword-planner-rust/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| PlannerError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            default_timeout: Duration::from_millis(timeout_ms),
        })
    }

    /// Make a POST request with a JSON body and headers, and deserialize the JSON response
    pub async fn post_json_with_headers<B, T>(
        &self,
        url: &str,
        body: &B,
        headers: &HashMap<String, String>,
    ) -> PlannerResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self
            .client
            .post(url)
            .timeout(self.default_timeout)
            .json(body);

        for (key, value) in headers {
            request = request.header(key.as_str(), value.as_str());
        }

        let response = request.send().await?;
        self.handle_response_json(response).await
    }

    /// Handle HTTP response and deserialize as JSON
    async fn handle_response_json<T>(&self, response: Response) -> PlannerResult<T>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            // Empty bodies are valid for some mutates; treat them as `{}`
            let body = if text.trim().is_empty() { "{}" } else { &text };
            serde_json::from_str(body).map_err(|e| {
                PlannerError::Parse(format!("Failed to parse response: {e}. Response: {text}"))
            })
        } else {
            Err(status_error(status.as_u16(), text))
        }
    }
}

/// Map a non-success status and body onto the planner error taxonomy
pub fn status_error(status_code: u16, body: String) -> PlannerError {
    let detail = serde_json::from_str::<ApiErrorEnvelope>(&body)
        .ok()
        .map(|envelope| match envelope.error.status {
            Some(status) => format!("{status}: {}", envelope.error.message),
            None => envelope.error.message,
        })
        .unwrap_or_else(|| format!("Request failed with status: {status_code}"));

    match status_code {
        401 | 403 => PlannerError::Transport {
            message: format!("Authentication failed ({status_code}): {detail}"),
            status_code: Some(status_code),
        },
        _ => PlannerError::RemoteApi {
            message: detail,
            status_code: Some(status_code),
            payload: (!body.is_empty()).then_some(body),
        },
    }
}

/// Join a resource path onto a base URL, keeping any path prefix of the base
pub fn build_url(base_url: &str, path: &str) -> PlannerResult<String> {
    let mut base = base_url.trim_end_matches('/').to_string();
    base.push('/');
    let url = Url::parse(&base)?.join(path.trim_start_matches('/'))?;
    Ok(url.to_string())
}
