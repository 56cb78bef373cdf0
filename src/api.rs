//! HTTP helpers for the portal's JSON API with one shared client, a uniform
//! timeout policy, and consistent error mapping. Flow code goes through these
//! helpers so request setup is never duplicated. The helpers hold no token
//! state; callers pass the bearer token explicitly.

use crate::config::PortalConfig;
use crate::errors::AuthError;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, info_span, Instrument};
use url::Url;

/// Maximum number of rejection-reason characters surfaced to the caller.
const MAX_REASON_CHARS: usize = 200;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP plumbing for all auth endpoints.
pub(crate) struct Http {
    client: reqwest::Client,
    base_url: String,
}

impl Http {
    pub(crate) fn new(config: &PortalConfig) -> Result<Self, AuthError> {
        let base_url = Url::parse(&config.api_base_url)
            .map_err(|err| AuthError::Validation(format!("Invalid API base URL: {err}")))?;

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|err| AuthError::Network(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    /// Posts JSON and expects a body-less (or ignorable) 2xx.
    pub(crate) async fn post_json<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> Result<(), AuthError> {
        let response = self.send(path, body, bearer).await?;
        handle_empty_response(response).await
    }

    /// Posts JSON and parses a JSON 2xx body.
    pub(crate) async fn post_json_response<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> Result<T, AuthError> {
        let response = self.send(path, body, bearer).await?;
        handle_json_response(response).await
    }

    async fn send<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> Result<reqwest::Response, AuthError> {
        let url = join_url(&self.base_url, path);

        let mut request = self.client.post(&url).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let span = info_span!("portal.api", http.method = "POST", url = %url);
        request.send().instrument(span).await.map_err(map_request_error)
    }
}

/// Builds an endpoint URL from the configured base and the provided path.
fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Maps transport failures onto the error taxonomy, keeping timeouts distinct.
fn map_request_error(err: reqwest::Error) -> AuthError {
    if err.is_timeout() {
        AuthError::Timeout
    } else {
        debug!("transport error: {err}");
        AuthError::Network(err.without_url().to_string())
    }
}

async fn handle_empty_response(response: reqwest::Response) -> Result<(), AuthError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(AuthError::Rejected {
            status: status.as_u16(),
            reason: rejection_reason(response).await,
        })
    }
}

async fn handle_json_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, AuthError> {
    let status = response.status();
    if status.is_success() {
        response
            .json::<T>()
            .await
            .map_err(|err| AuthError::Network(format!("malformed response body: {err}")))
    } else {
        Err(AuthError::Rejected {
            status: status.as_u16(),
            reason: rejection_reason(response).await,
        })
    }
}

async fn rejection_reason(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    extract_reason(&body)
}

/// Pulls the human-readable reason out of a rejection body. The backend sends
/// `{"detail": …}`; anything else is surfaced as raw text, length-capped.
fn extract_reason(body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("detail").and_then(Value::as_str).map(str::to_string));

    sanitize_reason(&detail.unwrap_or_else(|| body.to_string()))
}

fn sanitize_reason(reason: &str) -> String {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_REASON_CHARS).collect()
    }
}
