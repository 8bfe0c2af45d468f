//! Shared HTTP plumbing for the API backends.
//!
//! Maps transport failures and HTTP status codes onto [`BackendError`] so the
//! Retry Executor can tell credential problems from transient ones.

use moa_application::BackendError;
use moa_domain::core::string::truncate;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Longest error body kept in an error message.
const MAX_ERROR_BODY: usize = 300;

/// Send `request`, check the status and decode a JSON body.
///
/// Cancellation drops the in-flight request.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    cancel: &CancellationToken,
) -> Result<T, BackendError> {
    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(BackendError::Cancelled),
        sent = request.send() => sent.map_err(classify_transport)?,
    };

    let status = response.status();
    if !status.is_success() {
        let retry_after = parse_retry_after(response.headers());
        let body = response.text().await.unwrap_or_default();
        return Err(classify_status(status, retry_after, &body));
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(BackendError::Cancelled),
        body = response.json::<T>() => {
            body.map_err(|e| BackendError::Other(format!("failed to parse response: {}", e)))
        }
    }
}

pub(crate) fn classify_transport(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Transport(err.to_string())
    }
}

pub(crate) fn classify_status(
    status: StatusCode,
    retry_after: Option<Duration>,
    body: &str,
) -> BackendError {
    let detail = format!("HTTP {}: {}", status.as_u16(), truncate(body.trim(), MAX_ERROR_BODY));
    match status.as_u16() {
        401 | 403 => BackendError::Unauthorized(detail),
        400 | 404 | 422 => BackendError::InvalidRequest(detail),
        408 => BackendError::Timeout,
        429 => BackendError::RateLimited { retry_after },
        500..=599 => BackendError::Unavailable(detail),
        _ => BackendError::Other(detail),
    }
}

/// `Retry-After` in delta-seconds form; HTTP dates are ignored.
pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
}

/// Validate and normalize a base URL.
pub(crate) fn normalize_base_url(url: &str) -> Result<String, BackendError> {
    let url = url.trim().trim_end_matches('/');
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(BackendError::InvalidConfig(format!(
            "endpoint must start with http:// or https:// (got '{}')",
            url
        )));
    }
    Ok(url.to_string())
}
