//! Request execution and error normalization
//!
//! Every HTTP exchange in this crate funnels through here: send, check the
//! status code, extract the body, and translate any failure into
//! [`SpeechKitError`]. The service's own error bodies are carried along as
//! diagnostics, best effort.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Response};
use tokio_util::sync::CancellationToken;

use crate::config::SpeechKitConfig;
use crate::error::SpeechKitError;

/// Substituted for the body snippet when a failing response's body cannot
/// be read
pub(crate) const BODY_READ_PLACEHOLDER: &str = "<failed to read response body>";

/// Longest body snippet carried inside an error
const MAX_BODY_SNIPPET_LEN: usize = 2048;

/// Build the pooled HTTP client with the configured timeouts
pub(crate) fn build_client(config: &SpeechKitConfig) -> Result<Client, SpeechKitError> {
    Client::builder()
        .timeout(Duration::from_millis(config.timeout_ms))
        .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
        .build()
        .map_err(|e| SpeechKitError::InvalidArgument(format!("failed to build HTTP client: {e}")))
}

/// Execute a request and extract the response body as text
pub(crate) async fn execute_text(request: RequestBuilder) -> Result<String, SpeechKitError> {
    let response = send_checked(request).await?;
    Ok(response.text().await?)
}

/// Execute a request and extract the response body as bytes
pub(crate) async fn execute_bytes(request: RequestBuilder) -> Result<Bytes, SpeechKitError> {
    let response = send_checked(request).await?;
    Ok(response.bytes().await?)
}

/// Send the request and turn any non-success status into an error
async fn send_checked(request: RequestBuilder) -> Result<Response, SpeechKitError> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    // The body read here is diagnostic only and must not mask the status
    // failure.
    let body = match response.text().await {
        Ok(body) => snippet(&body),
        Err(_) => BODY_READ_PLACEHOLDER.to_string(),
    };

    Err(SpeechKitError::ApiStatus {
        status: status.as_u16(),
        body,
    })
}

/// Race a future against caller cancellation
pub(crate) async fn with_cancel<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T, SpeechKitError>>,
) -> Result<T, SpeechKitError> {
    if cancel.is_cancelled() {
        return Err(SpeechKitError::Cancelled);
    }

    tokio::select! {
        () = cancel.cancelled() => Err(SpeechKitError::Cancelled),
        result = fut => result,
    }
}

fn snippet(body: &str) -> String {
    if body.len() <= MAX_BODY_SNIPPET_LEN {
        return body.to_string();
    }

    let mut end = MAX_BODY_SNIPPET_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].to_string()
}
