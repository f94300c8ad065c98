//! Response handling shared by both upstream clients.

use serde::de::DeserializeOwned;

use crate::UpstreamError;

/// Classify a transport-level failure from reqwest.
pub fn classify(url: &str, e: reqwest::Error) -> UpstreamError {
    if e.is_timeout() {
        UpstreamError::Timeout {
            url: url.to_string(),
        }
    } else if let Some(status) = e.status() {
        UpstreamError::Transport {
            url: url.to_string(),
            status: status.to_string(),
        }
    } else {
        UpstreamError::Network {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}

/// Reject non-2xx responses, then decode the body as JSON.
pub async fn read_json<T: DeserializeOwned>(
    url: &str,
    resp: reqwest::Response,
) -> Result<T, UpstreamError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(UpstreamError::Transport {
            url: url.to_string(),
            status: status.to_string(),
        });
    }

    let body = resp.text().await.map_err(|e| classify(url, e))?;
    serde_json::from_str(&body)
        .map_err(|e| UpstreamError::protocol(format!("parse JSON from {url}: {e}")))
}
