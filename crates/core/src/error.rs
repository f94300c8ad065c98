use serde::Serialize;
use thiserror::Error;

/// Failure talking to either upstream service.
///
/// "Nothing found" outcomes (no share key, no quality blocks) are not errors
/// and never show up here.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    /// The upstream answered with a non-success HTTP status.
    #[error("error fetching data from {url}: {status}")]
    Transport { url: String, status: String },

    /// No response arrived within the configured per-request timeout.
    #[error("timed out waiting for {url}")]
    Timeout { url: String },

    /// The request never produced a response (DNS, connect, TLS, reset).
    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },

    /// The upstream answered, but not with the JSON shape we expect.
    #[error("unexpected upstream response: {0}")]
    Protocol(String),
}

impl UpstreamError {
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }
}

/// Unified API error type.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unprocessable upstream response: {0}")]
    Unprocessable(String),

    #[error("bad gateway: {0}")]
    BadGateway(String),

    #[error("gateway timeout: {0}")]
    GatewayTimeout(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Unprocessable(_) => "unprocessable",
            Self::BadGateway(_) => "bad_gateway",
            Self::GatewayTimeout(_) => "gateway_timeout",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::NotFound(_) => 404,
            Self::Unprocessable(_) => 422,
            Self::BadGateway(_) => 502,
            Self::GatewayTimeout(_) => 504,
        }
    }
}

impl From<UpstreamError> for ApiError {
    fn from(e: UpstreamError) -> Self {
        let msg = e.to_string();
        match e {
            UpstreamError::Transport { .. } | UpstreamError::Network { .. } => {
                Self::BadGateway(msg)
            }
            UpstreamError::Timeout { .. } => Self::GatewayTimeout(msg),
            UpstreamError::Protocol(_) => Self::Unprocessable(msg),
        }
    }
}

/// JSON error envelope: `{ "error": { "code": "…", "message": "…", "details": {} } }`
#[derive(Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub details: serde_json::Value,
}

impl From<&ApiError> for ErrorEnvelope {
    fn from(e: &ApiError) -> Self {
        Self {
            error: ErrorBody {
                code: e.code().to_string(),
                message: e.to_string(),
                details: serde_json::Value::Object(serde_json::Map::new()),
            },
        }
    }
}
