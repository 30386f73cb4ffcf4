use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;

/// Error taxonomy for the relay. Validation errors are surfaced as HTTP 400
/// before any upstream call is made; upstream and configuration failures map
/// to HTTP 500 with the raw message. The wire shape is always
/// `{"error": string}` with message strings only, no structured codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// Malformed request input: address, network name, token id, body shape.
    Validation(String),
    /// A collaborator failed: node unreachable, contract call reverted,
    /// metadata host down.
    Upstream(String),
    /// The process is missing or carrying unusable configuration.
    Config(String),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::Validation(msg) | RelayError::Upstream(msg) | RelayError::Config(msg) => {
                f.write_str(msg)
            }
        }
    }
}

impl std::error::Error for RelayError {}

impl ResponseError for RelayError {
    fn status_code(&self) -> StatusCode {
        match self {
            RelayError::Validation(_) => StatusCode::BAD_REQUEST,
            RelayError::Upstream(_) | RelayError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string(),
        }))
    }
}

impl From<anyhow::Error> for RelayError {
    fn from(err: anyhow::Error) -> Self {
        RelayError::Upstream(err.to_string())
    }
}

/// Shorthand for wrapping a collaborator's error into the upstream variant.
pub fn upstream<E: fmt::Display>(err: E) -> RelayError {
    RelayError::Upstream(err.to_string())
}
