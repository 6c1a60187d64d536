use reqwest::StatusCode;
use thiserror::Error;

use crate::response::ApiResponse;

/// Why a call did not produce a successful response.
#[derive(Debug, Error)]
pub enum ApiError {
  /// The server answered outside the 2xx range. The full response is kept.
  #[error("request failed with status {}", .0.status())]
  Status(ApiResponse),
  #[error("request to '{url}' timed out after {timeout_ms} ms")]
  Timeout { url: String, timeout_ms: u128 },
  #[error("network error: {0}")]
  Network(#[source] reqwest::Error),
  #[error("invalid url '{0}'")]
  InvalidUrl(String),
  #[error("invalid header '{name}': {reason}")]
  InvalidHeader { name: String, reason: String },
  #[error("unable to encode body: {0}")]
  Body(#[from] serde_json::Error),
}

impl ApiError {
  pub fn status(&self) -> Option<StatusCode> {
    self.response().map(|response| response.status())
  }

  pub fn response(&self) -> Option<&ApiResponse> {
    match self {
      ApiError::Status(response) => Some(response),
      _ => None,
    }
  }

  pub fn is_timeout(&self) -> bool {
    matches!(self, ApiError::Timeout { .. })
  }
}
