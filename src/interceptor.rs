use log::{error, warn};
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::StatusCode;

use crate::credential::CredentialSupplier;
use crate::error::ApiError;
use crate::request::RequestConfig;
use crate::response::ApiResponse;

pub const CSRF_HEADER: &str = "x-csrftoken";

/// Runs before every call is dispatched.
pub trait RequestInterceptor: Send + Sync {
  fn on_request(&self, request: RequestConfig) -> RequestConfig;
}

/// Runs after every call settles. Both hooks pass through by default.
pub trait ResponseInterceptor: Send + Sync {
  fn on_response(&self, response: ApiResponse) -> ApiResponse {
    response
  }

  fn on_error(&self, error: ApiError) -> ApiError {
    error
  }
}

/// Copies the current CSRF token, if there is one, into `X-CSRFToken`.
pub struct CsrfHeaderInterceptor {
  supplier: Box<dyn CredentialSupplier>,
  header: HeaderName,
}

impl CsrfHeaderInterceptor {
  pub fn new(supplier: impl CredentialSupplier + 'static) -> Self {
    CsrfHeaderInterceptor {
      supplier: Box::new(supplier),
      header: HeaderName::from_static(CSRF_HEADER),
    }
  }
}

impl RequestInterceptor for CsrfHeaderInterceptor {
  fn on_request(&self, mut request: RequestConfig) -> RequestConfig {
    let Some(token) = self.supplier.token() else {
      return request;
    };

    match HeaderValue::from_str(&token) {
      Ok(value) => request.set_header(self.header.clone(), value),
      Err(_) => warn!("CSRF token is not a valid header value, sending request without it."),
    }

    request
  }
}

type Report = Box<dyn Fn(&ApiError) + Send + Sync>;

/// Reports rejections with status 403, which the backend answers when the
/// CSRF token is missing or stale. The rejection itself is left untouched.
pub struct ForbiddenLogger {
  report: Report,
}

impl ForbiddenLogger {
  pub fn new() -> Self {
    ForbiddenLogger::with_reporter(|err: &ApiError| {
      let url = err.response().map(|response| response.url().as_str()).unwrap_or_default();
      error!("CSRF token missing or invalid ({})", url);
    })
  }

  pub fn with_reporter<F>(report: F) -> Self
  where
    F: Fn(&ApiError) + Send + Sync + 'static,
  {
    ForbiddenLogger {
      report: Box::new(report),
    }
  }
}

impl Default for ForbiddenLogger {
  fn default() -> Self {
    ForbiddenLogger::new()
  }
}

impl ResponseInterceptor for ForbiddenLogger {
  fn on_error(&self, error: ApiError) -> ApiError {
    if error.status() == Some(StatusCode::FORBIDDEN) {
      (self.report)(&error);
    }

    error
  }
}
