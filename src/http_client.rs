use std::sync::Arc;

use log::debug;
use reqwest::{Client, Url};
use serde::Serialize;

use crate::client_config::ClientConfig;
use crate::credential::CredentialSupplier;
use crate::error::ApiError;
use crate::interceptor::{CsrfHeaderInterceptor, ForbiddenLogger, RequestInterceptor, ResponseInterceptor};
use crate::request::RequestConfig;
use crate::response::ApiResponse;

pub struct HttpClientBuilder {
  config: ClientConfig,
  request_interceptors: Vec<Arc<dyn RequestInterceptor>>,
  response_interceptors: Vec<Arc<dyn ResponseInterceptor>>,
}

impl HttpClientBuilder {
  pub fn request_interceptor(mut self, interceptor: impl RequestInterceptor + 'static) -> Self {
    self.request_interceptors.push(Arc::new(interceptor));
    self
  }

  pub fn response_interceptor(mut self, interceptor: impl ResponseInterceptor + 'static) -> Self {
    self.response_interceptors.push(Arc::new(interceptor));
    self
  }

  pub fn build(self) -> Result<HttpClient, ApiError> {
    let HttpClientBuilder {
      config,
      request_interceptors,
      response_interceptors,
    } = self;

    Url::parse(&config.base_url).map_err(|_| ApiError::InvalidUrl(config.base_url.clone()))?;
    let client = config.to_client().map_err(ApiError::Network)?;

    Ok(HttpClient {
      config: Arc::new(config),
      client,
      request_interceptors: Arc::from(request_interceptors),
      response_interceptors: Arc::from(response_interceptors),
    })
  }
}

/// Client every part of the application shares. Interceptors run in
/// registration order: request interceptors before dispatch, response
/// interceptors once the call has settled.
#[derive(Clone)]
pub struct HttpClient {
  config: Arc<ClientConfig>,
  client: Client,
  request_interceptors: Arc<[Arc<dyn RequestInterceptor>]>,
  response_interceptors: Arc<[Arc<dyn ResponseInterceptor>]>,
}

impl HttpClient {
  pub fn builder(config: ClientConfig) -> HttpClientBuilder {
    HttpClientBuilder {
      config,
      request_interceptors: Vec::new(),
      response_interceptors: Vec::new(),
    }
  }

  /// The standard wiring: CSRF header from `supplier`, 403 rejections logged.
  pub fn configure(config: ClientConfig, supplier: impl CredentialSupplier + 'static) -> Result<HttpClient, ApiError> {
    HttpClient::builder(config)
      .request_interceptor(CsrfHeaderInterceptor::new(supplier))
      .response_interceptor(ForbiddenLogger::new())
      .build()
  }

  pub fn config(&self) -> &ClientConfig {
    &self.config
  }

  /// Absolute URLs are used as given; anything else is appended to the base URL.
  pub fn resolve_url(&self, url: &str) -> Result<Url, ApiError> {
    let full_url = if is_absolute_url(url) {
      url.to_string()
    } else if url.starts_with("//") {
      // Protocol-relative: same scheme as the base.
      let scheme = self.config.base_url.split_once("://").map(|(scheme, _)| scheme).unwrap_or("http");
      format!("{}:{}", scheme, url)
    } else {
      combine_url(&self.config.base_url, url)
    };

    Url::parse(&full_url).map_err(|_| ApiError::InvalidUrl(full_url))
  }

  pub async fn send(&self, request: RequestConfig) -> Result<ApiResponse, ApiError> {
    let request = self
      .request_interceptors
      .iter()
      .fold(request, |request, interceptor| interceptor.on_request(request));

    match self.dispatch(request).await {
      Ok(response) => Ok(
        self
          .response_interceptors
          .iter()
          .fold(response, |response, interceptor| interceptor.on_response(response)),
      ),
      Err(error) => Err(
        self
          .response_interceptors
          .iter()
          .fold(error, |error, interceptor| interceptor.on_error(error)),
      ),
    }
  }

  pub async fn get(&self, url: &str) -> Result<ApiResponse, ApiError> {
    self.send(RequestConfig::get(url)).await
  }

  pub async fn delete(&self, url: &str) -> Result<ApiResponse, ApiError> {
    self.send(RequestConfig::delete(url)).await
  }

  pub async fn post_json<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<ApiResponse, ApiError> {
    self.send(RequestConfig::post(url).set_json(body)?).await
  }

  pub async fn put_json<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<ApiResponse, ApiError> {
    self.send(RequestConfig::put(url).set_json(body)?).await
  }

  pub async fn patch_json<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<ApiResponse, ApiError> {
    self.send(RequestConfig::patch(url).set_json(body)?).await
  }

  async fn dispatch(&self, request: RequestConfig) -> Result<ApiResponse, ApiError> {
    let url = self.resolve_url(request.url())?;
    let mut builder = self.client.request(request.method().into(), url.clone());

    if !request.query_params().is_empty() {
      builder = builder.query(request.query_params());
    }

    builder = builder.headers(request.headers().clone());

    if let Some(body) = request.body() {
      builder = builder.body(body.clone());
    }

    debug!("Sending {} {}", request.method(), url);

    let response = builder
      .send()
      .await
      .map_err(|err| self.transport_error(err, &url))?;

    let response = ApiResponse::read(response)
      .await
      .map_err(|err| self.transport_error(err, &url))?;

    debug!("{} {} answered {}", request.method(), url, response.status());

    if response.status().is_success() {
      Ok(response)
    } else {
      Err(ApiError::Status(response))
    }
  }

  fn transport_error(&self, err: reqwest::Error, url: &Url) -> ApiError {
    if err.is_timeout() {
      ApiError::Timeout {
        url: url.to_string(),
        timeout_ms: self.config.timeout.as_millis(),
      }
    } else {
      ApiError::Network(err)
    }
  }
}

fn is_absolute_url(url: &str) -> bool {
  match url.split_once("://") {
    Some((scheme, _)) => {
      let mut chars = scheme.chars();
      chars.next().is_some_and(|first| first.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    }
    None => false,
  }
}

fn combine_url(base_url: &str, url: &str) -> String {
  if url.is_empty() {
    return base_url.to_string();
  }

  format!("{}/{}", base_url.trim_end_matches('/'), url.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn client(base_url: &str) -> HttpClient {
    HttpClient::builder(ClientConfig::default().with_base_url(base_url))
      .build()
      .unwrap()
  }

  #[test]
  fn relative_paths_join_the_base() {
    let client = client("http://localhost:8000");

    assert_eq!(
      client.resolve_url("/chatbot/api/chat/").unwrap().as_str(),
      "http://localhost:8000/chatbot/api/chat/"
    );
    assert_eq!(
      client.resolve_url("chatbot/api/faqs/").unwrap().as_str(),
      "http://localhost:8000/chatbot/api/faqs/"
    );
    assert_eq!(client.resolve_url("").unwrap().as_str(), "http://localhost:8000/");
  }

  #[test]
  fn base_path_is_kept() {
    let client = client("http://localhost:8000/backend/");

    assert_eq!(
      client.resolve_url("/chatbot/").unwrap().as_str(),
      "http://localhost:8000/backend/chatbot/"
    );
  }

  #[test]
  fn absolute_urls_bypass_the_base() {
    let client = client("http://localhost:8000");

    assert_eq!(
      client.resolve_url("https://cdn.example.com/faq.json").unwrap().as_str(),
      "https://cdn.example.com/faq.json"
    );
    assert!(is_absolute_url("git+ssh://host/repo"));
    assert!(!is_absolute_url("/path?next=http://x"));
  }

  #[test]
  fn protocol_relative_urls_take_the_base_scheme() {
    assert_eq!(
      client("http://localhost:8000").resolve_url("//cdn.example.com/a").unwrap().as_str(),
      "http://cdn.example.com/a"
    );
    assert_eq!(
      client("https://backend.example.com").resolve_url("//cdn.example.com/a").unwrap().as_str(),
      "https://cdn.example.com/a"
    );
  }

  #[test]
  fn invalid_base_url_is_rejected() {
    let result = HttpClient::builder(ClientConfig::default().with_base_url("not a url")).build();

    assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
  }
}
