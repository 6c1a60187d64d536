use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::redirect::Policy;
use reqwest::Client;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Defaults shared by every outgoing call. Built once, then only read.
#[derive(Clone, Debug)]
pub struct ClientConfig {
  pub base_url: String,
  pub timeout: Duration,
  pub default_headers: HeaderMap,
  pub http_proxy: Option<String>,
  pub user: Option<String>,
  pub pass: Option<String>,
  pub enable_cookies: bool,
}

impl Default for ClientConfig {
  fn default() -> Self {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    ClientConfig {
      base_url: DEFAULT_BASE_URL.into(),
      timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
      default_headers,
      http_proxy: None,
      user: None,
      pass: None,
      enable_cookies: false,
    }
  }
}

impl ClientConfig {
  pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
    self.base_url = base_url.into();
    self
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  /// Client used by [`crate::http_client::HttpClient`]: default headers applied,
  /// redirects followed.
  pub fn to_client(&self) -> Result<Client, reqwest::Error> {
    let client_builder = self
      .base_builder()?
      .default_headers(self.default_headers.clone())
      .redirect(Policy::limited(5));

    client_builder.build()
  }

  /// Client used by the dev server proxy. Requests are forwarded as received,
  /// so no default headers are added and redirects go back to the browser.
  pub fn to_forwarding_client(&self) -> Result<Client, reqwest::Error> {
    self.base_builder()?.redirect(Policy::none()).build()
  }

  fn base_builder(&self) -> Result<reqwest::ClientBuilder, reqwest::Error> {
    let mut client_builder = reqwest::ClientBuilder::new().timeout(self.timeout);

    if let Some(proxy_url) = &self.http_proxy {
      let mut proxy = reqwest::Proxy::all(proxy_url.as_str())?;

      if let (Some(user_name), Some(password)) = (&self.user, &self.pass) {
        proxy = proxy.basic_auth(user_name, password);
      }

      client_builder = client_builder.proxy(proxy);
    }

    if self.enable_cookies {
      client_builder = client_builder.cookie_store(true);
    }

    Ok(client_builder)
  }
}
