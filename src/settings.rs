use std::fmt::{Display, Formatter};
use std::fs::File;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client_config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_MS};
use crate::dev_server::DevServerConfig;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_WORKER_COUNT: usize = 4;
const DEFAULT_BIND: &str = "127.0.0.1";
const DEFAULT_PROXY_PREFIX: &str = "/chatbot";

#[derive(Debug, Error)]
pub enum SettingsError {
  #[error("unable to read settings: {0}")]
  Io(#[from] std::io::Error),
  #[error("malformed settings file: {0}")]
  Yaml(#[from] serde_yaml::Error),
  #[error("invalid header '{name}': {reason}")]
  InvalidHeader { name: String, reason: String },
  #[error("invalid value '{value}' for '{key}'")]
  InvalidValue { key: &'static str, value: String },
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Copy, Hash, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
  #[default]
  Get,
  Post,
  Put,
  Delete,
  Head,
  Patch,
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct NameValuePair {
  pub name: String,
  pub value: String,
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
#[serde(default)]
pub struct ClientSection {
  pub base_url: Option<String>,
  pub timeout_ms: Option<u64>,
  pub headers: Option<Vec<NameValuePair>>,
  pub http_proxy: Option<String>,
  pub proxy_user: Option<String>,
  pub proxy_pass: Option<String>,
  pub enable_cookies: Option<bool>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct ProxyRule {
  pub path: String,
  pub target: String,
  #[serde(default)]
  pub change_origin: bool,
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
#[serde(default)]
pub struct DevServerSection {
  pub bind: Option<String>,
  pub port: Option<u16>,
  pub workers: Option<usize>,
  pub page: Option<String>,
  pub proxy: Option<Vec<ProxyRule>>,
}

/// Contents of the YAML settings file. Every field may be omitted.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
#[serde(default)]
pub struct Settings {
  pub client: ClientSection,
  pub dev_server: DevServerSection,
}

impl Settings {
  pub fn load_from_file(file: &File) -> Result<Settings, SettingsError> {
    let settings: Settings = serde_yaml::from_reader(file)?;

    Ok(settings)
  }

  pub fn from_yaml(source: &str) -> Result<Settings, SettingsError> {
    let settings: Settings = serde_yaml::from_str(source)?;

    Ok(settings)
  }

  /// Overlays environment variables on top of the file values. `lookup` is
  /// usually `|key| std::env::var(key).ok()`. Unparsable numbers are ignored.
  pub fn apply_env<F>(mut self, lookup: F) -> Self
  where
    F: Fn(&str) -> Option<String>,
  {
    if let Some(base_url) = lookup("CHATBOT_BASE_URL") {
      self.client.base_url = Some(base_url);
    }

    if let Some(timeout) = lookup("CHATBOT_TIMEOUT_MS").and_then(|e| e.parse::<u64>().ok()) {
      self.client.timeout_ms = Some(timeout);
    }

    if let Some(proxy_url) = lookup("HTTP_PROXY_URL") {
      self.client.http_proxy = Some(proxy_url);
    }

    if let Some(user) = lookup("HTTP_PROXY_USER") {
      self.client.proxy_user = Some(user);
    }

    if let Some(pass) = lookup("HTTP_PROXY_PASS") {
      self.client.proxy_pass = Some(pass);
    }

    if let Some(cookies) = lookup("HTTP_PROXY_COOKIES").and_then(|e| e.parse::<bool>().ok()) {
      self.client.enable_cookies = Some(cookies);
    }

    if let Some(bind) = lookup("HTTP_BIND") {
      self.dev_server.bind = Some(bind);
    }

    if let Some(port) = lookup("HTTP_PORT").and_then(|e| e.parse::<u16>().ok()) {
      self.dev_server.port = Some(port);
    }

    if let Some(workers) = lookup("HTTP_WORKER_COUNT").and_then(|e| e.parse::<usize>().ok()) {
      self.dev_server.workers = Some(workers);
    }

    self
  }

  pub fn client_config(&self) -> Result<ClientConfig, SettingsError> {
    let defaults = ClientConfig::default();
    let ClientSection {
      base_url,
      timeout_ms,
      headers,
      http_proxy,
      proxy_user,
      proxy_pass,
      enable_cookies,
    } = self.client.clone();

    let mut default_headers = defaults.default_headers;
    if let Some(pairs) = headers {
      let extra = to_header_map(&pairs)?;
      for (name, value) in extra.iter() {
        default_headers.insert(name.clone(), value.clone());
      }
    }

    Ok(ClientConfig {
      base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.into()),
      timeout: Duration::from_millis(timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)),
      default_headers,
      http_proxy,
      user: proxy_user,
      pass: proxy_pass,
      enable_cookies: enable_cookies.unwrap_or(defaults.enable_cookies),
    })
  }

  pub fn dev_server_config(&self) -> DevServerConfig {
    let DevServerSection {
      bind,
      port,
      workers,
      page,
      proxy,
    } = self.dev_server.clone();

    // Without an explicit rule list the backend is reachable under /chatbot.
    let proxy_rules = proxy.unwrap_or_else(|| {
      let target = self
        .client
        .base_url
        .clone()
        .unwrap_or_else(|| DEFAULT_BASE_URL.into());

      vec![ProxyRule {
        path: DEFAULT_PROXY_PREFIX.into(),
        target,
        change_origin: true,
      }]
    });

    DevServerConfig {
      bind: bind.unwrap_or_else(|| DEFAULT_BIND.into()),
      port: port.unwrap_or(DEFAULT_PORT),
      workers: workers.unwrap_or(DEFAULT_WORKER_COUNT),
      page,
      proxy_rules,
    }
  }
}

fn to_header_map(pairs: &[NameValuePair]) -> Result<HeaderMap, SettingsError> {
  let mut header_map = HeaderMap::new();

  for pair in pairs {
    let name = HeaderName::try_from(pair.name.as_str()).map_err(|e| SettingsError::InvalidHeader {
      name: pair.name.clone(),
      reason: e.to_string(),
    })?;

    let value = HeaderValue::try_from(pair.value.as_str()).map_err(|e| SettingsError::InvalidHeader {
      name: pair.name.clone(),
      reason: e.to_string(),
    })?;

    header_map.insert(name, value);
  }

  Ok(header_map)
}

impl TryFrom<&str> for HttpMethod {
  type Error = SettingsError;

  fn try_from(value: &str) -> Result<Self, Self::Error> {
    match value.to_lowercase().as_str() {
      "get" => Ok(HttpMethod::Get),
      "post" => Ok(HttpMethod::Post),
      "patch" => Ok(HttpMethod::Patch),
      "put" => Ok(HttpMethod::Put),
      "head" => Ok(HttpMethod::Head),
      "delete" => Ok(HttpMethod::Delete),
      _ => Err(SettingsError::InvalidValue {
        key: "method",
        value: value.into(),
      }),
    }
  }
}

impl From<HttpMethod> for reqwest::Method {
  fn from(method: HttpMethod) -> Self {
    match method {
      HttpMethod::Get => reqwest::Method::GET,
      HttpMethod::Post => reqwest::Method::POST,
      HttpMethod::Put => reqwest::Method::PUT,
      HttpMethod::Delete => reqwest::Method::DELETE,
      HttpMethod::Head => reqwest::Method::HEAD,
      HttpMethod::Patch => reqwest::Method::PATCH,
    }
  }
}

impl Display for HttpMethod {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      HttpMethod::Get => f.write_str("get"),
      HttpMethod::Post => f.write_str("post"),
      HttpMethod::Put => f.write_str("put"),
      HttpMethod::Delete => f.write_str("delete"),
      HttpMethod::Head => f.write_str("head"),
      HttpMethod::Patch => f.write_str("patch"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use reqwest::header::CONTENT_TYPE;
  use std::collections::HashMap;

  #[test]
  fn empty_file_yields_defaults() {
    let settings = Settings::from_yaml("{}").unwrap();
    let client = settings.client_config().unwrap();

    assert_eq!(client.base_url, "http://localhost:8000");
    assert_eq!(client.timeout, Duration::from_millis(10_000));
    assert_eq!(client.default_headers[CONTENT_TYPE], "application/json");

    let server = settings.dev_server_config();
    assert_eq!(server.port, 8080);
    assert_eq!(server.proxy_rules.len(), 1);
    assert_eq!(server.proxy_rules[0].path, "/chatbot");
    assert_eq!(server.proxy_rules[0].target, "http://localhost:8000");
    assert!(server.proxy_rules[0].change_origin);
  }

  #[test]
  fn file_values_are_read() {
    let yaml = r#"
client:
  base_url: http://backend:9000
  timeout_ms: 2500
  headers:
    - name: x-client
      value: chatbot
dev_server:
  port: 3000
  proxy:
    - path: /api
      target: http://backend:9000
"#;
    let settings = Settings::from_yaml(yaml).unwrap();
    let client = settings.client_config().unwrap();

    assert_eq!(client.base_url, "http://backend:9000");
    assert_eq!(client.timeout, Duration::from_millis(2500));
    assert_eq!(client.default_headers["x-client"], "chatbot");
    assert_eq!(client.default_headers[CONTENT_TYPE], "application/json");

    let server = settings.dev_server_config();
    assert_eq!(server.port, 3000);
    assert_eq!(server.proxy_rules[0].path, "/api");
    assert!(!server.proxy_rules[0].change_origin);
  }

  #[test]
  fn env_overrides_file_and_ignores_garbage() {
    let env: HashMap<&str, &str> = HashMap::from([
      ("CHATBOT_BASE_URL", "http://django:8000"),
      ("CHATBOT_TIMEOUT_MS", "not-a-number"),
      ("HTTP_PORT", "9090"),
    ]);
    let settings = Settings::from_yaml("client:\n  timeout_ms: 500\n")
      .unwrap()
      .apply_env(|key| env.get(key).map(|v| v.to_string()));

    let client = settings.client_config().unwrap();
    assert_eq!(client.base_url, "http://django:8000");
    assert_eq!(client.timeout, Duration::from_millis(500));
    assert_eq!(settings.dev_server_config().port, 9090);
  }

  #[test]
  fn invalid_header_is_rejected() {
    let yaml = "client:\n  headers:\n    - name: \"bad header\"\n      value: x\n";
    let settings = Settings::from_yaml(yaml).unwrap();

    assert!(matches!(
      settings.client_config(),
      Err(SettingsError::InvalidHeader { .. })
    ));
  }

  #[test]
  fn method_parsing_is_case_insensitive() {
    assert_eq!(HttpMethod::try_from("POST").unwrap(), HttpMethod::Post);
    assert!(HttpMethod::try_from("trace").is_err());
    assert_eq!(HttpMethod::Patch.to_string(), "patch");
  }
}
