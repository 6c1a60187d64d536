use bytes::Bytes;
use log::warn;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;

use crate::error::ApiError;
use crate::settings::HttpMethod;

type KeyValue<'a> = (&'a str, &'a str);

/// Per-call request description. Interceptors receive it by value and hand
/// it back, possibly changed, before it is dispatched.
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
  method: HttpMethod,
  url: String,
  headers: HeaderMap,
  query_params: Vec<(String, String)>,
  body: Option<Bytes>,
}

impl RequestConfig {
  pub fn new(method: HttpMethod, url: &str) -> RequestConfig {
    RequestConfig {
      method,
      url: String::from(url),
      ..RequestConfig::default()
    }
  }

  pub fn get(url: &str) -> RequestConfig {
    RequestConfig::new(HttpMethod::Get, url)
  }

  pub fn post(url: &str) -> RequestConfig {
    RequestConfig::new(HttpMethod::Post, url)
  }

  pub fn put(url: &str) -> RequestConfig {
    RequestConfig::new(HttpMethod::Put, url)
  }

  pub fn patch(url: &str) -> RequestConfig {
    RequestConfig::new(HttpMethod::Patch, url)
  }

  pub fn delete(url: &str) -> RequestConfig {
    RequestConfig::new(HttpMethod::Delete, url)
  }

  /// Adds headers, replacing earlier values of the same name. Pairs that are
  /// not valid header names or values are dropped.
  pub fn set_headers<'a, I>(mut self, headers: I) -> Self
  where
    I: IntoIterator<Item = KeyValue<'a>>,
  {
    for (key, value) in headers {
      match (HeaderName::try_from(key), HeaderValue::try_from(value)) {
        (Ok(name), Ok(value)) => {
          self.headers.insert(name, value);
        }
        _ => warn!("Skipping invalid header '{}'.", key),
      }
    }

    self
  }

  pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
    self.headers.insert(name, value);
  }

  pub fn set_query<'a, I>(mut self, query: I) -> Self
  where
    I: IntoIterator<Item = KeyValue<'a>>,
  {
    self.query_params.extend(
      query
        .into_iter()
        .map(|(key, value)| (String::from(key), String::from(value))),
    );
    self
  }

  pub fn set_body(mut self, body: impl Into<Bytes>) -> Self {
    self.body = Some(body.into());
    self
  }

  pub fn set_json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self, ApiError> {
    let encoded = serde_json::to_vec(value)?;
    Ok(self.set_body(encoded))
  }

  pub fn method(&self) -> HttpMethod {
    self.method
  }

  pub fn url(&self) -> &str {
    &self.url
  }

  pub fn headers(&self) -> &HeaderMap {
    &self.headers
  }

  pub fn headers_mut(&mut self) -> &mut HeaderMap {
    &mut self.headers
  }

  pub fn query_params(&self) -> &[(String, String)] {
    &self.query_params
  }

  pub fn body(&self) -> Option<&Bytes> {
    self.body.as_ref()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn header_names_stay_unique() {
    let request = RequestConfig::get("/chatbot/api/faqs/")
      .set_headers([("X-Trace", "one"), ("x-trace", "two"), ("bad header", "x")]);

    assert_eq!(request.headers().len(), 1);
    assert_eq!(request.headers()["x-trace"], "two");
  }

  #[test]
  fn json_body_is_encoded() {
    let request = RequestConfig::post("/chatbot/api/chat/")
      .set_json(&serde_json::json!({ "action": "start_session" }))
      .unwrap();

    assert_eq!(request.method(), HttpMethod::Post);
    assert_eq!(
      request.body().unwrap().as_ref(),
      br#"{"action":"start_session"}"#
    );
  }
}
