use std::borrow::Cow;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;

/// A fully read response, as received from the server.
#[derive(Debug, Clone)]
pub struct ApiResponse {
  url: Url,
  status: StatusCode,
  headers: HeaderMap,
  body: Bytes,
}

impl ApiResponse {
  pub fn new(url: Url, status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
    ApiResponse {
      url,
      status,
      headers,
      body,
    }
  }

  pub(crate) async fn read(response: reqwest::Response) -> Result<Self, reqwest::Error> {
    let url = response.url().clone();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?;

    Ok(ApiResponse::new(url, status, headers, body))
  }

  pub fn url(&self) -> &Url {
    &self.url
  }

  pub fn status(&self) -> StatusCode {
    self.status
  }

  pub fn headers(&self) -> &HeaderMap {
    &self.headers
  }

  pub fn body(&self) -> &Bytes {
    &self.body
  }

  pub fn text(&self) -> Cow<'_, str> {
    String::from_utf8_lossy(&self.body)
  }

  pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
    serde_json::from_slice(&self.body)
  }
}
