use std::sync::Arc;
use actix_web::{dev, HttpRequest, HttpResponse, ResponseError};
use actix_web::body::BoxBody;
use actix_web::dev::{Payload, Service, ServiceRequest, ServiceResponse};
use actix_web::http::header::{self, HeaderName};
use futures_core::future::LocalBoxFuture;
use futures_core::Stream;
use futures_util::StreamExt;
use log::{debug, error};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response};
use crate::proxy_service::proxy_config::ProxyConfig;

/// Headers that describe a single connection and are never forwarded.
/// Content length is recomputed for the buffered body.
fn is_hop_by_hop(name: &HeaderName) -> bool {
  matches!(
    name.as_str(),
    "connection"
      | "keep-alive"
      | "proxy-authenticate"
      | "proxy-authorization"
      | "te"
      | "trailer"
      | "transfer-encoding"
      | "upgrade"
      | "content-length"
  )
}

/// Forwards every request under one prefix to its upstream target.
pub struct ForwardingService {
  pub(super) config: Arc<ProxyConfig>,
  pub(super) http_client: Client,
}

impl Service<ServiceRequest> for ForwardingService {
  type Response = ServiceResponse;
  type Error = actix_web::Error;
  type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

  dev::always_ready!();

  fn call(&self, req: ServiceRequest) -> Self::Future {
    let (http_request, payload) = req.into_parts();
    let proxy_request = self.init_request(&http_request);

    Box::pin(ForwardingService::exec(proxy_request, http_request, payload))
  }
}

impl ForwardingService {
  async fn exec(builder: RequestBuilder, http: HttpRequest, mut payload: Payload) -> Result<ServiceResponse, actix_web::Error> {
    let proxy_response = {
      let (size, _) = payload.size_hint();
      let mut body_buffer: Vec<u8> = Vec::with_capacity(size);

      while let Some(chunk) = payload.next().await {
        match chunk {
          Ok(bytes) => {
            body_buffer.extend_from_slice(&bytes);
          }
          Err(err) => {
            let error_response = err.error_response();
            return Ok(ServiceResponse::new(http, error_response));
          }
        }
      }

      builder.body(body_buffer).send().await
    };

    debug!("Proxy response {:?}", &proxy_response);

    match proxy_response {
      Ok(data) => {
        let response = ForwardingService::map_response_head(&data);

        match data.bytes().await {
          Ok(bytes) => {
            Ok(ServiceResponse::new(http, response.set_body(BoxBody::new(bytes))))
          }
          Err(err) => {
            error!("Reading upstream body failed {}", err);
            let response = HttpResponse::BadGateway().body("");
            Ok(ServiceResponse::new(http, response))
          }
        }
      }
      Err(err) => {
        error!("Proxy request to {} failed {}", http.path(), err);
        let response = HttpResponse::BadGateway().body("");
        Ok(ServiceResponse::new(http, response))
      }
    }
  }

  fn init_request(&self, source_request: &HttpRequest) -> RequestBuilder {
    let url = self.config.upstream_url(source_request.path(), source_request.query_string());
    let builder = self.http_client.request(source_request.method().clone(), url);

    let mut header_map = HeaderMap::new();
    for (name, value) in source_request.headers() {
      if is_hop_by_hop(name) {
        continue;
      }

      if *name == header::HOST && self.config.change_origin {
        continue;
      }

      header_map.append(name.clone(), value.clone());
    }

    if self.config.change_origin {
      if let Ok(host) = HeaderValue::from_str(&self.config.target_authority()) {
        header_map.insert(header::HOST, host);
      }
    }

    builder.headers(header_map)
  }

  fn map_response_head(response: &Response) -> HttpResponse {
    let mut http_response = HttpResponse::new(response.status());
    let headers = http_response.headers_mut();

    for (name, value) in response.headers() {
      if is_hop_by_hop(name) {
        continue;
      }

      headers.append(name.clone(), value.clone());
    }

    http_response
  }
}
