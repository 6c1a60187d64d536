use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use futures_core::future::LocalBoxFuture;
use reqwest::Client;

use crate::proxy_service::proxy_config::ProxyConfig;
use crate::proxy_service::proxy_route_service::ForwardingService;

/// Builds one [`ForwardingService`] per worker for a single proxy rule.
#[derive(Clone)]
pub struct ForwardingServiceFactory {
  config: Arc<ProxyConfig>,
  http_client: Client,
}

impl ForwardingServiceFactory {
  pub fn new(http_client: Client, config: Arc<ProxyConfig>) -> Self {
    Self { config, http_client }
  }
}

impl ServiceFactory<ServiceRequest> for ForwardingServiceFactory {
  type Response = ServiceResponse;
  type Error = actix_web::Error;
  type Config = ();
  type Service = ForwardingService;
  type InitError = ();
  type Future = LocalBoxFuture<'static, Result<Self::Service, Self::InitError>>;

  fn new_service(&self, _: Self::Config) -> Self::Future {
    let service = ForwardingService {
      config: self.config.clone(),
      http_client: self.http_client.clone(),
    };

    Box::pin(async move { Ok(service) })
  }
}
