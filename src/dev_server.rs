use std::path::Path;
use std::sync::Arc;

use actix_web::http::header::ContentType;
use actix_web::{web, App, HttpResponse, HttpServer};
use log::info;
use reqwest::Client;
use thiserror::Error;

use crate::client_config::ClientConfig;
use crate::document::Document;
use crate::proxy_service::proxy_config::ProxyConfig;
use crate::proxy_service::proxy_factory::ForwardingServiceFactory;
use crate::settings::{ProxyRule, SettingsError};

const DEFAULT_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Chatbot</title></head>
<body><div id="app"></div></body>
</html>
"#;

#[derive(Debug, Error)]
pub enum DevServerError {
  #[error(transparent)]
  Settings(#[from] SettingsError),
  #[error("unable to build forwarding client: {0}")]
  Client(#[from] reqwest::Error),
  #[error("unable to read page: {0}")]
  Page(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DevServerConfig {
  pub bind: String,
  pub port: u16,
  pub workers: usize,
  pub page: Option<String>,
  pub proxy_rules: Vec<ProxyRule>,
}

/// Everything a worker needs to serve the page and forward backend calls.
#[derive(Clone)]
pub struct DevServerState {
  page: Arc<Document>,
  proxies: Arc<[Arc<ProxyConfig>]>,
  http_client: Client,
}

impl DevServerState {
  pub fn new(config: &DevServerConfig, client_config: &ClientConfig) -> Result<Self, DevServerError> {
    let page = match &config.page {
      Some(path) => Document::load(Path::new(path))?,
      None => Document::parse(DEFAULT_PAGE),
    };

    let proxies = config
      .proxy_rules
      .iter()
      .map(|rule| ProxyConfig::try_from(rule).map(Arc::new))
      .collect::<Result<Vec<_>, _>>()?;

    Ok(DevServerState {
      page: Arc::new(page),
      proxies: Arc::from(proxies),
      http_client: client_config.to_forwarding_client()?,
    })
  }

  pub fn page(&self) -> Arc<Document> {
    self.page.clone()
  }

  pub fn configure(&self, cfg: &mut web::ServiceConfig) {
    for proxy in self.proxies.iter() {
      cfg.service(
        web::scope(proxy.prefix.as_ref())
          .default_service(ForwardingServiceFactory::new(self.http_client.clone(), proxy.clone())),
      );
    }

    cfg
      .app_data(web::Data::from(self.page.clone()))
      .route("/", web::get().to(index));
  }
}

async fn index(page: web::Data<Document>) -> HttpResponse {
  HttpResponse::Ok()
    .content_type(ContentType::html())
    .body(page.html())
}

pub async fn run(config: DevServerConfig, client_config: &ClientConfig) -> std::io::Result<()> {
  let state = DevServerState::new(&config, client_config)
    .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?;

  for rule in config.proxy_rules.iter() {
    info!("Forwarding '{}' to '{}'.", rule.path, rule.target);
  }
  info!("Dev server listening on {}:{}.", config.bind, config.port);

  HttpServer::new(move || {
    let state = state.clone();
    App::new().configure(move |cfg| state.configure(cfg))
  })
  .workers(config.workers)
  .bind((config.bind.as_str(), config.port))?
  .run()
  .await
}
