pub mod app;
pub mod chatbot_api;
pub mod client_config;
pub mod credential;
pub mod dev_server;
pub mod document;
pub mod error;
pub mod http_client;
pub mod interceptor;
pub mod proxy_service;
pub mod request;
pub mod response;
pub mod settings;
pub mod std_logger;

pub use app::{App, AppContext, Component, MountError, MountedApp};
pub use client_config::ClientConfig;
pub use credential::{CredentialSupplier, DocumentTokenSupplier};
pub use document::Document;
pub use error::ApiError;
pub use http_client::{HttpClient, HttpClientBuilder};
pub use interceptor::{CsrfHeaderInterceptor, ForbiddenLogger, RequestInterceptor, ResponseInterceptor};
pub use request::RequestConfig;
pub use response::ApiResponse;
pub use settings::{HttpMethod, Settings};
