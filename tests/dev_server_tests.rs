//! Dev server: page serving and backend forwarding.

use std::io::Write;

use actix_web::http::StatusCode;
use actix_web::{test, App};
use chatbot_client::dev_server::{DevServerConfig, DevServerState};
use chatbot_client::settings::ProxyRule;
use chatbot_client::ClientConfig;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(target: &str, change_origin: bool, page: Option<String>) -> DevServerConfig {
  DevServerConfig {
    bind: "127.0.0.1".into(),
    port: 0,
    workers: 1,
    page,
    proxy_rules: vec![ProxyRule {
      path: "/chatbot".into(),
      target: target.into(),
      change_origin,
    }],
  }
}

#[actix_web::test]
async fn test_page_is_served_at_root() {
  let state = DevServerState::new(&config("http://localhost:8000", true, None), &ClientConfig::default()).unwrap();
  let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

  let response = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
  assert_eq!(response.status(), StatusCode::OK);

  let body = test::read_body(response).await;
  assert!(String::from_utf8_lossy(&body).contains(r#"<div id="app">"#));
}

#[actix_web::test]
async fn test_page_file_is_used() {
  let mut file = tempfile::NamedTempFile::new().unwrap();
  write!(file, r#"<input name="csrfmiddlewaretoken" value="abc123"><div id="app"></div>"#).unwrap();
  let page = Some(file.path().to_string_lossy().to_string());

  let state = DevServerState::new(&config("http://localhost:8000", true, page), &ClientConfig::default()).unwrap();

  assert_eq!(
    state.page().attribute("[name=csrfmiddlewaretoken]", "value"),
    Some("abc123".into())
  );
}

#[actix_web::test]
async fn test_prefixed_requests_are_forwarded() {
  let mock_server = MockServer::start().await;
  let authority = mock_server.address().to_string();

  Mock::given(method("POST"))
    .and(path("/chatbot/api/chat/"))
    .and(query_param("lang", "en"))
    .and(header("host", authority.as_str()))
    .and(header("x-csrftoken", "abc123"))
    .and(body_json(json!({ "action": "start_session" })))
    .respond_with(
      ResponseTemplate::new(201)
        .insert_header("x-backend", "django")
        .set_body_json(json!({ "session_id": "s-1" })),
    )
    .expect(1)
    .mount(&mock_server)
    .await;

  let state = DevServerState::new(&config(&mock_server.uri(), true, None), &ClientConfig::default()).unwrap();
  let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

  let request = test::TestRequest::post()
    .uri("/chatbot/api/chat/?lang=en")
    .insert_header(("host", "localhost:8080"))
    .insert_header(("x-csrftoken", "abc123"))
    .set_json(json!({ "action": "start_session" }))
    .to_request();
  let response = test::call_service(&app, request).await;

  assert_eq!(response.status(), StatusCode::CREATED);
  assert_eq!(response.headers().get("x-backend").unwrap(), "django");

  let body: serde_json::Value = test::read_body_json(response).await;
  assert_eq!(body["session_id"], "s-1");
}

#[actix_web::test]
async fn test_upstream_errors_are_relayed() {
  let mock_server = MockServer::start().await;

  Mock::given(method("GET"))
    .and(path("/chatbot/api/faqs/"))
    .respond_with(ResponseTemplate::new(403))
    .mount(&mock_server)
    .await;

  let state = DevServerState::new(&config(&mock_server.uri(), false, None), &ClientConfig::default()).unwrap();
  let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

  let response = test::call_service(&app, test::TestRequest::get().uri("/chatbot/api/faqs/").to_request()).await;

  assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_unreachable_backend_is_bad_gateway() {
  let state = DevServerState::new(&config("http://127.0.0.1:1", true, None), &ClientConfig::default()).unwrap();
  let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

  let response = test::call_service(&app, test::TestRequest::get().uri("/chatbot/api/faqs/").to_request()).await;

  assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[actix_web::test]
async fn test_invalid_rule_is_rejected() {
  let result = DevServerState::new(&config("not a url", true, None), &ClientConfig::default());

  assert!(result.is_err());
}
