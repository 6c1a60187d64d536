use reqwest::Url;

pub struct ProxyConfig {
  pub prefix: Box<str>,
  pub target: Url,
  pub change_origin: bool,
}

impl ProxyConfig {
  /// Upstream address for a request path: the full path and query are
  /// appended to the target, the prefix is not stripped.
  pub fn upstream_url(&self, path: &str, query: &str) -> Url {
    let mut url = self.target.clone();
    let base_path = url.path().trim_end_matches('/').to_string();
    url.set_path(&format!("{}{}", base_path, path));
    url.set_query(if query.is_empty() { None } else { Some(query) });
    url
  }

  /// Value for the `Host` header when the origin is rewritten.
  pub fn target_authority(&self) -> String {
    let host = self.target.host_str().unwrap_or_default();
    match self.target.port() {
      Some(port) => format!("{}:{}", host, port),
      None => host.to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn config(target: &str) -> ProxyConfig {
    ProxyConfig {
      prefix: Box::from("/chatbot"),
      target: Url::parse(target).unwrap(),
      change_origin: true,
    }
  }

  #[test]
  fn path_and_query_are_forwarded() {
    let config = config("http://localhost:8000");

    assert_eq!(
      config.upstream_url("/chatbot/api/faqs/", "category=general").as_str(),
      "http://localhost:8000/chatbot/api/faqs/?category=general"
    );
    assert_eq!(
      config.upstream_url("/chatbot/api/chat/", "").as_str(),
      "http://localhost:8000/chatbot/api/chat/"
    );
    assert_eq!(config.target_authority(), "localhost:8000");
  }

  #[test]
  fn target_path_prefixes_request_path() {
    let config = config("https://backend.example.com/django/");

    assert_eq!(
      config.upstream_url("/chatbot/api/chat/", "").as_str(),
      "https://backend.example.com/django/chatbot/api/chat/"
    );
    assert_eq!(config.target_authority(), "backend.example.com");
  }
}
