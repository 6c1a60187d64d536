use reqwest::Url;

use crate::proxy_service::proxy_config::ProxyConfig;
use crate::settings::{ProxyRule, SettingsError};

pub mod proxy_config;
pub mod proxy_factory;
pub mod proxy_route_service;

impl TryFrom<&ProxyRule> for ProxyConfig {
  type Error = SettingsError;

  fn try_from(rule: &ProxyRule) -> Result<Self, Self::Error> {
    let target = Url::parse(&rule.target).map_err(|_| SettingsError::InvalidValue {
      key: "dev_server.proxy.target",
      value: rule.target.clone(),
    })?;

    let prefix = rule.path.trim_end_matches('/');
    if !rule.path.starts_with('/') || prefix.is_empty() {
      return Err(SettingsError::InvalidValue {
        key: "dev_server.proxy.path",
        value: rule.path.clone(),
      });
    }

    Ok(ProxyConfig {
      prefix: Box::from(prefix),
      target,
      change_origin: rule.change_origin,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rule_converts_to_config() {
    let rule = ProxyRule {
      path: "/chatbot/".into(),
      target: "http://localhost:8000".into(),
      change_origin: true,
    };
    let config = ProxyConfig::try_from(&rule).unwrap();

    assert_eq!(config.prefix.as_ref(), "/chatbot");
    assert_eq!(config.target.as_str(), "http://localhost:8000/");
    assert!(config.change_origin);
  }

  #[test]
  fn bad_rules_are_rejected() {
    let bad_target = ProxyRule {
      path: "/chatbot".into(),
      target: "localhost".into(),
      change_origin: false,
    };
    let bad_path = ProxyRule {
      path: "chatbot".into(),
      target: "http://localhost:8000".into(),
      change_origin: false,
    };

    let root_path = ProxyRule {
      path: "/".into(),
      target: "http://localhost:8000".into(),
      change_origin: false,
    };

    assert!(ProxyConfig::try_from(&root_path).is_err());
    assert!(ProxyConfig::try_from(&bad_target).is_err());
    assert!(ProxyConfig::try_from(&bad_path).is_err());
  }
}
