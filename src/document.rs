use std::fs;
use std::path::Path;
use std::sync::RwLock;

use log::warn;
use scraper::{Html, Selector};

const EMPTY_PAGE: &str = "<!DOCTYPE html><html><head></head><body></body></html>";

/// The page the application lives in. The markup can be swapped at runtime,
/// e.g. when a server render delivers a fresh token.
pub struct Document {
  source: RwLock<String>,
}

impl Document {
  pub fn parse(html: impl Into<String>) -> Document {
    Document {
      source: RwLock::new(html.into()),
    }
  }

  pub fn empty() -> Document {
    Document::parse(EMPTY_PAGE)
  }

  pub fn load(path: &Path) -> std::io::Result<Document> {
    Ok(Document::parse(fs::read_to_string(path)?))
  }

  pub fn replace(&self, html: impl Into<String>) {
    let mut source = self.source.write().unwrap_or_else(|poison| poison.into_inner());
    *source = html.into();
  }

  pub fn html(&self) -> String {
    self.source.read().unwrap_or_else(|poison| poison.into_inner()).clone()
  }

  /// Value of `attribute` on the first element matching `selector`.
  /// A selector that does not parse matches nothing.
  pub fn attribute(&self, selector: &str, attribute: &str) -> Option<String> {
    let selector = match Selector::parse(selector) {
      Ok(selector) => selector,
      Err(err) => {
        warn!("Invalid selector '{}': {}", selector, err);
        return None;
      }
    };

    let source = self.source.read().unwrap_or_else(|poison| poison.into_inner());
    let html = Html::parse_document(&source);
    let value = html
      .select(&selector)
      .next()
      .and_then(|element| element.value().attr(attribute))
      .map(String::from);

    value
  }

  pub fn contains_id(&self, id: &str) -> bool {
    let Ok(selector) = Selector::parse("[id]") else {
      return false;
    };

    let source = self.source.read().unwrap_or_else(|poison| poison.into_inner());
    let html = Html::parse_document(&source);
    let found = html
      .select(&selector)
      .any(|element| element.value().id() == Some(id));

    found
  }
}

impl Default for Document {
  fn default() -> Self {
    Document::empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const PAGE: &str = r#"<html><body>
    <form><input type="hidden" name="csrfmiddlewaretoken" value="abc123"></form>
    <div id="app"></div>
  </body></html>"#;

  #[test]
  fn reads_attribute_by_selector() {
    let document = Document::parse(PAGE);

    assert_eq!(
      document.attribute("[name=csrfmiddlewaretoken]", "value"),
      Some("abc123".into())
    );
    assert_eq!(document.attribute("[name=missing]", "value"), None);
    assert_eq!(document.attribute("[[[", "value"), None);
  }

  #[test]
  fn finds_elements_by_id() {
    let document = Document::parse(PAGE);

    assert!(document.contains_id("app"));
    assert!(!document.contains_id("root"));
    assert!(!Document::empty().contains_id("app"));
  }

  #[test]
  fn replace_swaps_markup() {
    let document = Document::parse(PAGE);
    document.replace(r#"<input name="csrfmiddlewaretoken" value="fresh">"#);

    assert_eq!(
      document.attribute("[name=csrfmiddlewaretoken]", "value"),
      Some("fresh".into())
    );
  }
}
