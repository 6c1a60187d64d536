use std::sync::Arc;

use crate::document::Document;

pub const CSRF_SELECTOR: &str = "[name=csrfmiddlewaretoken]";
pub const CSRF_ATTRIBUTE: &str = "value";

/// Source of the anti-forgery token attached to outgoing calls.
/// `None` means there is nothing to attach, which is not an error.
pub trait CredentialSupplier: Send + Sync {
  fn token(&self) -> Option<String>;
}

impl<F> CredentialSupplier for F
where
  F: Fn() -> Option<String> + Send + Sync,
{
  fn token(&self) -> Option<String> {
    self()
  }
}

/// Reads the token from the hidden form field the backend renders into the page.
pub struct DocumentTokenSupplier {
  document: Arc<Document>,
  selector: String,
  attribute: String,
}

impl DocumentTokenSupplier {
  pub fn new(document: Arc<Document>) -> Self {
    DocumentTokenSupplier {
      document,
      selector: CSRF_SELECTOR.into(),
      attribute: CSRF_ATTRIBUTE.into(),
    }
  }

  pub fn with_selector(mut self, selector: &str, attribute: &str) -> Self {
    self.selector = selector.into();
    self.attribute = attribute.into();
    self
  }
}

impl CredentialSupplier for DocumentTokenSupplier {
  fn token(&self) -> Option<String> {
    self.document.attribute(&self.selector, &self.attribute)
  }
}
