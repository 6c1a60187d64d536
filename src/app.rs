use std::sync::Arc;

use log::info;
use thiserror::Error;

use crate::document::Document;
use crate::http_client::HttpClient;

pub const DEFAULT_ANCHOR: &str = "app";

#[derive(Debug, Error, PartialEq)]
pub enum MountError {
  #[error("no element with id '{0}' in the document")]
  AnchorNotFound(String),
}

/// Shared with every component of a mounted tree.
#[derive(Clone)]
pub struct AppContext {
  http: Arc<HttpClient>,
  anchor: Arc<str>,
}

impl AppContext {
  pub fn http(&self) -> &HttpClient {
    &self.http
  }

  /// Owned handle for work that outlives the lifecycle hook, e.g. a spawned call.
  pub fn http_handle(&self) -> Arc<HttpClient> {
    self.http.clone()
  }

  pub fn anchor(&self) -> &str {
    &self.anchor
  }
}

pub trait Component: Send + Sync {
  fn name(&self) -> &str;

  fn children(&self) -> Vec<Arc<dyn Component>> {
    Vec::new()
  }

  /// Called once the component is attached. Children are notified before
  /// their parent.
  fn mounted(&self, _context: &AppContext) {}
}

/// Root application. Taking the built client in `new` means configuration is
/// finished before anything can mount.
pub struct App {
  root: Arc<dyn Component>,
  http: Arc<HttpClient>,
}

impl App {
  pub fn new(root: impl Component + 'static, http: Arc<HttpClient>) -> App {
    App {
      root: Arc::new(root),
      http,
    }
  }

  /// Attaches the tree to the element with id `anchor` (a leading `#` is accepted).
  pub fn mount(self, document: &Document, anchor: &str) -> Result<MountedApp, MountError> {
    let anchor = anchor.trim_start_matches('#');
    if !document.contains_id(anchor) {
      return Err(MountError::AnchorNotFound(anchor.into()));
    }

    let context = AppContext {
      http: self.http,
      anchor: Arc::from(anchor),
    };

    let mut mounted = Vec::new();
    mount_tree(&self.root, &context, &mut mounted);
    info!("Mounted '{}' on #{} ({} components).", self.root.name(), anchor, mounted.len());

    Ok(MountedApp {
      root: self.root,
      context,
      mounted,
    })
  }
}

fn mount_tree(component: &Arc<dyn Component>, context: &AppContext, mounted: &mut Vec<String>) {
  for child in component.children() {
    mount_tree(&child, context, mounted);
  }

  component.mounted(context);
  mounted.push(component.name().to_string());
}

pub struct MountedApp {
  root: Arc<dyn Component>,
  context: AppContext,
  mounted: Vec<String>,
}

impl MountedApp {
  pub fn root(&self) -> &dyn Component {
    self.root.as_ref()
  }

  pub fn context(&self) -> &AppContext {
    &self.context
  }

  /// Component names in the order their `mounted` hook ran.
  pub fn mounted_components(&self) -> &[String] {
    &self.mounted
  }
}
