use std::sync::{Arc, OnceLock};

use log::info;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app::{AppContext, Component};
use crate::error::ApiError;
use crate::http_client::HttpClient;
use crate::request::RequestConfig;
use crate::response::ApiResponse;

pub const DEFAULT_API_PREFIX: &str = "/chatbot/api";
pub const MAX_MESSAGE_CHARS: usize = 1000;
pub const MAX_COMMENT_CHARS: usize = 500;
const DEFAULT_HISTORY_LIMIT: u32 = 50;

#[derive(Debug, Error)]
pub enum ChatbotError {
  #[error(transparent)]
  Api(#[from] ApiError),
  #[error("unexpected response body: {0}")]
  Decode(#[source] serde_json::Error),
  #[error("{0}")]
  Invalid(&'static str),
}

impl ChatbotError {
  /// The `error` field the backend puts in rejected responses, if any.
  pub fn server_message(&self) -> Option<String> {
    let ChatbotError::Api(err) = self else {
      return None;
    };

    let body: ErrorBody = err.response()?.json().ok()?;
    Some(body.error)
  }
}

#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

/// Body of every call to the chat endpoint; the backend dispatches on `action`.
#[derive(Serialize, Debug, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ChatAction<'a> {
  StartSession,
  SendMessage {
    session_id: &'a str,
    content: &'a str,
  },
  SubmitFeedback {
    session_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_id: Option<&'a str>,
    rating: u8,
    comment: &'a str,
  },
  GetSessionHistory {
    session_id: &'a str,
    limit: u32,
  },
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ChatMessage {
  pub id: String,
  pub content: String,
  pub timestamp: String,
  #[serde(rename = "type")]
  pub kind: String,
  #[serde(default)]
  pub metadata: serde_json::Value,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct StartedSession {
  pub session_id: String,
  pub message: ChatMessage,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Exchange {
  pub user_message: ChatMessage,
  pub bot_message: ChatMessage,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct FeedbackReceipt {
  pub feedback_id: String,
  pub message: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SessionInfo {
  pub id: String,
  pub created_at: String,
  pub updated_at: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SessionHistory {
  pub messages: Vec<ChatMessage>,
  pub session_info: SessionInfo,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Faq {
  pub id: String,
  pub category: String,
  pub question: String,
  pub answer: String,
  #[serde(default)]
  pub helpful_votes: u32,
  #[serde(default)]
  pub not_helpful_votes: u32,
  #[serde(default)]
  pub helpfulness_score: f64,
  #[serde(default)]
  pub view_count: u32,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct FaqList {
  pub faqs: Vec<Faq>,
  pub total_count: usize,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct QuickReply {
  pub title: String,
  pub payload: String,
  #[serde(default)]
  pub icon: Option<String>,
}

#[derive(Deserialize)]
struct QuickReplyList {
  quick_replies: Vec<QuickReply>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaqQuery {
  pub category: Option<String>,
  pub search: Option<String>,
  pub limit: Option<u32>,
}

/// Typed calls to the chatbot backend, made through the shared client so the
/// CSRF header and 403 reporting apply.
#[derive(Clone)]
pub struct ChatbotApi {
  http: Arc<HttpClient>,
  prefix: String,
}

impl ChatbotApi {
  pub fn new(http: Arc<HttpClient>) -> Self {
    ChatbotApi {
      http,
      prefix: DEFAULT_API_PREFIX.into(),
    }
  }

  pub fn with_prefix(mut self, prefix: &str) -> Self {
    self.prefix = prefix.trim_end_matches('/').into();
    self
  }

  pub async fn start_session(&self) -> Result<StartedSession, ChatbotError> {
    self.chat(&ChatAction::StartSession).await
  }

  pub async fn send_message(&self, session_id: &str, content: &str) -> Result<Exchange, ChatbotError> {
    let content = content.trim();
    if session_id.is_empty() {
      return Err(ChatbotError::Invalid("Session ID is required"));
    }
    if content.is_empty() {
      return Err(ChatbotError::Invalid("Message content is required"));
    }
    if content.chars().count() > MAX_MESSAGE_CHARS {
      return Err(ChatbotError::Invalid("Message too long (max 1000 characters)"));
    }

    self.chat(&ChatAction::SendMessage { session_id, content }).await
  }

  pub async fn submit_feedback(
    &self,
    session_id: &str,
    message_id: Option<&str>,
    rating: u8,
    comment: &str,
  ) -> Result<FeedbackReceipt, ChatbotError> {
    if session_id.is_empty() {
      return Err(ChatbotError::Invalid("Session ID is required"));
    }
    if !(1..=5).contains(&rating) {
      return Err(ChatbotError::Invalid("Rating must be between 1 and 5"));
    }

    let comment = match comment.char_indices().nth(MAX_COMMENT_CHARS) {
      Some((end, _)) => &comment[..end],
      None => comment,
    };

    self
      .chat(&ChatAction::SubmitFeedback {
        session_id,
        message_id,
        rating,
        comment,
      })
      .await
  }

  pub async fn history(&self, session_id: &str, limit: Option<u32>) -> Result<SessionHistory, ChatbotError> {
    if session_id.is_empty() {
      return Err(ChatbotError::Invalid("Session ID is required"));
    }

    self
      .chat(&ChatAction::GetSessionHistory {
        session_id,
        limit: limit.unwrap_or(DEFAULT_HISTORY_LIMIT),
      })
      .await
  }

  pub async fn faqs(&self, query: &FaqQuery) -> Result<FaqList, ChatbotError> {
    let limit = query.limit.map(|limit| limit.to_string());
    let params = [
      ("category", query.category.as_deref()),
      ("search", query.search.as_deref()),
      ("limit", limit.as_deref()),
    ];
    let request = RequestConfig::get(&format!("{}/faqs/", self.prefix))
      .set_query(params.into_iter().filter_map(|(key, value)| value.map(|value| (key, value))));

    decode(&self.http.send(request).await?)
  }

  pub async fn quick_replies(&self, category: &str) -> Result<Vec<QuickReply>, ChatbotError> {
    let request = RequestConfig::get(&format!("{}/quick-replies/", self.prefix)).set_query([("category", category)]);
    let list: QuickReplyList = decode(&self.http.send(request).await?)?;

    Ok(list.quick_replies)
  }

  async fn chat<T: DeserializeOwned>(&self, action: &ChatAction<'_>) -> Result<T, ChatbotError> {
    let response = self.http.post_json(&format!("{}/chat/", self.prefix), action).await?;
    decode(&response)
  }
}

fn decode<T: DeserializeOwned>(response: &ApiResponse) -> Result<T, ChatbotError> {
  response.json().map_err(ChatbotError::Decode)
}

/// The chat widget. It picks up the application's client when mounted.
#[derive(Default)]
pub struct ChatBot {
  api: OnceLock<ChatbotApi>,
}

impl ChatBot {
  pub fn new() -> Self {
    ChatBot::default()
  }

  /// `None` until the component has been mounted.
  pub fn api(&self) -> Option<&ChatbotApi> {
    self.api.get()
  }
}

impl Component for ChatBot {
  fn name(&self) -> &str {
    "ChatBot"
  }

  fn mounted(&self, context: &AppContext) {
    if self.api.set(ChatbotApi::new(context.http_handle())).is_ok() {
      info!("ChatBot ready on #{}.", context.anchor());
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn actions_serialize_with_tag() {
    assert_eq!(
      serde_json::to_value(ChatAction::StartSession).unwrap(),
      json!({ "action": "start_session" })
    );
    assert_eq!(
      serde_json::to_value(ChatAction::SubmitFeedback {
        session_id: "s-1",
        message_id: None,
        rating: 5,
        comment: "",
      })
      .unwrap(),
      json!({ "action": "submit_feedback", "session_id": "s-1", "rating": 5, "comment": "" })
    );
    assert_eq!(
      serde_json::to_value(ChatAction::GetSessionHistory {
        session_id: "s-1",
        limit: 50
      })
      .unwrap(),
      json!({ "action": "get_session_history", "session_id": "s-1", "limit": 50 })
    );
  }

  #[test]
  fn message_kind_comes_from_type_field() {
    let message: ChatMessage = serde_json::from_value(json!({
      "id": "7",
      "content": "Hello!",
      "timestamp": "2024-01-01T00:00:00",
      "type": "bot"
    }))
    .unwrap();

    assert_eq!(message.kind, "bot");
    assert!(message.metadata.is_null());
  }
}
