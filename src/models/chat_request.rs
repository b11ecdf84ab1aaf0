use serde::{Deserialize, Serialize};
use crate::error::ChatError;
use crate::models::file_context::FileContext;
use crate::models::message::{Message, Role};

/// Header that selects the request body layout. Absent means the current one.
pub const SCHEMA_HEADER: &str = "X-Chat-Schema";
pub const CURRENT_SCHEMA: u32 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Local,
    #[default]
    Cloud,
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub messages: Option<Vec<Message>>,
    #[serde(default)]
    pub files: Vec<FileContext>,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Layout sent by the first web client: `{ messages, useLocal }` with free-form roles.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyChatRequest {
    pub messages: Vec<LegacyMessage>,
    #[serde(default)]
    pub use_local: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl From<LegacyChatRequest> for ChatRequest {
    fn from(legacy: LegacyChatRequest) -> Self {
        let messages = legacy
            .messages
            .into_iter()
            .map(|m| Message {
                role: if m.role == "user" { Role::User } else { Role::Assistant },
                content: m.content,
            })
            .collect();
        ChatRequest {
            message: None,
            messages: Some(messages),
            files: Vec::new(),
            mode: if legacy.use_local { Mode::Local } else { Mode::Cloud },
            api_key: None,
        }
    }
}

impl ChatRequest {
    /// Parses a request body written in the given schema version.
    pub fn from_slice(body: &[u8], schema: u32) -> Result<Self, ChatError> {
        match schema {
            0 => serde_json::from_slice::<LegacyChatRequest>(body)
                .map(ChatRequest::from)
                .map_err(|e| ChatError::BadRequest(e.to_string())),
            CURRENT_SCHEMA => {
                serde_json::from_slice(body).map_err(|e| ChatError::BadRequest(e.to_string()))
            }
            other => Err(ChatError::BadRequest(format!("Unsupported schema version {}", other))),
        }
    }

    /// Full conversation to send, oldest first, ending with the new user turn.
    ///
    /// `message` wins when present and `messages` then only supplies history.
    /// Otherwise the last entry of `messages` is the new turn.
    pub fn conversation(&self) -> Result<Vec<Message>, ChatError> {
        let mut conversation = self.messages.clone().unwrap_or_default();
        if let Some(message) = &self.message {
            conversation.push(Message::user(message.clone()));
        }

        match conversation.last() {
            None => Err(ChatError::BadRequest(
                "Either message or messages is required".to_string(),
            )),
            Some(last) if last.role != Role::User => {
                Err(ChatError::BadRequest("The last message must come from the user".to_string()))
            }
            Some(last) if last.content.trim().is_empty() => {
                Err(ChatError::BadRequest("Message cannot be empty".to_string()))
            }
            Some(_) => Ok(conversation),
        }
    }
}
