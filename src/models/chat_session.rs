use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::models::citation::Citation;
use crate::models::message::{Message, Role};

pub const MAX_SESSIONS: usize = 50;
pub const MAX_MESSAGES_PER_SESSION: usize = 100;
const TITLE_LENGTH: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Citation>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub messages: Vec<StoredMessage>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl ChatSession {
    /// The session's turns in the shape a backend expects.
    pub fn conversation(&self) -> Vec<Message> {
        self.messages
            .iter()
            .map(|m| Message {
                role: m.role,
                content: m.content.clone(),
            })
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryImportError {
    #[error("History is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Session {0} is missing its id")]
    MissingId(usize),
}

/// Chat sessions, most recently updated first.
///
/// Sessions beyond `MAX_SESSIONS` and messages beyond
/// `MAX_MESSAGES_PER_SESSION` are dropped oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatHistory {
    sessions: Vec<ChatSession>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn get(&self, session_id: &str) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.id == session_id)
    }

    /// Starts a session at the front of the history and returns a copy of it.
    pub fn create_session(&mut self, title: Option<&str>) -> ChatSession {
        let now = now_millis();
        let session = ChatSession {
            id: Uuid::new_v4().to_string(),
            title: title
                .map(str::to_string)
                .unwrap_or_else(|| format!("Chat {}", self.sessions.len() + 1)),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.sessions.insert(0, session.clone());
        self.sessions.truncate(MAX_SESSIONS);
        session
    }

    /// Appends a message; `None` if the session does not exist.
    pub fn add_message(
        &mut self,
        session_id: &str,
        role: Role,
        content: &str,
        citations: Option<Vec<Citation>>,
    ) -> Option<StoredMessage> {
        let index = self.sessions.iter().position(|s| s.id == session_id)?;
        let now = now_millis();
        let message = StoredMessage {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.to_string(),
            timestamp: now,
            citations,
        };

        let mut session = self.sessions.remove(index);
        session.messages.push(message.clone());
        if session.messages.len() > MAX_MESSAGES_PER_SESSION {
            let overflow = session.messages.len() - MAX_MESSAGES_PER_SESSION;
            session.messages.drain(..overflow);
        }
        session.updated_at = now;

        let user_turns = session.messages.iter().filter(|m| m.role == Role::User).count();
        if role == Role::User && user_turns == 1 {
            session.title = title_from(content);
        }

        self.sessions.insert(0, session);
        Some(message)
    }

    pub fn delete_session(&mut self, session_id: &str) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != session_id);
        self.sessions.len() != before
    }

    pub fn rename_session(&mut self, session_id: &str, title: &str) -> bool {
        match self.sessions.iter_mut().find(|s| s.id == session_id) {
            Some(session) => {
                session.title = title.to_string();
                session.updated_at = now_millis();
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
    }

    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.sessions)
    }

    /// Replaces the history with an exported one. On error the history is untouched.
    pub fn import_json(&mut self, json: &str) -> Result<(), HistoryImportError> {
        let mut sessions: Vec<ChatSession> = serde_json::from_str(json)?;
        if let Some(index) = sessions.iter().position(|s| s.id.is_empty()) {
            return Err(HistoryImportError::MissingId(index));
        }
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        sessions.truncate(MAX_SESSIONS);
        self.sessions = sessions;
        Ok(())
    }
}

fn title_from(content: &str) -> String {
    if content.chars().count() > TITLE_LENGTH {
        let head: String = content.chars().take(TITLE_LENGTH).collect();
        format!("{}...", head)
    } else {
        content.to_string()
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
