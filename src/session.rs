//! Chat session and message model
//!
//! Plain data entities for the overlay's conversation state. A
//! `ChatMessage` is immutable once created; a `ChatSession` is a mutable
//! handle with explicit update methods that bump `updated_at` internally,
//! so call sites never copy-and-reassign the whole session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placeholder title until the first exchange generates one.
pub const DEFAULT_SESSION_TITLE: &str = "New Chat";

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::System => write!(f, "system"),
        }
    }
}

/// A single message in a conversation
///
/// Immutable once created: the id, role, content, and timestamp are fixed
/// at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Opaque unique identifier
    pub id: String,
    /// Sender role
    pub role: Role,
    /// Message text
    pub content: String,
    /// Wall-clock creation time
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use glance::session::{ChatMessage, Role};
    ///
    /// let msg = ChatMessage::user("Hello!");
    /// assert_eq!(msg.role, Role::User);
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Creates a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// One continuous chat conversation
///
/// Owned exclusively by the overlay controller while current; ownership
/// transfers to the history store once persisted. Messages are
/// append-only during the session's active lifetime, and `updated_at` is
/// monotonically non-decreasing across every mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    /// Opaque unique identifier
    pub id: String,
    /// User-visible title, initially a placeholder
    pub title: String,
    /// Ordered message sequence
    pub messages: Vec<ChatMessage>,
    /// Fixed at creation
    pub created_at: DateTime<Utc>,
    /// Bumped on every append and title change
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// Creates an empty session with the placeholder title.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: DEFAULT_SESSION_TITLE.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends a message and bumps `updated_at`.
    pub fn append_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
        self.touch();
    }

    /// Replaces the title and bumps `updated_at`.
    pub fn rename_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.touch();
    }

    /// Bumps `updated_at` without going backwards even if the wall clock
    /// does.
    pub fn touch(&mut self) {
        let now = Utc::now();
        if now > self.updated_at {
            self.updated_at = now;
        }
    }

    /// Number of messages in the session
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True if the session has no messages
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Content of the first user message, if any.
    ///
    /// Title auto-generation seeds from this.
    pub fn first_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}
