//! Session history persistence
//!
//! Saved conversations live in a single JSON file, most recently updated
//! first, capped at a fixed number of entries. The store is deliberately
//! forgiving on reads: a missing or corrupt file is treated as an empty
//! history so the overlay always comes up.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::{debug, warn};

use crate::error::{GlanceError, Result};
use crate::session::ChatSession;

/// Maximum number of sessions retained in the history file.
pub const HISTORY_CAPACITY: usize = 50;

/// Persistence contract for chat sessions.
///
/// Implementations must tolerate concurrent callers (`Send + Sync`); the
/// engine calls these synchronously from its dispatch task.
pub trait HistoryStore: Send + Sync {
    /// Inserts or updates a session, moving it to the front of the list.
    fn save(&self, session: &ChatSession) -> Result<()>;

    /// Loads a session by id, if present.
    fn load(&self, id: &str) -> Result<Option<ChatSession>>;

    /// Returns all sessions, most recently saved first.
    fn list_all(&self) -> Result<Vec<ChatSession>>;

    /// Removes a session by id. Removing an absent id is not an error.
    fn delete(&self, id: &str) -> Result<()>;

    /// Removes every saved session.
    fn clear_all(&self) -> Result<()>;
}

/// JSON-file-backed history store.
///
/// The file holds a single JSON array of sessions ordered most recently
/// updated first. Saving an already-present session id replaces the stored
/// copy and moves it to the front rather than duplicating it.
pub struct FileHistoryStore {
    path: PathBuf,
}

impl FileHistoryStore {
    /// Creates a store at the platform-default location.
    ///
    /// The path can be overridden with the `GLANCE_HISTORY_FILE`
    /// environment variable, which is useful for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the project data directory cannot be determined
    /// or created.
    pub fn new() -> Result<Self> {
        let path = if let Ok(env_path) = std::env::var("GLANCE_HISTORY_FILE") {
            PathBuf::from(env_path)
        } else {
            let dirs = ProjectDirs::from("com", "glance", "glance").ok_or_else(|| {
                GlanceError::Storage("could not determine project data directory".to_string())
            })?;
            dirs.data_dir().join("chat_history.json")
        };
        Self::new_with_path(path)
    }

    /// Creates a store backed by the given file path.
    ///
    /// # Arguments
    ///
    /// * `path` - Location of the JSON history file
    pub fn new_with_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        debug!("history store at {}", path.display());
        Ok(Self { path })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_sessions(&self) -> Vec<ChatSession> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_str(&raw) {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!("history file unreadable, starting empty: {e}");
                Vec::new()
            }
        }
    }

    fn write_sessions(&self, sessions: &[ChatSession]) -> Result<()> {
        let raw = serde_json::to_string(sessions)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl HistoryStore for FileHistoryStore {
    fn save(&self, session: &ChatSession) -> Result<()> {
        let mut sessions = self.read_sessions();
        sessions.retain(|s| s.id != session.id);
        sessions.insert(0, session.clone());
        sessions.truncate(HISTORY_CAPACITY);
        self.write_sessions(&sessions)?;
        debug!(
            "saved session {} ({} messages)",
            session.id,
            session.messages.len()
        );
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Option<ChatSession>> {
        Ok(self.read_sessions().into_iter().find(|s| s.id == id))
    }

    fn list_all(&self) -> Result<Vec<ChatSession>> {
        Ok(self.read_sessions())
    }

    fn delete(&self, id: &str) -> Result<()> {
        let mut sessions = self.read_sessions();
        sessions.retain(|s| s.id != id);
        self.write_sessions(&sessions)
    }

    fn clear_all(&self) -> Result<()> {
        self.write_sessions(&[])
    }
}
