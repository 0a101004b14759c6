//! User preferences
//!
//! Key-value preference storage behind a small trait so the engine can run
//! against an in-memory map in tests and a YAML file in production. The
//! API key never touches the preferences file; `FilePreferences` routes it
//! through the OS keyring.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use directories::ProjectDirs;
use keyring::Entry;
use tracing::debug;

use crate::error::{GlanceError, Result};
use crate::prompts::SystemPromptPreset;

/// Well-known preference keys.
pub mod keys {
    /// Active backend: "gemini", "chatgpt"/"openai", "claude", or "local"
    pub const PROVIDER: &str = "provider";
    /// API key for the active hosted provider
    pub const API_KEY: &str = "api_key";
    /// Model override; each provider has its own default
    pub const MODEL: &str = "model";
    /// UI theme: "dark", "light", or "system"
    pub const THEME: &str = "theme";
    /// Collapsed icon tint: "pink", "blue", "purple", or "green"
    pub const OVERLAY_COLOR: &str = "overlay_color";
    /// System prompt preset name
    pub const SYSTEM_PROMPT_PRESET: &str = "system_prompt_preset";
    /// Free-form prompt used when the preset is "custom"
    pub const CUSTOM_SYSTEM_PROMPT: &str = "custom_system_prompt";
    /// Optional base-URL override for the active hosted provider
    pub const API_BASE: &str = "api_base";
}

/// Default provider when none is configured.
pub const DEFAULT_PROVIDER: &str = "gemini";
/// Default UI theme.
pub const DEFAULT_THEME: &str = "system";
/// Default collapsed icon tint.
pub const DEFAULT_OVERLAY_COLOR: &str = "pink";
/// Default system prompt preset.
pub const DEFAULT_PRESET: &str = "concise";

/// Read/write access to user preferences.
///
/// `get` returns `None` for unset keys; typed defaults are applied by the
/// helper functions below, not by implementations.
pub trait PreferenceStore: Send + Sync {
    /// Returns the stored value for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes every stored preference.
    fn clear_all(&self) -> Result<()>;
}

/// Active provider name, defaulting to [`DEFAULT_PROVIDER`].
pub fn provider(store: &dyn PreferenceStore) -> String {
    store
        .get(keys::PROVIDER)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_PROVIDER.to_string())
}

/// Configured API key, if any. Empty strings count as unset.
pub fn api_key(store: &dyn PreferenceStore) -> Option<String> {
    store.get(keys::API_KEY).filter(|v| !v.is_empty())
}

/// Resolves the effective system prompt from the stored preset and the
/// custom prompt slot.
pub fn system_prompt(store: &dyn PreferenceStore) -> String {
    let preset_name = store
        .get(keys::SYSTEM_PROMPT_PRESET)
        .unwrap_or_else(|| DEFAULT_PRESET.to_string());
    let custom = store.get(keys::CUSTOM_SYSTEM_PROMPT).unwrap_or_default();
    SystemPromptPreset::parse(&preset_name).resolve(&custom)
}

/// In-memory preference store for tests and embedding hosts that manage
/// persistence themselves.
#[derive(Default)]
pub struct MemoryPreferences {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store pre-seeded with the given key/value pairs.
    pub fn with_values(pairs: &[(&str, &str)]) -> Self {
        let store = Self::new();
        {
            let mut values = store.values.write().unwrap_or_else(|e| e.into_inner());
            for (k, v) in pairs {
                values.insert((*k).to_string(), (*v).to_string());
            }
        }
        store
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear_all(&self) -> Result<()> {
        self.values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        Ok(())
    }
}

/// YAML-file-backed preference store.
///
/// Every `get` re-reads the file so external edits (a settings UI writing
/// the same file) are picked up without a reload signal. The API key is
/// stored in the OS keyring rather than the file.
pub struct FilePreferences {
    path: PathBuf,
    keyring_service: String,
}

impl FilePreferences {
    /// Creates a store at the platform-default location.
    ///
    /// The path can be overridden with the `GLANCE_PREFS_FILE` environment
    /// variable.
    pub fn new() -> Result<Self> {
        let path = if let Ok(env_path) = std::env::var("GLANCE_PREFS_FILE") {
            PathBuf::from(env_path)
        } else {
            let dirs = ProjectDirs::from("com", "glance", "glance").ok_or_else(|| {
                GlanceError::Config("could not determine project config directory".to_string())
            })?;
            dirs.config_dir().join("preferences.yaml")
        };
        Self::new_with_path(path)
    }

    /// Creates a store backed by the given YAML file.
    pub fn new_with_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        debug!("preferences at {}", path.display());
        Ok(Self {
            path,
            keyring_service: "glance".to_string(),
        })
    }

    fn read_map(&self) -> HashMap<String, String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return HashMap::new(),
        };
        serde_yaml::from_str(&raw).unwrap_or_default()
    }

    fn write_map(&self, map: &HashMap<String, String>) -> Result<()> {
        let raw = serde_yaml::to_string(map)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }

    fn keyring_entry(&self) -> Result<Entry> {
        Ok(Entry::new(&self.keyring_service, keys::API_KEY)?)
    }
}

impl PreferenceStore for FilePreferences {
    fn get(&self, key: &str) -> Option<String> {
        if key == keys::API_KEY {
            return self.keyring_entry().ok()?.get_password().ok();
        }
        self.read_map().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if key == keys::API_KEY {
            self.keyring_entry()?.set_password(value)?;
            return Ok(());
        }
        let mut map = self.read_map();
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn clear_all(&self) -> Result<()> {
        if let Ok(entry) = self.keyring_entry() {
            // Absent credential is fine.
            let _ = entry.delete_password();
        }
        self.write_map(&HashMap::new())
    }
}
