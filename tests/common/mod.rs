use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use glance::overlay::layout::{Frame, ScreenMetrics};
use glance::providers::{LocalEngine, LocalModelManager};
use glance::{
    ChatMessage, ErrorNotice, FileHistoryStore, MemoryPreferences, OverlayRenderer,
    RequestCoordinator, Result,
};

#[allow(dead_code)]
pub const SCREEN: ScreenMetrics = ScreenMetrics {
    width: 1080,
    height: 2400,
};

/// Local engine that always answers with the same text.
pub struct FixedEngine {
    reply: String,
}

impl FixedEngine {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
        }
    }
}

#[async_trait]
impl LocalEngine for FixedEngine {
    fn is_downloaded(&self) -> bool {
        true
    }

    async fn load(&self) -> Result<()> {
        Ok(())
    }

    async fn generate(&self, _prompt: &str) -> Result<String> {
        Ok(self.reply.clone())
    }
}

/// Renderer that records what it was asked to show.
#[allow(dead_code)]
#[derive(Default)]
pub struct CapturingRenderer {
    pub transcripts: Vec<Vec<ChatMessage>>,
    pub titles: Vec<String>,
    pub errors: Vec<ErrorNotice>,
    pub collapsed_count: usize,
    pub expanded_count: usize,
}

#[allow(dead_code)]
impl CapturingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_transcript(&self) -> Option<&[ChatMessage]> {
        self.transcripts.last().map(|t| t.as_slice())
    }
}

impl OverlayRenderer for CapturingRenderer {
    fn show_collapsed(&mut self, _frame: Frame) {
        self.collapsed_count += 1;
    }

    fn show_expanded(&mut self, _frame: Frame, title: &str) {
        self.expanded_count += 1;
        self.titles.push(title.to_string());
    }

    fn render_transcript(&mut self, messages: &[ChatMessage]) {
        self.transcripts.push(messages.to_vec());
    }

    fn set_thinking(&mut self, _thinking: bool) {}

    fn show_error(&mut self, notice: &ErrorNotice) {
        self.errors.push(notice.clone());
    }

    fn move_window(&mut self, _x: i32, _y: i32) {}

    fn set_title(&mut self, title: &str) {
        self.titles.push(title.to_string());
    }

    fn fade_out(&mut self) {}

    fn hide(&mut self) {}
}

/// Coordinator wired to an always-ready local engine.
#[allow(dead_code)]
pub fn local_coordinator(reply: &str) -> Arc<RequestCoordinator> {
    let prefs = Arc::new(MemoryPreferences::with_values(&[(
        glance::prefs::keys::PROVIDER,
        "local",
    )]));
    let local = Arc::new(LocalModelManager::new(Arc::new(FixedEngine::new(reply))));
    Arc::new(RequestCoordinator::new(prefs, local))
}

/// Coordinator pointed at a mock server for a hosted provider.
#[allow(dead_code)]
pub fn remote_coordinator(provider: &str, api_base: &str, api_key: &str) -> Arc<RequestCoordinator> {
    let prefs = Arc::new(MemoryPreferences::with_values(&[
        (glance::prefs::keys::PROVIDER, provider),
        (glance::prefs::keys::API_KEY, api_key),
        (glance::prefs::keys::API_BASE, api_base),
    ]));
    let local = Arc::new(LocalModelManager::new(Arc::new(FixedEngine::new(""))));
    Arc::new(RequestCoordinator::new(prefs, local))
}

/// File-backed history store in a fresh temp directory.
#[allow(dead_code)]
pub fn temp_history() -> (Arc<FileHistoryStore>, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let store = FileHistoryStore::new_with_path(tmp.path().join("chat_history.json"))
        .expect("failed to create history store");
    (Arc::new(store), tmp)
}
