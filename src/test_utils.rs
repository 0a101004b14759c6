//! Test utilities
//!
//! Shared doubles for the crate's unit tests: a scripted local inference
//! engine, a recording renderer, and a recording history store. All of
//! them record what the code under test did so assertions can replay it.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ErrorNotice, GlanceError, Result};
use crate::history::HistoryStore;
use crate::overlay::layout::Frame;
use crate::overlay::render::OverlayRenderer;
use crate::providers::LocalEngine;
use crate::session::{ChatMessage, ChatSession};

/// Scripted [`LocalEngine`] double.
///
/// Replies from a queue, falling back to a default reply; records every
/// prompt and the (tokio) instant each inference started.
pub struct ScriptedEngine {
    downloaded: bool,
    delay: Duration,
    default_reply: String,
    queued: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<String>>,
    call_times: Mutex<Vec<tokio::time::Instant>>,
}

impl ScriptedEngine {
    /// An engine that always replies with `reply` immediately.
    pub fn ready(reply: &str) -> Self {
        Self {
            downloaded: true,
            delay: Duration::ZERO,
            default_reply: reply.to_string(),
            queued: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            call_times: Mutex::new(Vec::new()),
        }
    }

    /// Makes every inference take `delay` before replying.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Marks the model file as absent.
    pub fn not_downloaded(mut self) -> Self {
        self.downloaded = false;
        self
    }

    /// Queues a one-shot reply consumed before the default.
    pub fn push_reply(&self, reply: &str) {
        self.queued
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Ok(reply.to_string()));
    }

    /// Queues a one-shot failure consumed before the default.
    pub fn push_failure(&self, message: &str) {
        self.queued
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Err(GlanceError::Provider(message.to_string()).into()));
    }

    /// Prompts seen so far, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Start instant of each inference, in order.
    pub fn call_times(&self) -> Vec<tokio::time::Instant> {
        self.call_times
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl LocalEngine for ScriptedEngine {
    fn is_downloaded(&self) -> bool {
        self.downloaded
    }

    async fn load(&self) -> Result<()> {
        Ok(())
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.to_string());
        self.call_times
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(tokio::time::Instant::now());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let queued = self
            .queued
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match queued {
            Some(result) => result,
            None => Ok(self.default_reply.clone()),
        }
    }
}

/// One observed renderer call.
#[derive(Debug, Clone)]
pub enum RenderEvent {
    Collapsed(Frame),
    Expanded(Frame, String),
    Transcript(Vec<ChatMessage>),
    Thinking(bool),
    Error(ErrorNotice),
    Moved(i32, i32),
    Title(String),
    FadeOut,
    Hidden,
}

/// [`OverlayRenderer`] double that records every call.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub events: Vec<RenderEvent>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last transcript handed to the renderer, if any.
    pub fn last_transcript(&self) -> Option<&[ChatMessage]> {
        self.events.iter().rev().find_map(|e| match e {
            RenderEvent::Transcript(messages) => Some(messages.as_slice()),
            _ => None,
        })
    }

    /// Last error card shown, if any.
    pub fn last_error(&self) -> Option<&ErrorNotice> {
        self.events.iter().rev().find_map(|e| match e {
            RenderEvent::Error(notice) => Some(notice),
            _ => None,
        })
    }
}

impl OverlayRenderer for RecordingRenderer {
    fn show_collapsed(&mut self, frame: Frame) {
        self.events.push(RenderEvent::Collapsed(frame));
    }

    fn show_expanded(&mut self, frame: Frame, title: &str) {
        self.events.push(RenderEvent::Expanded(frame, title.to_string()));
    }

    fn render_transcript(&mut self, messages: &[ChatMessage]) {
        self.events.push(RenderEvent::Transcript(messages.to_vec()));
    }

    fn set_thinking(&mut self, thinking: bool) {
        self.events.push(RenderEvent::Thinking(thinking));
    }

    fn show_error(&mut self, notice: &ErrorNotice) {
        self.events.push(RenderEvent::Error(notice.clone()));
    }

    fn move_window(&mut self, x: i32, y: i32) {
        self.events.push(RenderEvent::Moved(x, y));
    }

    fn set_title(&mut self, title: &str) {
        self.events.push(RenderEvent::Title(title.to_string()));
    }

    fn fade_out(&mut self) {
        self.events.push(RenderEvent::FadeOut);
    }

    fn hide(&mut self) {
        self.events.push(RenderEvent::Hidden);
    }
}

/// [`HistoryStore`] double that counts saves and keeps sessions in memory.
#[derive(Default)]
pub struct RecordingHistory {
    sessions: Mutex<Vec<ChatSession>>,
    save_count: AtomicUsize,
}

impl RecordingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of `save` calls observed.
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    /// Snapshot of the stored sessions, most recently saved first.
    pub fn sessions(&self) -> Vec<ChatSession> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl HistoryStore for RecordingHistory {
    fn save(&self, session: &ChatSession) -> Result<()> {
        self.save_count.fetch_add(1, Ordering::SeqCst);
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.retain(|s| s.id != session.id);
        sessions.insert(0, session.clone());
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Option<ChatSession>> {
        Ok(self
            .sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    fn list_all(&self) -> Result<Vec<ChatSession>> {
        Ok(self.sessions())
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|s| s.id != id);
        Ok(())
    }

    fn clear_all(&self) -> Result<()> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        Ok(())
    }
}
