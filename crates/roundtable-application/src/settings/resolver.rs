use super::debounce::DebouncedSettingsWriter;
use roundtable_core::settings::{KnowledgeBaseTiming, ModelConfig, SessionSettings};

/// The layer an effective configuration was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsLayer {
    /// Message-scoped override for the next exchange only
    Override,
    /// Settings persisted on the session
    Session,
    /// Client defaults
    Defaults,
}

/// Resolves the settings of each exchange from three layers.
///
/// Precedence, highest first: an enabled one-shot override, the session's
/// persisted settings, the client defaults. The winning layer is used
/// wholesale. Session-level edits are applied locally right away and
/// persisted through the debounced writer.
pub struct SessionSettingsResolver {
    defaults: SessionSettings,
    persisted: Option<SessionSettings>,
    one_shot: Option<SessionSettings>,
    writer: Option<DebouncedSettingsWriter>,
}

impl SessionSettingsResolver {
    pub fn new(defaults: SessionSettings, persisted: Option<SessionSettings>) -> Self {
        Self {
            defaults,
            persisted,
            one_shot: None,
            writer: None,
        }
    }

    /// Attaches the writer that persists session-level edits.
    pub fn with_writer(mut self, writer: DebouncedSettingsWriter) -> Self {
        self.writer = Some(writer);
        self
    }

    /// Snapshot of the settings the next exchange will use.
    pub fn effective(&self) -> SessionSettings {
        match self.layer() {
            SettingsLayer::Override => self.one_shot.clone(),
            SettingsLayer::Session => self.persisted.clone(),
            SettingsLayer::Defaults => None,
        }
        .unwrap_or_else(|| self.defaults.clone())
    }

    pub fn layer(&self) -> SettingsLayer {
        if self.one_shot.is_some() {
            SettingsLayer::Override
        } else if self.persisted.is_some() {
            SettingsLayer::Session
        } else {
            SettingsLayer::Defaults
        }
    }

    /// Session-level settings, ignoring any override.
    pub fn session_settings(&self) -> &SessionSettings {
        self.persisted.as_ref().unwrap_or(&self.defaults)
    }

    /// Enables a message-scoped override for the next exchange.
    pub fn enable_override(&mut self, settings: SessionSettings) {
        tracing::debug!("[SessionSettingsResolver] One-shot override enabled");
        self.one_shot = Some(settings);
    }

    /// Enables an override that only swaps the model selection.
    pub fn override_model(&mut self, model: ModelConfig) {
        let mut settings = self.session_settings().clone();
        settings.model = model;
        self.enable_override(settings);
    }

    pub fn is_override_enabled(&self) -> bool {
        self.one_shot.is_some()
    }

    /// Ends the override's single-exchange lifetime, whatever the outcome.
    pub fn complete_exchange(&mut self) {
        if self.one_shot.take().is_some() {
            tracing::debug!("[SessionSettingsResolver] One-shot override consumed");
        }
    }

    /// Applies a session-level edit and schedules its persistence.
    pub fn edit(&mut self, apply: impl FnOnce(&mut SessionSettings)) {
        let mut settings = self.session_settings().clone();
        apply(&mut settings);
        if let Some(writer) = self.writer.as_mut() {
            writer.schedule(settings.clone());
        }
        self.persisted = Some(settings);
    }

    pub fn set_model(&mut self, model: ModelConfig) {
        self.edit(|settings| settings.model = model);
    }

    pub fn set_kb_timing(&mut self, timing: KnowledgeBaseTiming) {
        self.edit(|settings| settings.knowledge_base.timing = timing);
    }

    pub fn set_kb_top_k(&mut self, top_k: u32) {
        self.edit(|settings| settings.knowledge_base.top_k = top_k);
    }

    pub fn set_kb_max_candidates(&mut self, max_candidates: u32) {
        self.edit(|settings| settings.knowledge_base.max_candidates = max_candidates);
    }

    /// Writes pending edits now.
    pub async fn flush(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush().await;
        }
    }

    /// Stops persisting edits and drops any pending write.
    pub fn shutdown(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            writer.shutdown();
        }
    }
}
