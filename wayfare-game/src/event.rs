//! Structured game events emitted by the session controller.
//!
//! The core stays presentation-free: anything a shell would render as a
//! toast, log line or modal is emitted here as data and drained by the
//! consumer. Log keys are i18n identifiers, never display strings.

use serde::{Deserialize, Serialize};

/// Stable, deterministic identifier for a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId {
    /// Zero-based round index when the event occurred.
    pub round: u32,
    /// Per-session sequence number within the emitted event stream.
    pub seq: u32,
}

impl EventId {
    #[must_use]
    pub const fn new(round: u32, seq: u32) -> Self {
        Self { round, seq }
    }
}

/// Mechanical event kind emitted by the session controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    RoundStarted,
    GuessWrong,
    HintRevealed,
    HintExhausted,
    NpcClueRevealed,
    DialogueHintRevealed,
    TranslationRevealed,
    ScenarioFallback,
    DialogueFailed,
    SpeechFailed,
    TurnStaleDropped,
    RoundCorrect,
    RoundTimeout,
    RoundAbandoned,
    ReviewEntered,
    ReviewExited,
    SessionCompleted,
}

/// Severity tier for a game event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSeverity {
    Info,
    Warning,
    Critical,
}

/// Hint for how the UI should surface an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiSurfaceHint {
    Log,
    Toast,
    Modal,
}

/// Structured event emitted by the session controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    pub id: EventId,
    pub kind: EventKind,
    pub severity: EventSeverity,
    /// Optional UI guidance for surfacing the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_surface_hint: Option<UiSurfaceHint>,
    /// i18n key for presentation-layer rendering.
    pub ui_key: String,
    /// Optional structured payload for debugging and downstream rendering.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

impl GameEvent {
    #[must_use]
    pub fn notice(id: EventId, kind: EventKind, ui_key: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            severity: EventSeverity::Info,
            ui_surface_hint: Some(UiSurfaceHint::Log),
            ui_key: ui_key.into(),
            payload: serde_json::Value::Null,
        }
    }

    #[must_use]
    pub fn toast(id: EventId, kind: EventKind, ui_key: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            severity: EventSeverity::Info,
            ui_surface_hint: Some(UiSurfaceHint::Toast),
            ui_key: ui_key.into(),
            payload: serde_json::Value::Null,
        }
    }

    #[must_use]
    pub fn warning(id: EventId, kind: EventKind, ui_key: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            severity: EventSeverity::Warning,
            ui_surface_hint: Some(UiSurfaceHint::Toast),
            ui_key: ui_key.into(),
            payload: serde_json::Value::Null,
        }
    }

    #[must_use]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}
