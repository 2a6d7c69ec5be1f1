//! Dialog lifecycle events
//!
//! Emitted by the engine and the bundled dialogs and delivered to the
//! catalog's `TelemetryClient`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::DialogReason;

/// Common behavior of every lifecycle event
pub trait StackEvent {
    /// Routing subject, e.g. `dialog.started.v1`
    fn subject(&self) -> String;

    /// Dialog the event is about; empty for stack-wide events
    fn dialog_id(&self) -> &str;

    fn event_type(&self) -> &'static str;
}

/// A dialog was begun and pushed onto the stack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogStarted {
    pub dialog_id: String,
    pub stack_depth: usize,
    pub started_at: DateTime<Utc>,
}

impl StackEvent for DialogStarted {
    fn subject(&self) -> String {
        "dialog.started.v1".to_string()
    }

    fn dialog_id(&self) -> &str {
        &self.dialog_id
    }

    fn event_type(&self) -> &'static str {
        "DialogStarted"
    }
}

/// The active dialog was resumed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogResumed {
    pub dialog_id: String,
    pub reason: DialogReason,
    pub stack_depth: usize,
    pub resumed_at: DateTime<Utc>,
}

impl StackEvent for DialogResumed {
    fn subject(&self) -> String {
        "dialog.resumed.v1".to_string()
    }

    fn dialog_id(&self) -> &str {
        &self.dialog_id
    }

    fn event_type(&self) -> &'static str {
        "DialogResumed"
    }
}

/// A frame was popped off the stack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogEnded {
    pub dialog_id: String,
    pub reason: DialogReason,
    pub ended_at: DateTime<Utc>,
}

impl StackEvent for DialogEnded {
    fn subject(&self) -> String {
        "dialog.ended.v1".to_string()
    }

    fn dialog_id(&self) -> &str {
        &self.dialog_id
    }

    fn event_type(&self) -> &'static str {
        "DialogEnded"
    }
}

/// Every frame was removed at once
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogsCancelled {
    /// Cancelled dialog ids, top first
    pub dialog_ids: Vec<String>,
    pub cancelled_at: DateTime<Utc>,
}

impl StackEvent for DialogsCancelled {
    fn subject(&self) -> String {
        "dialog.cancelled.v1".to_string()
    }

    fn dialog_id(&self) -> &str {
        ""
    }

    fn event_type(&self) -> &'static str {
        "DialogsCancelled"
    }
}

/// A waterfall dialog started one of its steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterfallStepStarted {
    pub dialog_id: String,
    pub step_index: usize,
    pub started_at: DateTime<Utc>,
}

impl StackEvent for WaterfallStepStarted {
    fn subject(&self) -> String {
        "dialog.waterfall.step.v1".to_string()
    }

    fn dialog_id(&self) -> &str {
        &self.dialog_id
    }

    fn event_type(&self) -> &'static str {
        "WaterfallStepStarted"
    }
}

/// A prompt ran its validation for the current input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptValidated {
    pub dialog_id: String,
    pub accepted: bool,
    pub attempt_count: u64,
    pub validated_at: DateTime<Utc>,
}

impl StackEvent for PromptValidated {
    fn subject(&self) -> String {
        "dialog.prompt.validated.v1".to_string()
    }

    fn dialog_id(&self) -> &str {
        &self.dialog_id
    }

    fn event_type(&self) -> &'static str {
        "PromptValidated"
    }
}

/// Every lifecycle event the crate emits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DialogEvent {
    DialogStarted(DialogStarted),
    DialogResumed(DialogResumed),
    DialogEnded(DialogEnded),
    DialogsCancelled(DialogsCancelled),
    WaterfallStepStarted(WaterfallStepStarted),
    PromptValidated(PromptValidated),
}

impl DialogEvent {
    pub(crate) fn started(dialog_id: &str, stack_depth: usize) -> Self {
        Self::DialogStarted(DialogStarted {
            dialog_id: dialog_id.to_string(),
            stack_depth,
            started_at: Utc::now(),
        })
    }

    pub(crate) fn resumed(dialog_id: &str, reason: DialogReason, stack_depth: usize) -> Self {
        Self::DialogResumed(DialogResumed {
            dialog_id: dialog_id.to_string(),
            reason,
            stack_depth,
            resumed_at: Utc::now(),
        })
    }

    pub(crate) fn ended(dialog_id: &str, reason: DialogReason) -> Self {
        Self::DialogEnded(DialogEnded {
            dialog_id: dialog_id.to_string(),
            reason,
            ended_at: Utc::now(),
        })
    }

    fn inner(&self) -> &dyn StackEvent {
        match self {
            Self::DialogStarted(e) => e,
            Self::DialogResumed(e) => e,
            Self::DialogEnded(e) => e,
            Self::DialogsCancelled(e) => e,
            Self::WaterfallStepStarted(e) => e,
            Self::PromptValidated(e) => e,
        }
    }
}

impl StackEvent for DialogEvent {
    fn subject(&self) -> String {
        self.inner().subject()
    }

    fn dialog_id(&self) -> &str {
        self.inner().dialog_id()
    }

    fn event_type(&self) -> &'static str {
        self.inner().event_type()
    }
}
