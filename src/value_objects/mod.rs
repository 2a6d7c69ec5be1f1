//! Value objects for the dialog stack
//!
//! These are the serializable pieces of per-conversation state: the stack of
//! frames, the ambient values shared by every frame, and the outcome a dialog
//! reports back to the engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::DialogResult;

/// Private or ambient state: a JSON object keyed by string
pub type DialogState = Map<String, Value>;

/// One entry in the dialog stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackFrame {
    /// Id of the dialog definition driving this frame
    pub dialog_id: String,
    /// State private to the dialog instance; never inspected by the engine
    #[serde(default)]
    pub state: DialogState,
}

impl StackFrame {
    /// Create a frame with empty private state
    pub fn new(dialog_id: impl Into<String>) -> Self {
        Self {
            dialog_id: dialog_id.into(),
            state: DialogState::new(),
        }
    }

    /// Create a frame with the given private state
    pub fn with_state(dialog_id: impl Into<String>, state: DialogState) -> Self {
        Self {
            dialog_id: dialog_id.into(),
            state,
        }
    }
}

/// Per-conversation dialog state persisted between turns
///
/// The last frame of `stack` is the active dialog. `values` is visible to
/// every frame and survives pushes, pops and cancellation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogStackState {
    /// Frames in call order, top last
    #[serde(default)]
    pub stack: Vec<StackFrame>,
    /// Conversation-scoped values shared across frames
    #[serde(default)]
    pub values: DialogState,
}

impl DialogStackState {
    /// A fresh state with an empty stack
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Number of frames on the stack
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// The active (top) frame
    pub fn active(&self) -> Option<&StackFrame> {
        self.stack.last()
    }

    pub fn active_mut(&mut self) -> Option<&mut StackFrame> {
        self.stack.last_mut()
    }

    pub fn push(&mut self, frame: StackFrame) {
        self.stack.push(frame);
    }

    pub fn pop(&mut self) -> Option<StackFrame> {
        self.stack.pop()
    }

    /// Remove every frame, returning them top first. Ambient values are kept.
    pub fn clear_stack(&mut self) -> Vec<StackFrame> {
        let mut frames = std::mem::take(&mut self.stack);
        frames.reverse();
        frames
    }

    /// Dialog ids from bottom to top
    pub fn dialog_ids(&self) -> Vec<&str> {
        self.stack.iter().map(|f| f.dialog_id.as_str()).collect()
    }

    /// Serialize to the persisted JSON form
    pub fn to_json(&self) -> DialogResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restore from the persisted JSON form
    pub fn from_json(json: &str) -> DialogResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// What a dialog invocation reports back to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TurnOutcome {
    /// The dialog is still in progress; the turn ends here
    Waiting,
    /// The dialog finished; the result goes to whichever frame is active next
    Completed(Option<Value>),
    /// Every dialog on the stack was cancelled
    Cancelled,
}

impl TurnOutcome {
    pub fn is_waiting(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// The completion result, if any
    pub fn result(&self) -> Option<&Value> {
        match self {
            Self::Completed(result) => result.as_ref(),
            _ => None,
        }
    }
}

/// Why a dialog is being resumed or ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialogReason {
    /// The dialog was just started
    BeginCalled,
    /// A new turn arrived for the active dialog
    ContinueCalled,
    /// A dialog finished, either by completing or by an explicit end
    EndCalled,
    /// The dialog was swapped out for another
    ReplaceCalled,
    /// The whole stack was cancelled
    CancelCalled,
}
