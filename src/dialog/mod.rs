//! The dialog contract
//!
//! A dialog is a unit of multi-turn logic. The engine only ever talks to it
//! through the `Dialog` trait, handing each hook a `DialogTurn`: a view of the
//! current turn, the dialog's own frame state and the ambient values.
//!
//! Hooks never call back into the engine. Starting a child, replacing the
//! current dialog or cancelling the stack is *recorded* on the `DialogTurn`
//! and carried out by the engine's propagation loop once the hook returns.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::catalog::DialogCatalog;
use crate::errors::{DialogError, DialogResult};
use crate::telemetry::TelemetryClient;
use crate::turn::{Activity, TurnContext};
use crate::value_objects::{DialogReason, DialogState, TurnOutcome};

/// Behavior every dialog registered in a catalog must provide
#[async_trait]
pub trait Dialog: Send + Sync {
    /// Unique, immutable id
    fn id(&self) -> &str;

    /// Start the dialog; `options` are whatever the caller passed to begin
    async fn begin_dialog(
        &self,
        dc: &mut DialogTurn<'_>,
        options: Option<Value>,
    ) -> DialogResult<TurnOutcome>;

    /// Resume the active dialog, either for a new turn (`ContinueCalled`) or
    /// because the child above it completed (`EndCalled`, with its result)
    async fn resume_dialog(
        &self,
        dc: &mut DialogTurn<'_>,
        reason: DialogReason,
        result: Option<Value>,
    ) -> DialogResult<TurnOutcome>;

    /// Ask the user again for whatever the dialog is waiting on
    async fn reprompt_dialog(
        &self,
        _turn: &dyn TurnContext,
        _state: &DialogState,
    ) -> DialogResult<()> {
        Ok(())
    }

    /// Receive the catalog's telemetry client at registration
    fn set_telemetry_client(&mut self, _client: Arc<dyn TelemetryClient>) {}
}

/// Stack change a hook asked for
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ControlRequest {
    Begin {
        dialog_id: String,
        options: Option<Value>,
    },
    Replace {
        dialog_id: String,
        options: Option<Value>,
    },
    CancelAll,
}

/// Per-invocation handle given to a dialog hook
///
/// Frame state and ambient values are staged copies; the engine writes them
/// back only when the hook returns successfully.
pub struct DialogTurn<'a> {
    turn: &'a dyn TurnContext,
    catalog: &'a DialogCatalog,
    dialog_id: String,
    state: DialogState,
    values: DialogState,
    stack_depth: usize,
    cancellation: CancellationToken,
    request: Option<ControlRequest>,
}

impl<'a> DialogTurn<'a> {
    pub(crate) fn new(
        turn: &'a dyn TurnContext,
        catalog: &'a DialogCatalog,
        dialog_id: impl Into<String>,
        state: DialogState,
        values: DialogState,
        stack_depth: usize,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            turn,
            catalog,
            dialog_id: dialog_id.into(),
            state,
            values,
            stack_depth,
            cancellation,
            request: None,
        }
    }

    pub(crate) fn into_parts(self) -> (DialogState, DialogState, Option<ControlRequest>) {
        (self.state, self.values, self.request)
    }

    /// Id of the dialog being invoked
    pub fn dialog_id(&self) -> &str {
        &self.dialog_id
    }

    pub fn turn_context(&self) -> &'a dyn TurnContext {
        self.turn
    }

    /// Inbound activity for this turn
    pub fn activity(&self) -> &'a Activity {
        self.turn.activity()
    }

    pub async fn send_activity(&self, activity: Activity) -> DialogResult<()> {
        self.turn.send_activity(activity).await
    }

    /// The dialog's private frame state
    pub fn state(&self) -> &DialogState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut DialogState {
        &mut self.state
    }

    /// Conversation-scoped values shared by every frame
    pub fn values(&self) -> &DialogState {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut DialogState {
        &mut self.values
    }

    /// Stack depth including the invoked dialog's own frame
    pub fn stack_depth(&self) -> usize {
        self.stack_depth
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Start `dialog_id` as a child of this dialog once the hook returns.
    ///
    /// Returns `Waiting`: the caller stays on the stack until the child ends
    /// and is then resumed with `EndCalled` and the child's result.
    pub fn begin_dialog(
        &mut self,
        dialog_id: &str,
        options: Option<Value>,
    ) -> DialogResult<TurnOutcome> {
        self.require(dialog_id)?;
        self.request = Some(ControlRequest::Begin {
            dialog_id: dialog_id.to_string(),
            options,
        });
        Ok(TurnOutcome::Waiting)
    }

    /// Swap this dialog for `dialog_id` once the hook returns. The dialog
    /// below is not told about the swap.
    pub fn replace_dialog(
        &mut self,
        dialog_id: &str,
        options: Option<Value>,
    ) -> DialogResult<TurnOutcome> {
        self.require(dialog_id)?;
        self.request = Some(ControlRequest::Replace {
            dialog_id: dialog_id.to_string(),
            options,
        });
        Ok(TurnOutcome::Waiting)
    }

    /// Finish this dialog with `result`. Drops any begin/replace requested earlier.
    pub fn end_dialog(&mut self, result: Option<Value>) -> TurnOutcome {
        self.request = None;
        TurnOutcome::Completed(result)
    }

    /// Clear the whole stack once the hook returns
    pub fn cancel_all_dialogs(&mut self) -> TurnOutcome {
        self.request = Some(ControlRequest::CancelAll);
        TurnOutcome::Cancelled
    }

    fn require(&self, dialog_id: &str) -> DialogResult<()> {
        if dialog_id.is_empty() {
            return Err(DialogError::MissingArgument("dialog id"));
        }
        if !self.catalog.contains(dialog_id) {
            return Err(DialogError::unknown(dialog_id));
        }
        Ok(())
    }
}
