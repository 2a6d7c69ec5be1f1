//! Dialog context - drives the dialog stack for one turn
//!
//! A `DialogContext` binds a catalog, the current turn and one conversation's
//! `DialogStackState`. Each top-level operation runs a single propagation loop
//! to completion: hooks are invoked one at a time, their outcome is applied to
//! the stack, and a completed dialog's result is delivered to the frame below
//! it until some dialog is left waiting or the stack is empty.

use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::catalog::DialogCatalog;
use crate::config::DialogEngineConfig;
use crate::dialog::{ControlRequest, Dialog, DialogTurn};
use crate::errors::{DialogError, DialogResult};
use crate::events::{DialogEvent, DialogsCancelled};
use crate::turn::TurnContext;
use crate::value_objects::{
    DialogReason, DialogStackState, DialogState, StackFrame, TurnOutcome,
};

/// Next thing the propagation loop has to do to the top of the stack
enum Step {
    /// Push a new frame; with `replace` the current top is popped in the
    /// same commit, once the begin hook has succeeded
    Begin {
        dialog_id: String,
        options: Option<Value>,
        replace: bool,
    },
    Resume {
        reason: DialogReason,
        result: Option<Value>,
    },
}

/// Orchestrates one conversation's dialog stack for the current turn
pub struct DialogContext<'a> {
    catalog: &'a DialogCatalog,
    turn: &'a dyn TurnContext,
    state: &'a mut DialogStackState,
    config: DialogEngineConfig,
    cancellation: CancellationToken,
}

impl<'a> DialogContext<'a> {
    pub fn new(
        catalog: &'a DialogCatalog,
        turn: &'a dyn TurnContext,
        state: &'a mut DialogStackState,
    ) -> Self {
        Self {
            catalog,
            turn,
            state,
            config: DialogEngineConfig::default(),
            cancellation: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: DialogEngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Abort the turn when `token` is cancelled. The stack is left as it was
    /// after the last completed step.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Frames bottom to top
    pub fn stack(&self) -> &[StackFrame] {
        &self.state.stack
    }

    pub fn active_dialog(&self) -> Option<&StackFrame> {
        self.state.active()
    }

    pub fn values(&self) -> &DialogState {
        &self.state.values
    }

    pub fn values_mut(&mut self) -> &mut DialogState {
        &mut self.state.values
    }

    pub fn find_dialog(&self, dialog_id: &str) -> Option<Arc<dyn Dialog>> {
        self.catalog.find(dialog_id)
    }

    pub fn turn_context(&self) -> &'a dyn TurnContext {
        self.turn
    }

    /// Push `dialog_id` and run its begin hook.
    ///
    /// Returns `Waiting` if it (or a child it started) is still in progress,
    /// or `Completed` if the whole stack unwound.
    pub async fn begin_dialog(
        &mut self,
        dialog_id: &str,
        options: Option<Value>,
    ) -> DialogResult<TurnOutcome> {
        self.require(dialog_id)?;
        info!("Beginning dialog: {dialog_id}");
        self.run(Step::Begin {
            dialog_id: dialog_id.to_string(),
            options,
            replace: false,
        })
        .await
    }

    /// Deliver the current turn to the active dialog
    pub async fn continue_dialog(&mut self) -> DialogResult<TurnOutcome> {
        if self.state.is_empty() {
            return Err(DialogError::EmptyStack);
        }
        self.run(Step::Resume {
            reason: DialogReason::ContinueCalled,
            result: None,
        })
        .await
    }

    /// Pop the active dialog and hand `result` to the dialog below, exactly as
    /// if the active dialog had completed on its own
    pub async fn end_dialog(&mut self, result: Option<Value>) -> DialogResult<TurnOutcome> {
        if self.pop_frame(DialogReason::EndCalled).is_none() {
            return Err(DialogError::EmptyStack);
        }
        if self.state.is_empty() {
            return Ok(TurnOutcome::Completed(result));
        }
        self.run(Step::Resume {
            reason: DialogReason::EndCalled,
            result,
        })
        .await
    }

    /// Pop the active dialog without notifying anyone and begin `dialog_id`
    /// in its place. The old frame is kept if the new dialog fails to begin.
    pub async fn replace_dialog(
        &mut self,
        dialog_id: &str,
        options: Option<Value>,
    ) -> DialogResult<TurnOutcome> {
        self.require(dialog_id)?;
        self.run(Step::Begin {
            dialog_id: dialog_id.to_string(),
            options,
            replace: true,
        })
        .await
    }

    /// Drop every frame without invoking any hook. Ambient values survive.
    pub fn cancel_all_dialogs(&mut self) -> usize {
        let frames = self.state.clear_stack();
        if frames.is_empty() {
            return 0;
        }

        info!("Cancelling {} dialog(s)", frames.len());
        for frame in &frames {
            self.track(DialogEvent::ended(&frame.dialog_id, DialogReason::CancelCalled));
        }
        self.track(DialogEvent::DialogsCancelled(DialogsCancelled {
            dialog_ids: frames.iter().map(|f| f.dialog_id.clone()).collect(),
            cancelled_at: chrono::Utc::now(),
        }));
        frames.len()
    }

    /// Ask the active dialog to prompt the user again
    pub async fn reprompt_dialog(&mut self) -> DialogResult<()> {
        let Some(frame) = self.state.active() else {
            return Ok(());
        };
        let dialog = self.resolve_active(&frame.dialog_id)?;
        guarded(&self.cancellation, dialog.reprompt_dialog(self.turn, &frame.state)).await
    }

    async fn run(&mut self, mut step: Step) -> DialogResult<TurnOutcome> {
        let turn = self.turn;
        let catalog = self.catalog;
        // only begins count: unwinding is bounded by the frames begun
        let mut begins = 0;

        loop {
            if self.cancellation.is_cancelled() {
                return Err(DialogError::Cancelled);
            }

            let (outcome, request) = match step {
                Step::Begin {
                    dialog_id,
                    options,
                    replace,
                } => {
                    if begins >= self.config.max_steps_per_turn {
                        return Err(DialogError::StepLimitExceeded(
                            self.config.max_steps_per_turn,
                        ));
                    }
                    begins += 1;

                    let dialog = catalog
                        .find(&dialog_id)
                        .ok_or_else(|| DialogError::unknown(&dialog_id))?;
                    let replaced = replace && !self.state.is_empty();
                    let depth = self.state.depth() + usize::from(!replaced);
                    debug!(dialog_id = %dialog_id, depth, replace, "begin");

                    let mut dc = DialogTurn::new(
                        turn,
                        catalog,
                        dialog_id.clone(),
                        DialogState::new(),
                        self.state.values.clone(),
                        depth,
                        self.cancellation.clone(),
                    );
                    let outcome =
                        guarded(&self.cancellation, dialog.begin_dialog(&mut dc, options)).await?;

                    let (state, values, request) = dc.into_parts();
                    if replaced {
                        if let Some(old) = self.pop_frame(DialogReason::ReplaceCalled) {
                            info!("Replaced dialog {} with {dialog_id}", old.dialog_id);
                        }
                    }
                    self.state.values = values;
                    self.state.push(StackFrame::with_state(dialog_id.clone(), state));
                    self.track(DialogEvent::started(&dialog_id, depth));
                    (outcome, request)
                }
                Step::Resume { reason, result } => {
                    let frame = self.state.active().ok_or(DialogError::EmptyStack)?;
                    let dialog_id = frame.dialog_id.clone();
                    let dialog = self.resolve_active(&dialog_id)?;
                    let depth = self.state.depth();
                    debug!(dialog_id = %dialog_id, depth, ?reason, "resume");

                    let mut dc = DialogTurn::new(
                        turn,
                        catalog,
                        dialog_id.clone(),
                        frame.state.clone(),
                        self.state.values.clone(),
                        depth,
                        self.cancellation.clone(),
                    );
                    let outcome = guarded(
                        &self.cancellation,
                        dialog.resume_dialog(&mut dc, reason, result),
                    )
                    .await?;

                    let (state, values, request) = dc.into_parts();
                    self.state.values = values;
                    if let Some(frame) = self.state.active_mut() {
                        frame.state = state;
                    }
                    self.track(DialogEvent::resumed(&dialog_id, reason, depth));
                    (outcome, request)
                }
            };

            if request.is_some() && outcome.is_completed() {
                warn!(
                    "Dialog completed after requesting a stack change; completion ignored"
                );
            }

            step = match request {
                Some(ControlRequest::Begin { dialog_id, options }) => Step::Begin {
                    dialog_id,
                    options,
                    replace: false,
                },
                Some(ControlRequest::Replace { dialog_id, options }) => Step::Begin {
                    dialog_id,
                    options,
                    replace: true,
                },
                Some(ControlRequest::CancelAll) => {
                    self.cancel_all_dialogs();
                    return Ok(TurnOutcome::Cancelled);
                }
                None => match outcome {
                    TurnOutcome::Waiting => return Ok(TurnOutcome::Waiting),
                    TurnOutcome::Cancelled => {
                        self.cancel_all_dialogs();
                        return Ok(TurnOutcome::Cancelled);
                    }
                    TurnOutcome::Completed(result) => {
                        self.pop_frame(DialogReason::EndCalled);
                        if self.state.is_empty() {
                            return Ok(TurnOutcome::Completed(result));
                        }
                        Step::Resume {
                            reason: DialogReason::EndCalled,
                            result,
                        }
                    }
                },
            };
        }
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

    /// Resolve a dialog id taken from a persisted frame
    fn resolve_active(&self, dialog_id: &str) -> DialogResult<Arc<dyn Dialog>> {
        self.catalog.find(dialog_id).ok_or_else(|| {
            error!(
                "Active dialog '{dialog_id}' is not in the catalog; persisted stack is out of sync"
            );
            DialogError::unknown_persisted(dialog_id)
        })
    }

    fn pop_frame(&mut self, reason: DialogReason) -> Option<StackFrame> {
        let frame = self.state.pop()?;
        self.track(DialogEvent::ended(&frame.dialog_id, reason));
        Some(frame)
    }

    fn track(&self, event: DialogEvent) {
        if self.config.telemetry_enabled {
            self.catalog.telemetry().track_event(&event);
        }
    }
}

/// Race a hook against the turn's cancellation token
async fn guarded<T, F>(token: &CancellationToken, hook: F) -> DialogResult<T>
where
    F: Future<Output = DialogResult<T>>,
{
    tokio::select! {
        biased;
        () = token.cancelled() => Err(DialogError::Cancelled),
        result = hook => result,
    }
}
