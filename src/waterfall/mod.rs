//! Waterfall dialogs
//!
//! A waterfall runs a fixed sequence of steps, one per resume. Each step may
//! begin a child (typically a prompt) whose result is handed to the next step,
//! or end the waterfall early. Running past the last step completes the
//! waterfall with the last result.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;

use crate::dialog::{Dialog, DialogTurn};
use crate::errors::DialogResult;
use crate::events::{DialogEvent, WaterfallStepStarted};
use crate::telemetry::{NullTelemetryClient, TelemetryClient};
use crate::value_objects::{DialogReason, DialogState, TurnOutcome};

const OPTIONS_KEY: &str = "options";
const VALUES_KEY: &str = "values";
const STEP_INDEX_KEY: &str = "stepIndex";

/// One step of a waterfall
#[async_trait]
pub trait WaterfallStep: Send + Sync {
    async fn run(&self, step: &mut WaterfallStepContext<'_, '_>) -> DialogResult<TurnOutcome>;
}

struct FnStep<F>(F);

#[async_trait]
impl<F> WaterfallStep for FnStep<F>
where
    F: Fn(&mut WaterfallStepContext<'_, '_>) -> DialogResult<TurnOutcome> + Send + Sync,
{
    async fn run(&self, step: &mut WaterfallStepContext<'_, '_>) -> DialogResult<TurnOutcome> {
        (self.0)(step)
    }
}

/// What a step sees when it runs
pub struct WaterfallStepContext<'s, 'a> {
    dc: &'s mut DialogTurn<'a>,
    index: usize,
    reason: DialogReason,
    result: Option<Value>,
    options: Option<Value>,
}

impl<'s, 'a> WaterfallStepContext<'s, 'a> {
    /// Zero-based position of the running step
    pub fn index(&self) -> usize {
        self.index
    }

    /// `BeginCalled` for the first step, then `ContinueCalled` or `EndCalled`
    pub fn reason(&self) -> DialogReason {
        self.reason
    }

    /// Result of the previous step: a child's result, or the inbound text
    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Options the waterfall was begun with
    pub fn options(&self) -> Option<&Value> {
        self.options.as_ref()
    }

    /// Values shared by the steps of this waterfall instance
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.dc
            .state()
            .get(VALUES_KEY)
            .and_then(Value::as_object)
            .and_then(|values| values.get(key))
    }

    pub fn set_value(&mut self, key: impl Into<String>, value: Value) {
        let values = self
            .dc
            .state_mut()
            .entry(VALUES_KEY)
            .or_insert_with(|| Value::Object(DialogState::new()));
        if !values.is_object() {
            *values = Value::Object(DialogState::new());
        }
        if let Value::Object(map) = values {
            map.insert(key.into(), value);
        }
    }

    /// The underlying dialog turn
    pub fn dialog_turn(&mut self) -> &mut DialogTurn<'a> {
        &mut *self.dc
    }

    /// Begin a child; its result arrives at the next step
    pub fn begin_dialog(
        &mut self,
        dialog_id: &str,
        options: Option<Value>,
    ) -> DialogResult<TurnOutcome> {
        self.dc.begin_dialog(dialog_id, options)
    }

    /// Finish the waterfall now
    pub fn end_dialog(&mut self, result: Option<Value>) -> TurnOutcome {
        self.dc.end_dialog(result)
    }
}

/// Dialog running an ordered list of steps
pub struct WaterfallDialog {
    id: String,
    steps: Vec<Box<dyn WaterfallStep>>,
    telemetry: Arc<dyn TelemetryClient>,
}

impl WaterfallDialog {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            steps: Vec::new(),
            telemetry: Arc::new(NullTelemetryClient),
        }
    }

    /// Append a step written as a closure
    #[must_use]
    pub fn step<F>(self, step: F) -> Self
    where
        F: Fn(&mut WaterfallStepContext<'_, '_>) -> DialogResult<TurnOutcome>
            + Send
            + Sync
            + 'static,
    {
        self.add_step(FnStep(step))
    }

    #[must_use]
    pub fn add_step(mut self, step: impl WaterfallStep + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    async fn run_step(
        &self,
        dc: &mut DialogTurn<'_>,
        index: usize,
        reason: DialogReason,
        result: Option<Value>,
    ) -> DialogResult<TurnOutcome> {
        let Some(step) = self.steps.get(index) else {
            return Ok(dc.end_dialog(result));
        };

        dc.state_mut()
            .insert(STEP_INDEX_KEY.to_string(), json!(index));
        let options = dc
            .state()
            .get(OPTIONS_KEY)
            .filter(|v| !v.is_null())
            .cloned();

        debug!(waterfall = %self.id, index, "running step");
        self.telemetry
            .track_event(&DialogEvent::WaterfallStepStarted(WaterfallStepStarted {
                dialog_id: self.id.clone(),
                step_index: index,
                started_at: chrono::Utc::now(),
            }));

        let mut ctx = WaterfallStepContext {
            dc,
            index,
            reason,
            result,
            options,
        };
        step.run(&mut ctx).await
    }
}

#[async_trait]
impl Dialog for WaterfallDialog {
    fn id(&self) -> &str {
        &self.id
    }

    async fn begin_dialog(
        &self,
        dc: &mut DialogTurn<'_>,
        options: Option<Value>,
    ) -> DialogResult<TurnOutcome> {
        let state = dc.state_mut();
        state.insert(OPTIONS_KEY.to_string(), options.unwrap_or(Value::Null));
        state.insert(VALUES_KEY.to_string(), Value::Object(DialogState::new()));
        self.run_step(dc, 0, DialogReason::BeginCalled, None).await
    }

    async fn resume_dialog(
        &self,
        dc: &mut DialogTurn<'_>,
        reason: DialogReason,
        result: Option<Value>,
    ) -> DialogResult<TurnOutcome> {
        let result = match reason {
            DialogReason::ContinueCalled => dc.activity().as_text().map(|t| json!(t)),
            _ => result,
        };
        let next = dc
            .state()
            .get(STEP_INDEX_KEY)
            .and_then(Value::as_u64)
            .map_or(0, |i| i as usize + 1);
        self.run_step(dc, next, reason, result).await
    }

    fn set_telemetry_client(&mut self, client: Arc<dyn TelemetryClient>) {
        self.telemetry = client;
    }
}
