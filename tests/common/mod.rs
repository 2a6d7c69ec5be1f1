//! Shared test dialogs and sinks

#![allow(dead_code)]

use async_trait::async_trait;
use cim_dialog_stack::{
    Dialog, DialogEvent, DialogReason, DialogResult, DialogState, DialogTurn, StackEvent,
    TelemetryClient, TurnContext, TurnOutcome,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Which hook was invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    Begin,
    Resume,
    Reprompt,
}

/// One recorded hook invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub dialog_id: String,
    pub hook: Hook,
    pub reason: Option<DialogReason>,
    /// Begin options or resume result
    pub value: Option<Value>,
    pub stack_depth: usize,
    pub state: DialogState,
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<Call> {
    log.lock().unwrap().clone()
}

type BeginFn = Box<
    dyn Fn(&mut DialogTurn<'_>, Option<Value>) -> DialogResult<TurnOutcome> + Send + Sync,
>;
type ResumeFn = Box<
    dyn Fn(&mut DialogTurn<'_>, DialogReason, Option<Value>) -> DialogResult<TurnOutcome>
        + Send
        + Sync,
>;

fn wait_on_begin(
    _dc: &mut DialogTurn<'_>,
    _options: Option<Value>,
) -> DialogResult<TurnOutcome> {
    Ok(TurnOutcome::Waiting)
}

fn wait_on_resume(
    _dc: &mut DialogTurn<'_>,
    _reason: DialogReason,
    _result: Option<Value>,
) -> DialogResult<TurnOutcome> {
    Ok(TurnOutcome::Waiting)
}

/// Spy dialog whose behavior is scripted with closures
///
/// By default it waits on begin and on every resume.
pub struct RecordingDialog {
    id: String,
    log: CallLog,
    on_begin: BeginFn,
    on_resume: ResumeFn,
}

impl RecordingDialog {
    pub fn new(id: &str, log: &CallLog) -> Self {
        Self {
            id: id.to_string(),
            log: Arc::clone(log),
            on_begin: Box::new(wait_on_begin),
            on_resume: Box::new(wait_on_resume),
        }
    }

    pub fn on_begin<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut DialogTurn<'_>, Option<Value>) -> DialogResult<TurnOutcome>
            + Send
            + Sync
            + 'static,
    {
        self.on_begin = Box::new(f);
        self
    }

    pub fn on_resume<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut DialogTurn<'_>, DialogReason, Option<Value>) -> DialogResult<TurnOutcome>
            + Send
            + Sync
            + 'static,
    {
        self.on_resume = Box::new(f);
        self
    }

    fn record(
        &self,
        hook: Hook,
        reason: Option<DialogReason>,
        value: Option<Value>,
        depth: usize,
        state: &DialogState,
    ) {
        self.log.lock().unwrap().push(Call {
            dialog_id: self.id.clone(),
            hook,
            reason,
            value,
            stack_depth: depth,
            state: state.clone(),
        });
    }
}

#[async_trait]
impl Dialog for RecordingDialog {
    fn id(&self) -> &str {
        &self.id
    }

    async fn begin_dialog(
        &self,
        dc: &mut DialogTurn<'_>,
        options: Option<Value>,
    ) -> DialogResult<TurnOutcome> {
        self.record(Hook::Begin, None, options.clone(), dc.stack_depth(), dc.state());
        (self.on_begin)(dc, options)
    }

    async fn resume_dialog(
        &self,
        dc: &mut DialogTurn<'_>,
        reason: DialogReason,
        result: Option<Value>,
    ) -> DialogResult<TurnOutcome> {
        self.record(Hook::Resume, Some(reason), result.clone(), dc.stack_depth(), dc.state());
        (self.on_resume)(dc, reason, result)
    }

    async fn reprompt_dialog(
        &self,
        _turn: &dyn TurnContext,
        state: &DialogState,
    ) -> DialogResult<()> {
        self.record(Hook::Reprompt, None, None, 0, state);
        Ok(())
    }
}

/// Telemetry sink remembering event subjects
#[derive(Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<DialogEvent>>,
}

impl RecordingTelemetry {
    pub fn subjects(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(StackEvent::subject)
            .collect()
    }

    pub fn events(&self) -> Vec<DialogEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl TelemetryClient for RecordingTelemetry {
    fn track_event(&self, event: &DialogEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
