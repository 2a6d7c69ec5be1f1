//! Generic prompt dialog

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;

use crate::dialog::{Dialog, DialogTurn};
use crate::errors::DialogResult;
use crate::events::{DialogEvent, PromptValidated};
use crate::prompts::validator::{
    ATTEMPT_COUNT_KEY, FnValidator, PromptRecognizerResult, PromptValidator,
    PromptValidatorContext,
};
use crate::telemetry::{NullTelemetryClient, TelemetryClient};
use crate::turn::{Activity, MessageContent, TurnContext};
use crate::value_objects::{DialogReason, DialogState, TurnOutcome};

const OPTIONS_KEY: &str = "options";
const STATE_KEY: &str = "state";

/// Options a prompt is begun with; persisted in its frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptOptions {
    /// Sent when the prompt starts
    pub prompt: Option<Activity>,
    /// Sent after rejected input; falls back to `prompt`
    pub retry_prompt: Option<Activity>,
    /// Free-form data for validators
    pub validations: Option<Value>,
}

impl PromptOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_prompt(mut self, prompt: Activity) -> Self {
        self.prompt = Some(prompt);
        self
    }

    #[must_use]
    pub fn with_retry_prompt(mut self, retry_prompt: Activity) -> Self {
        self.retry_prompt = Some(retry_prompt);
        self
    }

    #[must_use]
    pub fn with_validations(mut self, validations: Value) -> Self {
        self.validations = Some(validations);
        self
    }

    /// Encode for `begin_dialog`
    pub fn to_value(&self) -> DialogResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn from_begin(options: Option<Value>) -> DialogResult<Self> {
        match options {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(value) => Ok(serde_json::from_value(value)?),
        }
    }

    fn from_frame(state: &DialogState) -> DialogResult<Self> {
        Self::from_begin(state.get(OPTIONS_KEY).cloned())
    }
}

/// Turns the inbound activity into a typed value
#[async_trait]
pub trait PromptRecognizer<T>: Send + Sync {
    async fn recognize(
        &self,
        turn: &dyn TurnContext,
        state: &DialogState,
        options: &PromptOptions,
    ) -> DialogResult<PromptRecognizerResult<T>>;
}

/// Accepts any non-blank text
#[derive(Debug, Default, Clone, Copy)]
pub struct TextRecognizer;

#[async_trait]
impl PromptRecognizer<String> for TextRecognizer {
    async fn recognize(
        &self,
        turn: &dyn TurnContext,
        _state: &DialogState,
        _options: &PromptOptions,
    ) -> DialogResult<PromptRecognizerResult<String>> {
        Ok(match turn.activity().as_text().map(str::trim) {
            Some(text) if !text.is_empty() => PromptRecognizerResult::success(text.to_string()),
            _ => PromptRecognizerResult::failure("no text in activity"),
        })
    }
}

/// Accepts a number literal, or a structured numeric value
#[derive(Debug, Default, Clone, Copy)]
pub struct NumberRecognizer;

#[async_trait]
impl PromptRecognizer<f64> for NumberRecognizer {
    async fn recognize(
        &self,
        turn: &dyn TurnContext,
        _state: &DialogState,
        _options: &PromptOptions,
    ) -> DialogResult<PromptRecognizerResult<f64>> {
        let parsed = match &turn.activity().content {
            MessageContent::Text(text) => text.trim().parse::<f64>().ok(),
            MessageContent::Structured(value) => value.as_f64(),
        };
        Ok(match parsed {
            Some(number) if number.is_finite() => PromptRecognizerResult::success(number),
            _ => PromptRecognizerResult::failure("not a number"),
        })
    }
}

/// Dialog that asks for one value and completes with it once it validates
///
/// Frame state layout: `options` holds the `PromptOptions`, `state` holds the
/// validator scratch map (with `attemptCount`).
pub struct Prompt<T> {
    id: String,
    recognizer: Box<dyn PromptRecognizer<T>>,
    validator: Option<Box<dyn PromptValidator<T>>>,
    telemetry: Arc<dyn TelemetryClient>,
}

impl<T> Prompt<T>
where
    T: Serialize + Send + Sync + 'static,
{
    pub fn new(id: impl Into<String>, recognizer: impl PromptRecognizer<T> + 'static) -> Self {
        Self {
            id: id.into(),
            recognizer: Box::new(recognizer),
            validator: None,
            telemetry: Arc::new(NullTelemetryClient),
        }
    }

    /// Validate with a synchronous closure
    #[must_use]
    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&mut PromptValidatorContext<'_, T>) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Box::new(FnValidator(validator)));
        self
    }

    #[must_use]
    pub fn with_async_validator(mut self, validator: impl PromptValidator<T> + 'static) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    async fn send_reprompt(
        &self,
        turn: &dyn TurnContext,
        options: &PromptOptions,
    ) -> DialogResult<()> {
        if let Some(activity) = options.retry_prompt.as_ref().or(options.prompt.as_ref()) {
            turn.send_activity(activity.clone()).await?;
        }
        Ok(())
    }
}

impl Prompt<String> {
    /// Prompt for free text
    pub fn text(id: impl Into<String>) -> Self {
        Self::new(id, TextRecognizer)
    }
}

impl Prompt<f64> {
    /// Prompt for a number
    pub fn number(id: impl Into<String>) -> Self {
        Self::new(id, NumberRecognizer)
    }
}

#[async_trait]
impl<T> Dialog for Prompt<T>
where
    T: Serialize + Send + Sync + 'static,
{
    fn id(&self) -> &str {
        &self.id
    }

    async fn begin_dialog(
        &self,
        dc: &mut DialogTurn<'_>,
        options: Option<Value>,
    ) -> DialogResult<TurnOutcome> {
        let options = PromptOptions::from_begin(options)?;

        let mut scratch = DialogState::new();
        scratch.insert(ATTEMPT_COUNT_KEY.to_string(), json!(0));
        dc.state_mut()
            .insert(OPTIONS_KEY.to_string(), serde_json::to_value(&options)?);
        dc.state_mut()
            .insert(STATE_KEY.to_string(), Value::Object(scratch));

        if let Some(prompt) = &options.prompt {
            dc.send_activity(prompt.clone()).await?;
        }
        Ok(TurnOutcome::Waiting)
    }

    async fn resume_dialog(
        &self,
        dc: &mut DialogTurn<'_>,
        reason: DialogReason,
        _result: Option<Value>,
    ) -> DialogResult<TurnOutcome> {
        let options = PromptOptions::from_frame(dc.state())?;
        let turn = dc.turn_context();

        if reason != DialogReason::ContinueCalled {
            // something stacked above us finished; ask again
            self.send_reprompt(turn, &options).await?;
            return Ok(TurnOutcome::Waiting);
        }

        let mut scratch = match dc.state().get(STATE_KEY) {
            Some(Value::Object(map)) => map.clone(),
            _ => DialogState::new(),
        };
        let attempt_count = scratch
            .get(ATTEMPT_COUNT_KEY)
            .and_then(Value::as_u64)
            .unwrap_or(0)
            + 1;
        scratch.insert(ATTEMPT_COUNT_KEY.to_string(), json!(attempt_count));

        let recognized = self.recognizer.recognize(turn, &scratch, &options).await?;
        let mut ctx = PromptValidatorContext::new(turn, recognized, &mut scratch, &options);
        let accepted = match &self.validator {
            Some(validator) => validator.validate(&mut ctx).await?,
            None => ctx.recognized().succeeded,
        };
        let recognized = ctx.into_recognized();

        dc.state_mut()
            .insert(STATE_KEY.to_string(), Value::Object(scratch));
        debug!(prompt = %self.id, accepted, attempt_count, "validated input");
        self.telemetry
            .track_event(&DialogEvent::PromptValidated(PromptValidated {
                dialog_id: self.id.clone(),
                accepted,
                attempt_count,
                validated_at: chrono::Utc::now(),
            }));

        if accepted {
            if let Some(value) = recognized.value {
                let value = serde_json::to_value(value)?;
                return Ok(dc.end_dialog(Some(value)));
            }
        }

        if !turn.responded() {
            self.send_reprompt(turn, &options).await?;
        }
        Ok(TurnOutcome::Waiting)
    }

    async fn reprompt_dialog(
        &self,
        turn: &dyn TurnContext,
        state: &DialogState,
    ) -> DialogResult<()> {
        let options = PromptOptions::from_frame(state)?;
        self.send_reprompt(turn, &options).await
    }

    fn set_telemetry_client(&mut self, client: Arc<dyn TelemetryClient>) {
        self.telemetry = client;
    }
}
