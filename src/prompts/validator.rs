//! Validation hook for prompts

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::DialogResult;
use crate::prompts::PromptOptions;
use crate::turn::TurnContext;
use crate::value_objects::DialogState;

/// Scratch-state key holding the number of inputs seen by the prompt
pub const ATTEMPT_COUNT_KEY: &str = "attemptCount";

/// What the recognizer made of the current input
#[derive(Debug, Clone, PartialEq)]
pub struct PromptRecognizerResult<T> {
    pub succeeded: bool,
    pub value: Option<T>,
    /// Why recognition failed, when it did
    pub reason: Option<String>,
}

impl<T> PromptRecognizerResult<T> {
    pub fn success(value: T) -> Self {
        Self {
            succeeded: true,
            value: Some(value),
            reason: None,
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            value: None,
            reason: Some(reason.into()),
        }
    }
}

/// View handed to a prompt validator for one input
///
/// The scratch `state` lives as long as the prompt does and is threaded
/// unchanged between validations; the validator may keep its own counters
/// there. `recognized` may be rewritten before accepting.
pub struct PromptValidatorContext<'c, T> {
    turn: &'c dyn TurnContext,
    recognized: PromptRecognizerResult<T>,
    state: &'c mut DialogState,
    options: &'c PromptOptions,
}

impl<'c, T> PromptValidatorContext<'c, T> {
    pub fn new(
        turn: &'c dyn TurnContext,
        recognized: PromptRecognizerResult<T>,
        state: &'c mut DialogState,
        options: &'c PromptOptions,
    ) -> Self {
        Self {
            turn,
            recognized,
            state,
            options,
        }
    }

    pub fn turn_context(&self) -> &'c dyn TurnContext {
        self.turn
    }

    pub fn recognized(&self) -> &PromptRecognizerResult<T> {
        &self.recognized
    }

    pub fn recognized_mut(&mut self) -> &mut PromptRecognizerResult<T> {
        &mut self.recognized
    }

    pub fn state(&self) -> &DialogState {
        &*self.state
    }

    pub fn state_mut(&mut self) -> &mut DialogState {
        &mut *self.state
    }

    /// Options the prompt was begun with
    pub fn options(&self) -> &PromptOptions {
        self.options
    }

    /// Inputs seen so far, including the current one
    pub fn attempt_count(&self) -> u64 {
        self.state
            .get(ATTEMPT_COUNT_KEY)
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    pub(crate) fn into_recognized(self) -> PromptRecognizerResult<T> {
        self.recognized
    }
}

/// Accepts or rejects recognized input
#[async_trait]
pub trait PromptValidator<T>: Send + Sync {
    async fn validate(&self, ctx: &mut PromptValidatorContext<'_, T>) -> DialogResult<bool>;
}

/// Adapter turning a plain closure into a validator
pub(crate) struct FnValidator<F>(pub(crate) F);

#[async_trait]
impl<T, F> PromptValidator<T> for FnValidator<F>
where
    T: Send + Sync,
    F: Fn(&mut PromptValidatorContext<'_, T>) -> bool + Send + Sync,
{
    async fn validate(&self, ctx: &mut PromptValidatorContext<'_, T>) -> DialogResult<bool> {
        Ok((self.0)(ctx))
    }
}
