//! Prompt dialogs
//!
//! A prompt asks the user for a single value, recognizes it from the inbound
//! activity, runs an optional validator and completes with the value once it
//! is accepted.

pub mod prompt;
pub mod validator;

pub use prompt::{NumberRecognizer, Prompt, PromptOptions, PromptRecognizer, TextRecognizer};
pub use validator::{
    ATTEMPT_COUNT_KEY, PromptRecognizerResult, PromptValidator, PromptValidatorContext,
};
