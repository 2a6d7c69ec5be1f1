//! Dialog stack engine
//!
//! This crate drives turn-based conversations as a stack of dialogs. It provides:
//! - A catalog of dialog definitions shared by every conversation
//! - Serializable per-conversation stack state with ambient values
//! - The begin / continue / end / replace / cancel / reprompt protocol
//! - Iterative propagation of a finished dialog's result to its parent
//! - Prompt dialogs with pluggable recognition and validation
//! - Waterfall dialogs for multi-step flows
//!
//! A host loads a conversation's `DialogStackState`, wraps it in a
//! `DialogContext` together with the catalog and the current turn, calls one
//! operation (usually `continue_dialog`, or `begin_dialog` on an empty
//! stack), and saves the state afterwards. `DialogTurnHandler` does exactly
//! that against a `DialogStateRepository`.

pub mod catalog;
pub mod config;
pub mod context;
pub mod dialog;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod prompts;
pub mod repository;
pub mod telemetry;
pub mod turn;
pub mod value_objects;
pub mod waterfall;

// Re-export main types
pub use catalog::DialogCatalog;
pub use config::DialogEngineConfig;
pub use context::DialogContext;
pub use dialog::{Dialog, DialogTurn};
pub use errors::{DialogError, DialogResult};

pub use events::{
    DialogEnded, DialogEvent, DialogResumed, DialogStarted, DialogsCancelled,
    PromptValidated, StackEvent, WaterfallStepStarted,
};

pub use handlers::DialogTurnHandler;

pub use prompts::{
    NumberRecognizer, Prompt, PromptOptions, PromptRecognizer, PromptRecognizerResult,
    PromptValidator, PromptValidatorContext, TextRecognizer,
};

pub use repository::{DialogStateRepository, InMemoryDialogStateRepository};
pub use telemetry::{NullTelemetryClient, TelemetryClient, TracingTelemetryClient};
pub use turn::{Activity, ActivityType, InMemoryTurnContext, MessageContent, TurnContext};

pub use value_objects::{DialogReason, DialogStackState, DialogState, StackFrame, TurnOutcome};

pub use waterfall::{WaterfallDialog, WaterfallStep, WaterfallStepContext};

pub use tokio_util::sync::CancellationToken;
