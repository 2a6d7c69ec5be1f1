//! Turn handler - runs one turn end to end for a host

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::catalog::DialogCatalog;
use crate::config::DialogEngineConfig;
use crate::context::DialogContext;
use crate::errors::{DialogError, DialogResult};
use crate::repository::DialogStateRepository;
use crate::turn::TurnContext;
use crate::value_objects::TurnOutcome;

/// Loads a conversation's stack, drives it for one turn and saves it back
pub struct DialogTurnHandler<R>
where
    R: DialogStateRepository,
{
    repository: Arc<R>,
    catalog: Arc<DialogCatalog>,
    root_dialog_id: String,
    config: DialogEngineConfig,
}

impl<R> DialogTurnHandler<R>
where
    R: DialogStateRepository,
{
    /// Create a handler that starts `root_dialog_id` on empty stacks.
    ///
    /// Fails if the root dialog is not in the catalog.
    pub fn new(
        repository: Arc<R>,
        catalog: Arc<DialogCatalog>,
        root_dialog_id: impl Into<String>,
    ) -> DialogResult<Self> {
        let root_dialog_id = root_dialog_id.into();
        if !catalog.contains(&root_dialog_id) {
            return Err(DialogError::unknown(root_dialog_id));
        }
        Ok(Self {
            repository,
            catalog,
            root_dialog_id,
            config: DialogEngineConfig::default(),
        })
    }

    #[must_use]
    pub fn with_config(mut self, config: DialogEngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn root_dialog_id(&self) -> &str {
        &self.root_dialog_id
    }

    /// Handle one inbound turn for `conversation_key`
    pub async fn handle_turn(
        &self,
        conversation_key: &str,
        turn: &dyn TurnContext,
    ) -> DialogResult<TurnOutcome> {
        self.handle_turn_with_cancellation(conversation_key, turn, CancellationToken::new())
            .await
    }

    /// Handle one inbound turn, aborting when `cancellation` fires.
    ///
    /// State is saved only when the turn succeeds.
    pub async fn handle_turn_with_cancellation(
        &self,
        conversation_key: &str,
        turn: &dyn TurnContext,
        cancellation: CancellationToken,
    ) -> DialogResult<TurnOutcome> {
        let mut state = self.repository.load(conversation_key).await?;
        debug!(
            "Loaded {} frame(s) for conversation {conversation_key}",
            state.depth()
        );

        let outcome = {
            let mut dc = DialogContext::new(&self.catalog, turn, &mut state)
                .with_config(self.config.clone())
                .with_cancellation(cancellation);
            if dc.stack().is_empty() {
                dc.begin_dialog(&self.root_dialog_id, None).await?
            } else {
                dc.continue_dialog().await?
            }
        };

        self.repository.save(conversation_key, &state).await?;
        self.catalog.telemetry().flush();
        info!(
            "Turn for conversation {conversation_key} finished: {:?} ({} frame(s) active)",
            outcome,
            state.depth()
        );
        Ok(outcome)
    }
}
