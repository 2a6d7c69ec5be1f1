//! Dialog catalog - the registry of dialog definitions
//!
//! Built once at startup and shared read-only by every conversation.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::dialog::Dialog;
use crate::errors::{DialogError, DialogResult};
use crate::telemetry::{NullTelemetryClient, TelemetryClient};

/// Registry mapping dialog ids to their definitions
pub struct DialogCatalog {
    dialogs: HashMap<String, Arc<dyn Dialog>>,
    telemetry: Arc<dyn TelemetryClient>,
}

impl DialogCatalog {
    /// Create an empty catalog with a no-op telemetry sink
    pub fn new() -> Self {
        Self::with_telemetry(Arc::new(NullTelemetryClient))
    }

    /// Create an empty catalog whose dialogs all report to `telemetry`
    pub fn with_telemetry(telemetry: Arc<dyn TelemetryClient>) -> Self {
        Self {
            dialogs: HashMap::new(),
            telemetry,
        }
    }

    /// Register a dialog under its id.
    ///
    /// Fails if the id is empty or already taken; the catalog is left as it was.
    pub fn register<D>(&mut self, mut dialog: D) -> DialogResult<&mut Self>
    where
        D: Dialog + 'static,
    {
        let id = dialog.id().to_string();
        if id.is_empty() {
            return Err(DialogError::MissingArgument("dialog id"));
        }
        if self.dialogs.contains_key(&id) {
            return Err(DialogError::DuplicateId(id));
        }

        dialog.set_telemetry_client(Arc::clone(&self.telemetry));
        info!("Registering dialog: {id}");
        self.dialogs.insert(id, Arc::new(dialog));
        Ok(self)
    }

    /// Look up a dialog by id
    pub fn find(&self, dialog_id: &str) -> Option<Arc<dyn Dialog>> {
        self.dialogs.get(dialog_id).cloned()
    }

    pub fn contains(&self, dialog_id: &str) -> bool {
        self.dialogs.contains_key(dialog_id)
    }

    pub fn len(&self) -> usize {
        self.dialogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialogs.is_empty()
    }

    /// Registered ids, sorted
    pub fn dialog_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.dialogs.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// The shared telemetry sink
    pub fn telemetry(&self) -> &Arc<dyn TelemetryClient> {
        &self.telemetry
    }
}

impl Default for DialogCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DialogCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogCatalog")
            .field("dialogs", &self.dialog_ids())
            .finish_non_exhaustive()
    }
}
