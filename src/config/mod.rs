//! Engine configuration

use serde::{Deserialize, Serialize};

/// Limits and switches for a `DialogContext`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogEngineConfig {
    /// Maximum dialogs a single top-level call may begin (replacements
    /// included). Resumes and unwinding are not counted, so a deep stack can
    /// complete in one turn.
    pub max_steps_per_turn: usize,
    /// Whether the engine reports lifecycle events to the catalog's telemetry client
    pub telemetry_enabled: bool,
}

impl Default for DialogEngineConfig {
    fn default() -> Self {
        Self {
            max_steps_per_turn: 256,
            telemetry_enabled: true,
        }
    }
}

impl DialogEngineConfig {
    /// Set the per-turn step limit.
    #[must_use]
    pub const fn with_max_steps_per_turn(mut self, steps: usize) -> Self {
        self.max_steps_per_turn = steps;
        self
    }

    /// Enable or disable engine lifecycle telemetry.
    #[must_use]
    pub const fn with_telemetry(mut self, enabled: bool) -> Self {
        self.telemetry_enabled = enabled;
        self
    }
}
