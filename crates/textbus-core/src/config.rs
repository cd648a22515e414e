//! Editor configuration.
//!
//! Everything the editor needs is passed in through [`EditorConfig`]; there is
//! no process-wide state. All fields have defaults, so an empty JSON object is
//! a valid configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;

/// Configuration for an [`Editor`](crate::Editor) instance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Delay used to coalesce selection changes before toolbar status is
    /// recomputed.
    pub selection_debounce_ms: u64,
    /// Maximum number of undo snapshots kept.
    pub history_limit: usize,
    /// Caret blink half-period. `0` keeps the caret steady.
    pub caret_blink_ms: u64,
    /// Render a `<br>` inside empty block containers so they can hold a caret.
    pub empty_block_placeholder: bool,
    /// Names of the formatters to enable. Empty means every default formatter.
    pub formatters: Vec<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            selection_debounce_ms: 10,
            history_limit: 100,
            caret_blink_ms: 500,
            empty_block_placeholder: true,
            formatters: Vec::new(),
        }
    }
}

impl EditorConfig {
    /// Parse a configuration from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn selection_debounce(&self) -> Duration {
        Duration::from_millis(self.selection_debounce_ms)
    }

    pub fn caret_blink(&self) -> Duration {
        Duration::from_millis(self.caret_blink_ms)
    }
}
