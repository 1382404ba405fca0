//! MCP tool surface configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// MCP configuration
#[derive(Debug, Clone, Deserialize)]
pub struct McpConfig {
    /// Per-call deadline in milliseconds
    #[serde(default = "default_call_deadline_ms")]
    pub call_deadline_ms: u64,
}

impl McpConfig {
    /// Get the call deadline as Duration
    pub fn call_deadline(&self) -> Duration {
        Duration::from_millis(self.call_deadline_ms)
    }

    /// Validate MCP configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.call_deadline_ms == 0 || self.call_deadline_ms > 30_000 {
            return Err(ValidationError::InvalidCallDeadline);
        }
        Ok(())
    }
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            call_deadline_ms: default_call_deadline_ms(),
        }
    }
}

fn default_call_deadline_ms() -> u64 {
    2000
}
