//! Editor settings

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Quiet period used when nothing else is configured.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(800);

/// Environment variable holding the quiet period in milliseconds.
pub const QUIET_PERIOD_ENV: &str = "RELEASE_EDITOR_QUIET_MS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Idle time after the last edit to a path before it is validated
    pub quiet_period: Duration,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            quiet_period: DEFAULT_QUIET_PERIOD,
        }
    }
}

impl EditorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read overrides from the environment. Unparseable values are ignored
    /// with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(QUIET_PERIOD_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.quiet_period = Duration::from_millis(ms),
                Err(_) => tracing::warn!(
                    variable = QUIET_PERIOD_ENV,
                    value = %raw,
                    "ignoring unparseable quiet period"
                ),
            }
        }
        config
    }

    pub fn with_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.quiet_period = quiet_period;
        self
    }
}
