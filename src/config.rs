//! Server configuration.
//!
//! Every tunable the operator may care about lives here: code shape,
//! chat limits, session expiry windows, and the polling intervals the
//! bundled client honors. Values load from an optional TOML file with
//! serde defaults, then `PARLOR_*` environment variables override
//! individual fields.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Operator-tunable settings for the session server.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Number of characters in a session code.
    #[serde(default = "default_code_length")]
    code_length: usize,

    /// Alphabet session codes are drawn from.
    #[serde(default = "default_code_alphabet")]
    code_alphabet: String,

    /// Redraw attempts before code generation reports exhaustion.
    #[serde(default = "default_code_max_attempts")]
    code_max_attempts: usize,

    /// Maximum chat message length in characters.
    #[serde(default = "default_max_message_len")]
    max_message_len: usize,

    /// Seconds a finished session lingers before it is pruned.
    #[serde(default = "default_finished_grace_secs")]
    finished_grace_secs: u64,

    /// Seconds without any read or write before a session counts as
    /// abandoned.
    #[serde(default = "default_idle_timeout_secs")]
    idle_timeout_secs: u64,

    /// Seconds between sweeper passes.
    #[serde(default = "default_sweep_interval_secs")]
    sweep_interval_secs: u64,

    /// Polling interval floor for clients, in milliseconds.
    #[serde(default = "default_poll_floor_ms")]
    poll_floor_ms: u64,

    /// Polling interval ceiling for clients, in milliseconds.
    #[serde(default = "default_poll_ceiling_ms")]
    poll_ceiling_ms: u64,
}

fn default_code_length() -> usize {
    6
}

fn default_code_alphabet() -> String {
    crate::code::DEFAULT_CODE_ALPHABET.to_string()
}

fn default_code_max_attempts() -> usize {
    32
}

fn default_max_message_len() -> usize {
    50
}

fn default_finished_grace_secs() -> u64 {
    300
}

fn default_idle_timeout_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_poll_floor_ms() -> u64 {
    1000
}

fn default_poll_ceiling_ms() -> u64 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            code_length: default_code_length(),
            code_alphabet: default_code_alphabet(),
            code_max_attempts: default_code_max_attempts(),
            max_message_len: default_max_message_len(),
            finished_grace_secs: default_finished_grace_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            poll_floor_ms: default_poll_floor_ms(),
            poll_ceiling_ms: default_poll_ceiling_ms(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!("Config loaded successfully");
        Ok(config)
    }

    /// Loads configuration from an optional file, then applies
    /// `PARLOR_*` environment overrides.
    #[instrument(skip(path))]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Applies `PARLOR_*` environment variable overrides in place.
    #[instrument(skip(self))]
    pub fn apply_env_overrides(&mut self) {
        override_from_env("PARLOR_CODE_LENGTH", &mut self.code_length);
        override_from_env("PARLOR_CODE_MAX_ATTEMPTS", &mut self.code_max_attempts);
        override_from_env("PARLOR_MAX_MESSAGE_LEN", &mut self.max_message_len);
        override_from_env("PARLOR_FINISHED_GRACE_SECS", &mut self.finished_grace_secs);
        override_from_env("PARLOR_IDLE_TIMEOUT_SECS", &mut self.idle_timeout_secs);
        override_from_env("PARLOR_SWEEP_INTERVAL_SECS", &mut self.sweep_interval_secs);
        override_from_env("PARLOR_POLL_FLOOR_MS", &mut self.poll_floor_ms);
        override_from_env("PARLOR_POLL_CEILING_MS", &mut self.poll_ceiling_ms);
        if let Ok(alphabet) = std::env::var("PARLOR_CODE_ALPHABET")
            && !alphabet.is_empty()
        {
            self.code_alphabet = alphabet;
        }
    }

    /// How long a finished session lingers before pruning.
    pub fn finished_grace(&self) -> Duration {
        Duration::from_secs(self.finished_grace_secs)
    }

    /// How long a session may go untouched before it counts as abandoned.
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// How often the sweeper runs.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Client polling interval floor.
    pub fn poll_floor(&self) -> Duration {
        Duration::from_millis(self.poll_floor_ms)
    }

    /// Client polling interval ceiling.
    pub fn poll_ceiling(&self) -> Duration {
        Duration::from_millis(self.poll_ceiling_ms)
    }
}

fn override_from_env<T: FromStr>(key: &str, slot: &mut T) {
    if let Ok(raw) = std::env::var(key)
        && let Ok(value) = raw.parse()
    {
        debug!(key, raw, "Applying environment override");
        *slot = value;
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error with caller location tracking.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}
