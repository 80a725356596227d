//! Configuration for searches and playouts.
//!
//! Loaded from TOML; every field has a default so partial files are fine:
//!
//! ```toml
//! [search]
//! exploration_constant = 1.0
//! iterations = 2000
//!
//! [limits]
//! per_move_timeout = 30.0   # seconds
//! max_moves = 90
//! max_total_time = 1000.0   # seconds
//! ```

use crate::mcts::DEFAULT_EXPLORATION_CONSTANT;
use crate::playout::PlayoutLimits;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "MCTS_ARENA_CONFIG";

/// File looked up in the working directory when the variable is unset.
pub const DEFAULT_CONFIG_FILE: &str = "mcts-arena.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

/// Parameters of a single move search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Weight of the exploration term in the selection score.
    pub exploration_constant: f64,
    /// Iterations per move decision.
    pub iterations: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            exploration_constant: DEFAULT_EXPLORATION_CONSTANT,
            iterations: 2000,
        }
    }
}

impl SearchConfig {
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_exploration_constant(mut self, exploration_constant: f64) -> Self {
        self.exploration_constant = exploration_constant;
        self
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub search: SearchConfig,
    pub limits: PlayoutLimits,
}

impl ArenaConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ArenaConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = self.search.exploration_constant;
        if !c.is_finite() || c < 0.0 {
            return Err(invalid(format!(
                "exploration_constant must be finite and non-negative, got {c}"
            )));
        }
        if self.limits.per_move_timeout.is_zero() {
            return Err(invalid("per_move_timeout must be positive".into()));
        }
        if self.limits.max_total_time.is_zero() {
            return Err(invalid("max_total_time must be positive".into()));
        }
        if self.limits.max_moves == 0 {
            return Err(invalid("max_moves must be at least 1".into()));
        }
        Ok(())
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Invalid { message }
}

/// Loads configuration from a specific path.
pub fn load_from_path(path: &Path) -> Result<ArenaConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ArenaConfig::from_toml_str(&content)
}

/// Loads the configuration.
///
/// Looks at the path in [`CONFIG_ENV_VAR`] first, then [`DEFAULT_CONFIG_FILE`] in the
/// working directory, and falls back to built-in defaults when neither exists.
pub fn load_config() -> Result<ArenaConfig, ConfigError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        let path = PathBuf::from(path);
        if path.exists() {
            info!("Loading config from {}: {}", CONFIG_ENV_VAR, path.display());
            return load_from_path(&path);
        }
        warn!(
            "{}={} not found, searching defaults",
            CONFIG_ENV_VAR,
            path.display()
        );
    }

    let path = Path::new(DEFAULT_CONFIG_FILE);
    if path.exists() {
        info!("Loading config from {}", path.display());
        return load_from_path(path);
    }

    debug!("No {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
    Ok(ArenaConfig::default())
}

/// (De)serializes a [`std::time::Duration`] as a float number of seconds.
pub(crate) mod duration_secs {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}
