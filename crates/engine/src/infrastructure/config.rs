//! Engine configuration

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use courier_domain::{DomainError, LetterQueue, QueueRules};

/// Configuration errors, reported with the offending key.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} has invalid value {value:?}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Failed to read queue rules from {path}: {source}")]
    RulesFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse queue rules in {path}: {source}")]
    RulesParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Queue rules rejected: {0}")]
    InvalidRules(#[from] DomainError),
}

/// Session configuration loaded from environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Number of queue slots (COURIER_QUEUE_CAPACITY, default 8)
    pub queue_capacity: usize,
    /// Cost and gating rules (COURIER_RULES_PATH, JSON; defaults when unset)
    pub rules: QueueRules,
    /// Day the session clock starts on (COURIER_START_DAY, default 1)
    pub start_day: u32,
    /// Hour the session clock starts at (COURIER_START_HOUR, default 6)
    pub start_hour: u32,
    /// Tokens of each currency granted to a new session (COURIER_STARTING_TOKENS, default 10)
    pub starting_tokens: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: LetterQueue::DEFAULT_CAPACITY,
            rules: QueueRules::default(),
            start_day: 1,
            start_hour: 6,
            starting_tokens: 10,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup. Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let queue_capacity = parse_or(&lookup, "COURIER_QUEUE_CAPACITY", defaults.queue_capacity)?;
        if queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "COURIER_QUEUE_CAPACITY",
                value: "0".to_string(),
                reason: "capacity must be at least 1".to_string(),
            });
        }

        let start_hour = parse_or(&lookup, "COURIER_START_HOUR", defaults.start_hour)?;
        if start_hour >= courier_domain::HOURS_PER_DAY {
            return Err(ConfigError::InvalidValue {
                key: "COURIER_START_HOUR",
                value: start_hour.to_string(),
                reason: format!("hour must be below {}", courier_domain::HOURS_PER_DAY),
            });
        }

        let rules = match lookup("COURIER_RULES_PATH").filter(|p| !p.trim().is_empty()) {
            Some(path) => load_rules(Path::new(path.trim()))?,
            None => defaults.rules,
        };
        rules.validate()?;

        Ok(Self {
            queue_capacity,
            rules,
            start_day: parse_or(&lookup, "COURIER_START_DAY", defaults.start_day)?,
            start_hour,
            starting_tokens: parse_or(
                &lookup,
                "COURIER_STARTING_TOKENS",
                defaults.starting_tokens,
            )?,
        })
    }
}

/// Reads a JSON [`QueueRules`] file. Missing fields take their defaults.
pub fn load_rules(path: &Path) -> Result<QueueRules, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::RulesFile {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::RulesParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads `.env.local` then `.env` from the workspace root, if present.
pub fn load_dotenv_from_repo_root() {
    let repo_root = Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            if let Err(error) = dotenvy::from_path(&path) {
                tracing::warn!(path = %path.display(), error = %error, "Failed to load env file");
            }
        }
    }
}

fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
