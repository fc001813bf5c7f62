//! Runtime configuration for the orchestrator.
//!
//! Read from the environment with [`RelayConfig::from_env`]; unset variables
//! fall back to [`RelayConfig::default`].

use std::path::PathBuf;

pub const ENV_STORE_DIR: &str = "ORDER_RELAY_STORE_DIR";
pub const ENV_MAX_ACTIONS: &str = "ORDER_RELAY_MAX_ACTIONS";
pub const ENV_HISTORY_WINDOW: &str = "ORDER_RELAY_HISTORY_WINDOW";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Directory used by the file-backed conversation store.
    pub store_dir: PathBuf,
    /// Most actions accepted from a single reasoning decision.
    pub max_actions_per_turn: usize,
    /// How many recent log records the reasoning collaborator sees.
    pub history_window: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from(".order-relay/conversations"),
            max_actions_per_turn: 16,
            history_window: 50,
        }
    }
}

impl RelayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(dir) = lookup(ENV_STORE_DIR).filter(|d| !d.trim().is_empty()) {
            config.store_dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup(ENV_MAX_ACTIONS) {
            config.max_actions_per_turn = parse_positive(ENV_MAX_ACTIONS, value)?;
        }
        if let Some(value) = lookup(ENV_HISTORY_WINDOW) {
            config.history_window = parse_positive(ENV_HISTORY_WINDOW, value)?;
        }
        Ok(config)
    }
}

fn parse_positive(var: &'static str, value: String) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = RelayConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, RelayConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = RelayConfig::from_lookup(lookup(&[
            (ENV_STORE_DIR, "/tmp/relay"),
            (ENV_MAX_ACTIONS, "4"),
            (ENV_HISTORY_WINDOW, " 10 "),
        ]))
        .unwrap();
        assert_eq!(config.store_dir, PathBuf::from("/tmp/relay"));
        assert_eq!(config.max_actions_per_turn, 4);
        assert_eq!(config.history_window, 10);
    }

    #[test]
    fn test_invalid_numbers_are_reported() {
        let err = RelayConfig::from_lookup(lookup(&[(ENV_MAX_ACTIONS, "0")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidNumber {
                var: ENV_MAX_ACTIONS,
                value: "0".to_string()
            }
        );
        assert!(RelayConfig::from_lookup(lookup(&[(ENV_HISTORY_WINDOW, "lots")])).is_err());
    }
}
