use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_CHATGPT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_DIALOGUE_DB_PATH: &str = "db.sqlite";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} must be a whole number of seconds, got {value:?}")]
    InvalidTimeout { name: &'static str, value: String },
}

/// Settings read from the environment (and `.env`, when present).
///
/// The Telegram token is not part of it: teloxide reads `TELOXIDE_TOKEN` itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub chatgpt_api_key: Option<String>,
    pub chatgpt_timeout: Duration,
    pub dialogue_db_path: String,
    pub quiz_catalog_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let chatgpt_timeout = match non_empty("CHATGPT_TIMEOUT_SECS") {
            Some(value) => {
                let secs = value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidTimeout {
                    name: "CHATGPT_TIMEOUT_SECS",
                    value: value.clone(),
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_CHATGPT_TIMEOUT_SECS),
        };

        Ok(Self {
            chatgpt_api_key: non_empty("CHATGPT_API_KEY"),
            chatgpt_timeout,
            dialogue_db_path: non_empty("DIALOGUE_DB_PATH").unwrap_or_else(|| DEFAULT_DIALOGUE_DB_PATH.to_string()),
            quiz_catalog_path: non_empty("QUIZ_CATALOG_PATH").map(PathBuf::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.chatgpt_api_key, None);
        assert_eq!(config.chatgpt_timeout, Duration::from_secs(15));
        assert_eq!(config.dialogue_db_path, "db.sqlite");
        assert_eq!(config.quiz_catalog_path, None);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("CHATGPT_API_KEY", "sk-test"),
            ("CHATGPT_TIMEOUT_SECS", "30"),
            ("DIALOGUE_DB_PATH", "/var/lib/fitscan/db.sqlite"),
            ("QUIZ_CATALOG_PATH", "catalog/health_quizzes.yaml"),
        ])
        .unwrap();
        assert_eq!(config.chatgpt_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.chatgpt_timeout, Duration::from_secs(30));
        assert_eq!(config.dialogue_db_path, "/var/lib/fitscan/db.sqlite");
        assert_eq!(config.quiz_catalog_path, Some(PathBuf::from("catalog/health_quizzes.yaml")));
    }

    #[test]
    fn test_blank_api_key_disables_assistant() {
        let config = config_from(&[("CHATGPT_API_KEY", "  ")]).unwrap();
        assert_eq!(config.chatgpt_api_key, None);
    }

    #[test]
    fn test_invalid_timeout() {
        let err = config_from(&[("CHATGPT_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout { value, .. } if value == "soon"));
    }
}
