//! Configuration loading for Parley.
//!
//! Reads `config.toml` from the data directory (`~/.parley/` unless
//! `PARLEY_DATA_DIR` is set) and deserializes it into [`GlobalConfig`].
//! Falls back to defaults when the file is missing or malformed. The
//! generation API key only ever comes from the environment.

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use tracing::{debug, warn};

use parley_types::config::GlobalConfig;
use parley_types::error::ConfigError;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "PARLEY_DATA_DIR";

/// Environment variable carrying the generation backend credential.
pub const API_KEY_ENV: &str = "GENERATION_API_KEY";

/// Resolve the data directory: `PARLEY_DATA_DIR`, else `~/.parley`.
pub fn resolve_data_dir() -> PathBuf {
    resolve_data_dir_from(|name| std::env::var(name).ok())
}

pub fn resolve_data_dir_from(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    match lookup(DATA_DIR_ENV).filter(|v| !v.trim().is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".parley"),
    }
}

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GlobalConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}

/// Read the generation API key from `GENERATION_API_KEY`.
///
/// # Errors
///
/// [`ConfigError::MissingApiKey`] when the variable is unset or blank.
pub fn load_generation_api_key() -> Result<SecretString, ConfigError> {
    load_generation_api_key_from(|name| std::env::var(name).ok())
}

pub fn load_generation_api_key_from(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    lookup(API_KEY_ENV)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingApiKey(API_KEY_ENV.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_global_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.turn.history_cap, 10);
        assert_eq!(config.turn.model_cap, 8);
        assert!(config.personas.is_empty());
    }

    #[tokio::test]
    async fn load_global_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[turn]
history_cap = 20

[generation]
model = "llama-3.1-8b-instant"
timeout_secs = 10
"#,
        )
        .await
        .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.turn.history_cap, 20);
        assert_eq!(config.turn.model_cap, 8);
        assert_eq!(config.generation.model, "llama-3.1-8b-instant");
        assert_eq!(config.generation.timeout_secs, 10);
        assert_eq!(config.generation.max_tokens, 500);
    }

    #[tokio::test]
    async fn load_global_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not [valid toml")
            .await
            .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.turn.history_cap, 10);
    }

    #[test]
    fn api_key_present() {
        let key = load_generation_api_key_from(|name| {
            (name == API_KEY_ENV).then(|| "gsk_abc".to_string())
        })
        .unwrap();
        assert_eq!(key.expose_secret(), "gsk_abc");
    }

    #[test]
    fn api_key_missing_or_blank() {
        let err = load_generation_api_key_from(|_| None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey(ref v) if v == API_KEY_ENV));

        let err = load_generation_api_key_from(|_| Some("   ".into())).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey(_)));
    }

    #[test]
    fn data_dir_override_and_default() {
        let dir = resolve_data_dir_from(|name| {
            (name == DATA_DIR_ENV).then(|| "/tmp/parley-data".to_string())
        });
        assert_eq!(dir, PathBuf::from("/tmp/parley-data"));

        let dir = resolve_data_dir_from(|_| None);
        assert!(dir.ends_with(".parley"));
    }
}
