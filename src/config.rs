//! Client configuration.
//!
//! Resolution order, highest first: command-line flags, environment
//! (`DOCQA_API_URL`, `DOCQA_MODE`), the TOML config file, built-in defaults.

use crate::client::QueryMode;
use crate::error::{ClientError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const ENV_API_URL: &str = "DOCQA_API_URL";
pub const ENV_MODE: &str = "DOCQA_MODE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base endpoint of the question-answering service.
    pub api_url: String,
    /// Mode used when `ask` is not given one.
    pub default_mode: QueryMode,
    /// Request timeout. Unset means the transport's own default.
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            default_mode: QueryMode::default(),
            request_timeout_secs: None,
        }
    }
}

impl Config {
    /// `<config_dir>/docqa/config.toml` for the current platform.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "docqa").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load from an explicit path, or from the default location.
    ///
    /// A missing default file yields defaults; a missing explicit file is an error.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        match explicit {
            Some(raw) => {
                let path = PathBuf::from(shellexpand::tilde(raw).into_owned());
                if !path.exists() {
                    return Err(ClientError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                Self::from_file(&path)
            }
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| ClientError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&raw)
            .map_err(|e| ClientError::Config(format!("{}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), api_url = %config.api_url, "Loaded config file");
        Ok(config)
    }

    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_url = url;
        }
        if let Some(mode) = lookup(ENV_MODE).filter(|v| !v.trim().is_empty()) {
            self.default_mode = mode
                .parse()
                .map_err(|e| ClientError::Config(format!("{ENV_MODE}: {e}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn defaults_point_at_local_server() {
        let config = Config::default();
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.default_mode, QueryMode::Vector);
        assert_eq!(config.request_timeout_secs, None);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_mode = \"combined\"").unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.default_mode, QueryMode::Combined);
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_url = [").unwrap();
        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = Config::load(Some(missing.to_str().unwrap())).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            (ENV_API_URL, "http://rag.internal:9000"),
            (ENV_MODE, "combined"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.api_url, "http://rag.internal:9000");
        assert_eq!(config.default_mode, QueryMode::Combined);
    }

    #[test]
    fn bad_mode_in_environment_is_rejected() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(|key| (key == ENV_MODE).then(|| "semantic".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_MODE));
    }
}
