//! Configuration management for docxt.
//!
//! Parses `docxt.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `template.parts` (trimmed after expansion)
//! - `images.user_agent`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI settings that override configuration file values.
///
/// Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override processed part patterns.
    pub parts: Option<Vec<String>>,
    /// Override image download timeout in seconds.
    pub download_timeout: Option<u64>,
    /// Override image download user agent.
    pub user_agent: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "docxt.toml";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Template processing configuration.
    pub template: TemplateConfig,
    /// Image embedding configuration.
    pub images: ImagesConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Template processing configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Substrings of package part names that are expanded.
    pub parts: Vec<String>,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            parts: vec![
                "word/document.xml".to_owned(),
                "word/header".to_owned(),
                "word/footer".to_owned(),
            ],
        }
    }
}

/// Image embedding configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    /// Timeout for a single image download, in seconds.
    pub download_timeout: u64,
    /// `User-Agent` header sent with image downloads.
    pub user_agent: Option<String>,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            download_timeout: 30,
            user_agent: None,
        }
    }
}

impl ImagesConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`images.user_agent`").
        field: String,
        /// Error message (e.g., "${`DOCXT_AGENT`} not set").
        message: String,
    },
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `docxt.toml` in current directory and parents,
    /// falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails or
    /// the result does not validate.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(parts) = &settings.parts {
            self.template.parts.clone_from(parts);
        }
        if let Some(timeout) = settings.download_timeout {
            self.images.download_timeout = timeout;
        }
        if let Some(user_agent) = &settings.user_agent {
            self.images.user_agent = Some(user_agent.clone());
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.template.parts.is_empty() {
            return Err(ConfigError::Validation(
                "template.parts cannot be empty".to_owned(),
            ));
        }
        if self.template.parts.iter().any(String::is_empty) {
            return Err(ConfigError::Validation(
                "template.parts cannot contain empty patterns".to_owned(),
            ));
        }
        if self.images.download_timeout == 0 {
            return Err(ConfigError::Validation(
                "images.download_timeout must be greater than 0".to_owned(),
            ));
        }
        if let Some(user_agent) = &self.images.user_agent
            && user_agent.trim().is_empty()
        {
            return Err(ConfigError::Validation(
                "images.user_agent cannot be empty".to_owned(),
            ));
        }
        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        expand::expand_parts(&mut self.template.parts)?;
        if let Some(user_agent) = &self.images.user_agent {
            self.images.user_agent = Some(expand::expand_field(user_agent, "images.user_agent")?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(
            config.template.parts,
            vec!["word/document.xml", "word/header", "word/footer"]
        );
        assert_eq!(config.images.timeout(), Duration::from_secs(30));
        assert_eq!(config.images.user_agent, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.template.parts.len(), 3);
        assert_eq!(config.images.download_timeout, 30);
    }

    #[test]
    fn test_parse_sections() {
        let toml = r#"
[template]
parts = ["word/document.xml", "word/footnotes"]

[images]
download_timeout = 5
user_agent = "docxt"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.template.parts,
            vec!["word/document.xml", "word/footnotes"]
        );
        assert_eq!(config.images.timeout(), Duration::from_secs(5));
        assert_eq!(config.images.user_agent.as_deref(), Some("docxt"));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[images]\ndownload_timeout = 12\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.images.download_timeout, 12);
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(Some(&dir.path().join("missing.toml")), None);
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("docxt.toml");
        std::fs::write(&path, "[images\n").unwrap();
        assert!(matches!(
            Config::load(Some(&path), None),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_rejects_zero_timeout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("docxt.toml");
        std::fs::write(&path, "[images]\ndownload_timeout = 0\n").unwrap();
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(err.to_string().contains("images.download_timeout"));
    }

    #[test]
    fn test_validate_empty_parts() {
        let mut config = Config::default();
        config.template.parts.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        config.template.parts.push(String::new());
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_blank_user_agent() {
        let mut config = Config::default();
        config.images.user_agent = Some("  ".to_owned());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("images.user_agent"));
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default();
        config.apply_cli_settings(&CliSettings {
            parts: Some(vec!["word/document.xml".to_owned()]),
            download_timeout: Some(3),
            user_agent: Some("cli".to_owned()),
        });
        assert_eq!(config.template.parts, vec!["word/document.xml"]);
        assert_eq!(config.images.download_timeout, 3);
        assert_eq!(config.images.user_agent.as_deref(), Some("cli"));
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default();
        config.apply_cli_settings(&CliSettings::default());
        assert_eq!(config.template.parts.len(), 3);
        assert_eq!(config.images.download_timeout, 30);
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("DOCXT_TEST_UA", "agent/2");
        }
        let mut config: Config = toml::from_str(
            r#"
[template]
parts = ["${DOCXT_TEST_PART:-word/document.xml}"]

[images]
user_agent = "${DOCXT_TEST_UA}"
"#,
        )
        .unwrap();
        config.expand_env_vars().unwrap();
        assert_eq!(config.template.parts, vec!["word/document.xml"]);
        assert_eq!(config.images.user_agent.as_deref(), Some("agent/2"));
        unsafe {
            std::env::remove_var("DOCXT_TEST_UA");
        }
    }
}
