//! Engine configuration loaded from TOML.
//!
//! # Responsibility
//! - Provide defaults for name probing, link placeholders and logging.
//! - Parse optional TOML overrides; missing keys keep their defaults.
//!
//! # Invariants
//! - `default_name_prefix` is non-blank and `max_name_probe` is at least 1
//!   after `validate`.

use crate::logging::default_log_level;
use crate::tree::links::DEFAULT_BROKEN_LINK_PLACEHOLDER;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Errors from loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// `[logging]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogSettings {
    /// trace|debug|info|warn|error
    pub level: String,
    /// Absolute directory for rolling log files; logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

/// Editor configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Prefix of generated holder names (`Constructor1`, `Constructor2`, ...).
    pub default_name_prefix: String,
    /// Upper bound of the default-name probe.
    pub max_name_probe: u32,
    /// Display text of broken links; `{target}` is replaced by the raw id.
    pub broken_link_placeholder: String,
    pub logging: LogSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_name_prefix: "Constructor".to_string(),
            max_name_probe: 10_000,
            broken_link_placeholder: DEFAULT_BROKEN_LINK_PLACEHOLDER.to_string(),
            logging: LogSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_name_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "default_name_prefix must not be blank".to_string(),
            ));
        }
        if self.max_name_probe == 0 {
            return Err(ConfigError::Invalid(
                "max_name_probe must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, EngineConfig};
    use std::io::Write;

    #[test]
    fn empty_document_yields_defaults() {
        let config = EngineConfig::from_toml_str("").expect("empty config should parse");
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.default_name_prefix, "Constructor");
        assert_eq!(config.max_name_probe, 10_000);
        assert_eq!(config.logging.log_dir, None);
    }

    #[test]
    fn partial_document_overrides_only_given_keys() {
        let config = EngineConfig::from_toml_str(
            r#"
default_name_prefix = "Block"

[logging]
level = "warn"
log_dir = "/tmp/constructor-logs"
"#,
        )
        .expect("config should parse");

        assert_eq!(config.default_name_prefix, "Block");
        assert_eq!(config.max_name_probe, 10_000);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(
            config.logging.log_dir.as_deref(),
            Some(std::path::Path::new("/tmp/constructor-logs"))
        );
    }

    #[test]
    fn blank_prefix_and_zero_probe_are_rejected() {
        let blank = EngineConfig::from_toml_str("default_name_prefix = \"  \"")
            .expect_err("blank prefix should fail");
        assert!(matches!(blank, ConfigError::Invalid(_)));

        let zero =
            EngineConfig::from_toml_str("max_name_probe = 0").expect_err("zero probe should fail");
        assert!(matches!(zero, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = EngineConfig::from_toml_str("max_name_probe = \"many\"")
            .expect_err("wrong type should fail");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file should be created");
        writeln!(file, "broken_link_placeholder = \"?{{target}}\"")
            .expect("config should be written");

        let config = EngineConfig::load(file.path()).expect("config file should load");
        assert_eq!(config.broken_link_placeholder, "?{target}");

        let missing = EngineConfig::load("/nonexistent/constructor.toml")
            .expect_err("missing file should fail");
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
