//! Loader configuration file support
//!
//! Handles parsing of `edne-loader.toml` configuration files and
//! environment variable overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::reader::DEFAULT_BUFFER_SIZE;
use crate::resolver::LATEST_DNE_DOWNLOAD_URL;
use crate::unified::DEFAULT_UNIFIED_BATCH_SIZE;
use crate::writer::DEFAULT_INSERT_BATCH_SIZE;

/// Default configuration filename
pub const CONFIG_FILENAME: &str = "edne-loader.toml";

/// Environment variable for the read chunk size
pub const ENV_READ_BUFFER_SIZE: &str = "EDNE_LOADER_READ_BUFFER_SIZE";

/// Environment variable for the insert batch size
pub const ENV_INSERT_BATCH_SIZE: &str = "EDNE_LOADER_INSERT_BATCH_SIZE";

/// Environment variable for the unified table batch size
pub const ENV_UNIFIED_BATCH_SIZE: &str = "EDNE_LOADER_UNIFIED_BATCH_SIZE";

/// Environment variable for the default download URL
pub const ENV_DOWNLOAD_URL: &str = "EDNE_LOADER_DOWNLOAD_URL";

/// Error type for configuration handling
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration handling
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Loading parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderSection {
    /// Approximate bytes read from a data file at a time
    #[serde(default = "default_read_buffer_size")]
    pub read_buffer_size: usize,

    /// Rows per INSERT when populating source tables
    #[serde(default = "default_insert_batch_size")]
    pub insert_batch_size: usize,

    /// Rows per INSERT (and per page read) for normalized unified rows
    #[serde(default = "default_unified_batch_size")]
    pub unified_batch_size: usize,
}

fn default_read_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

fn default_insert_batch_size() -> usize {
    DEFAULT_INSERT_BATCH_SIZE
}

fn default_unified_batch_size() -> usize {
    DEFAULT_UNIFIED_BATCH_SIZE
}

impl Default for LoaderSection {
    fn default() -> Self {
        Self {
            read_buffer_size: default_read_buffer_size(),
            insert_batch_size: default_insert_batch_size(),
            unified_batch_size: default_unified_batch_size(),
        }
    }
}

/// Source resolution parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSection {
    /// URL downloaded when no source is given
    #[serde(default = "default_download_url")]
    pub download_url: String,

    /// Directory for temporary downloads and extractions
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

fn default_download_url() -> String {
    LATEST_DNE_DOWNLOAD_URL.to_string()
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            download_url: default_download_url(),
            temp_dir: None,
        }
    }
}

/// Main configuration structure
///
/// Represents the `edne-loader.toml` configuration file format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    #[serde(default)]
    pub loader: LoaderSection,

    #[serde(default)]
    pub source: SourceSection,
}

impl LoaderConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from `path`, or from `edne-loader.toml` in the
    /// current directory when `path` is `None`
    ///
    /// A missing default file falls back to defaults; a missing explicit
    /// file is an error. Environment overrides are applied in both cases.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::read(path)?,
            None if Path::new(CONFIG_FILENAME).exists() => Self::read(Path::new(CONFIG_FILENAME))?,
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Convert configuration to TOML string
    pub fn to_toml(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(size) = std::env::var(ENV_READ_BUFFER_SIZE)
            && let Ok(size) = size.parse()
        {
            self.loader.read_buffer_size = size;
        }

        if let Ok(size) = std::env::var(ENV_INSERT_BATCH_SIZE)
            && let Ok(size) = size.parse()
        {
            self.loader.insert_batch_size = size;
        }

        if let Ok(size) = std::env::var(ENV_UNIFIED_BATCH_SIZE)
            && let Ok(size) = size.parse()
        {
            self.loader.unified_batch_size = size;
        }

        if let Ok(url) = std::env::var(ENV_DOWNLOAD_URL) {
            self.source.download_url = url;
        }
    }

    /// Reject values the loader cannot work with
    pub fn validate(&self) -> ConfigResult<()> {
        let sizes = [
            ("loader.read_buffer_size", self.loader.read_buffer_size),
            ("loader.insert_batch_size", self.loader.insert_batch_size),
            ("loader.unified_batch_size", self.loader.unified_batch_size),
        ];
        for (name, value) in sizes {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{} must be greater than zero", name)));
            }
        }
        if self.source.download_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "source.download_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Generate a sample configuration file content
pub fn sample_config() -> &'static str {
    r#"# eDNE loader configuration

[loader]
# Approximate number of bytes read from a data file at a time
read_buffer_size = 1000000

# Rows per INSERT statement when populating the eDNE tables
insert_batch_size = 1000

# Rows per INSERT statement for normalized rows of the unified CEP table
unified_batch_size = 500

[source]
# Downloaded when no source is given on the command line
download_url = "https://www2.correios.com.br/sistemas/edne/download/eDNE_Basico.zip"

# Directory for temporary downloads and extractions (system default if unset)
# temp_dir = "/var/tmp"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = LoaderConfig::new();
        assert_eq!(config.loader.read_buffer_size, 1_000_000);
        assert_eq!(config.loader.insert_batch_size, 1000);
        assert_eq!(config.loader.unified_batch_size, 500);
        assert_eq!(config.source.download_url, LATEST_DNE_DOWNLOAD_URL);
        assert!(config.source.temp_dir.is_none());
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[loader]
insert_batch_size = 250

[source]
temp_dir = "/scratch"
"#;
        let config = LoaderConfig::parse(toml).unwrap();
        assert_eq!(config.loader.insert_batch_size, 250);
        assert_eq!(config.loader.unified_batch_size, 500);
        assert_eq!(config.source.temp_dir, Some(PathBuf::from("/scratch")));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = LoaderConfig::parse("[loader]\nunified_batch_size = 0\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_to_toml_round_trip() {
        let mut config = LoaderConfig::new();
        config.loader.read_buffer_size = 4096;
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("read_buffer_size = 4096"));
        assert_eq!(LoaderConfig::parse(&toml).unwrap(), config);
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[loader]\nread_buffer_size = 2048\n").unwrap();

        let config = LoaderConfig::load(Some(&path)).unwrap();
        assert_eq!(config.loader.read_buffer_size, 2048);
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let dir = tempdir().unwrap();
        let result = LoaderConfig::load(Some(&dir.path().join("missing.toml")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_sample_config_is_valid() {
        let config = LoaderConfig::parse(sample_config()).unwrap();
        assert_eq!(config, LoaderConfig::default());
        assert!(config.validate().is_ok());
    }
}
