//! Configuration loading and root folder resolution
//!
//! Resolution order for every setting is the same:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is never fatal: the service logs a warning and
//! starts on defaults. A config file that exists but does not parse is.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const ENV_CONFIG_PATH: &str = "SHEETPORT_CONFIG";

/// Environment variable overriding the root folder
pub const ENV_ROOT_FOLDER: &str = "SHEETPORT_ROOT_FOLDER";

/// Environment variable carrying the AI correction service key
pub const ENV_AI_API_KEY: &str = "SHEETPORT_AI_API_KEY";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "sheetport.db";

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5780";
const MAX_COMMIT_CONCURRENCY: usize = 64;

/// Top-level TOML configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Folder holding the database file
    pub root_folder: Option<PathBuf>,
    /// Listen address for the HTTP boundary
    pub bind_address: Option<String>,
    pub logging: LoggingConfig,
    pub correction: CorrectionConfig,
    pub commit: CommitConfig,
}

/// `[logging]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "sheetport_ingest=info,tower_http=info".to_string(),
        }
    }
}

/// Which header corrector the service wires in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrectionStrategy {
    /// External text-generation service
    Ai,
    /// Local normalized-string similarity matcher
    Similarity,
}

/// `[correction]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionConfig {
    /// Explicit strategy; inferred from `endpoint` when absent
    pub strategy: Option<CorrectionStrategy>,
    /// Base URL of an OpenAI-compatible chat completions API
    pub endpoint: Option<String>,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    /// Minimum score for the similarity matcher (0.0-1.0)
    pub similarity_threshold: f64,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            strategy: None,
            endpoint: None,
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            timeout_secs: 20,
            max_tokens: 512,
            similarity_threshold: 0.80,
        }
    }
}

impl CorrectionConfig {
    /// Strategy in effect: explicit setting, else AI when an endpoint exists
    pub fn effective_strategy(&self) -> CorrectionStrategy {
        match self.strategy {
            Some(strategy) => strategy,
            None if self.endpoint.is_some() => CorrectionStrategy::Ai,
            None => CorrectionStrategy::Similarity,
        }
    }

    /// Resolve the API key: ENV beats TOML. Blank values count as unset.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Ok(key) = std::env::var(ENV_AI_API_KEY) {
            if is_valid_key(&key) {
                info!("AI API key loaded from environment variable");
                return Some(key);
            }
        }

        match &self.api_key {
            Some(key) if is_valid_key(key) => {
                info!("AI API key loaded from TOML config");
                Some(key.clone())
            }
            _ => None,
        }
    }

    /// Validate value ranges
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "correction.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(Error::Config(format!(
                "correction.similarity_threshold must be within 0.0-1.0, got {}",
                self.similarity_threshold
            )));
        }
        if self.effective_strategy() == CorrectionStrategy::Ai && self.endpoint.is_none() {
            return Err(Error::Config(
                "correction.strategy = \"ai\" requires correction.endpoint".to_string(),
            ));
        }
        Ok(())
    }
}

/// `[commit]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitConfig {
    /// Maximum number of storage writes in flight per commit
    pub concurrency: usize,
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self { concurrency: 8 }
    }
}

impl CommitConfig {
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.clamp(1, MAX_COMMIT_CONCURRENCY)
    }
}

impl TomlConfig {
    /// Listen address, falling back to the compiled default
    pub fn bind_address(&self) -> &str {
        self.bind_address.as_deref().unwrap_or(DEFAULT_BIND_ADDRESS)
    }

    /// Validate all sections
    pub fn validate(&self) -> Result<()> {
        self.correction.validate()
    }
}

/// Validate a secret value (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    config.validate()?;
    Ok(config)
}

/// Locate the config file: CLI argument → ENV → platform config dir
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir()
        .map(|d| d.join("sheetport").join("config.toml"))
        .filter(|p| p.exists())
}

/// Load configuration, degrading to defaults when no file is present
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = resolve_config_path(cli_arg) else {
        warn!("No config file found, using compiled defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!("Config file {} does not exist, using compiled defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let config = load_toml_config(&path)?;
    info!("Configuration loaded from {}", path.display());
    Ok(config)
}

/// Root folder resolution: CLI → ENV → TOML → platform default
pub struct RootFolderResolver<'a> {
    cli_arg: Option<&'a Path>,
    toml: Option<&'a TomlConfig>,
}

impl<'a> RootFolderResolver<'a> {
    pub fn new(cli_arg: Option<&'a Path>, toml: Option<&'a TomlConfig>) -> Self {
        Self { cli_arg, toml }
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = self.cli_arg {
            return path.to_path_buf();
        }

        if let Ok(path) = std::env::var(ENV_ROOT_FOLDER) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = self.toml.and_then(|c| c.root_folder.clone()) {
            return path;
        }

        default_root_folder()
    }
}

/// OS-dependent default root folder
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("sheetport"))
        .unwrap_or_else(|| PathBuf::from("./sheetport_data"))
}

/// Creates the root folder and derives paths inside it
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }
}
