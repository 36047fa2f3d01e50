//! Configuration management for shortcode processing.
//!
//! Parses `shortcode.toml` configuration files with serde and provides
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
//! - `render.base_dir`
//! - every `metadata` value

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use shortcode_core::{DelimiterError, Delimiters};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the base directory for `include`.
    pub base_dir: Option<PathBuf>,
    /// Override the reprocessing depth limit.
    pub max_depth: Option<usize>,
    /// Override whether unknown shortcodes are left in place.
    pub allow_unknown: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "shortcode.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tag delimiters.
    pub delimiters: DelimitersConfig,
    /// Rendering configuration (paths are relative strings from TOML).
    render: RenderConfigRaw,
    /// Ambient metadata handed to every handler.
    pub metadata: BTreeMap<String, String>,

    /// Resolved rendering configuration (set after loading).
    #[serde(skip)]
    pub render_resolved: RenderConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Delimiter configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DelimitersConfig {
    /// Start of an opening or self-closing tag.
    pub open: String,
    /// Terminator of an opening or closing tag.
    pub close: String,
    /// Terminator of a self-closing tag.
    pub self_close: String,
    /// Start of a closing tag.
    pub close_open: String,
}

impl Default for DelimitersConfig {
    fn default() -> Self {
        let defaults = Delimiters::default();
        Self {
            open: defaults.open().to_owned(),
            close: defaults.close().to_owned(),
            self_close: defaults.self_close().to_owned(),
            close_open: defaults.close_open().to_owned(),
        }
    }
}

impl DelimitersConfig {
    /// Build a validated delimiter set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Delimiters` if the delimiters are empty, contain
    /// whitespace or are ambiguous.
    pub fn to_delimiters(&self) -> Result<Delimiters, ConfigError> {
        Ok(Delimiters::new(
            self.open.as_str(),
            self.close.as_str(),
            self.self_close.as_str(),
            self.close_open.as_str(),
        )?)
    }
}

/// Raw rendering configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RenderConfigRaw {
    base_dir: Option<String>,
    max_depth: Option<usize>,
    allow_unknown: Option<bool>,
}

/// Resolved rendering configuration with absolute paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// Base directory for resolving `include` paths.
    pub base_dir: PathBuf,
    /// Maximum number of nested reprocessing levels.
    pub max_depth: usize,
    /// Whether shortcodes without a handler are left in place.
    pub allow_unknown: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            max_depth: DEFAULT_MAX_DEPTH,
            allow_unknown: false,
        }
    }
}

const DEFAULT_MAX_DEPTH: usize = 10;

/// Configuration error.
#[derive(Debug, thiserror::Error)]
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
    /// Invalid delimiter set.
    #[error("Configuration error in [delimiters]: {0}")]
    Delimiters(#[from] DelimiterError),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`render.base_dir`").
        field: String,
        /// Error message (e.g., "${`DOCS_ROOT`} not set").
        message: String,
    },
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `shortcode.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails or
    /// the configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| discover_config(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(base_dir) = &settings.base_dir {
            self.render_resolved.base_dir.clone_from(base_dir);
        }
        if let Some(max_depth) = settings.max_depth {
            self.render_resolved.max_depth = max_depth;
        }
        if let Some(allow_unknown) = settings.allow_unknown {
            self.render_resolved.allow_unknown = allow_unknown;
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            delimiters: DelimitersConfig::default(),
            render: RenderConfigRaw::default(),
            metadata: BTreeMap::new(),
            render_resolved: RenderConfig {
                base_dir: base.to_path_buf(),
                ..RenderConfig::default()
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Delimiters` for an invalid delimiter set and
    /// `ConfigError::Validation` for any other invalid value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.delimiters.to_delimiters()?;

        if self.render_resolved.max_depth == 0 {
            return Err(ConfigError::Validation(
                "render.max_depth must be greater than 0".to_owned(),
            ));
        }

        if let Some(key) = self.metadata.keys().find(|key| key.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "metadata key {key:?} cannot be empty"
            )));
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref base_dir) = self.render.base_dir {
            self.render.base_dir = Some(expand::expand_env(base_dir, "render.base_dir")?);
        }

        for (key, value) in &mut self.metadata {
            *value = expand::expand_env(value, &format!("metadata.{key}"))?;
        }

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.render_resolved = RenderConfig {
            base_dir: config_dir.join(self.render.base_dir.as_deref().unwrap_or(".")),
            max_depth: self.render.max_depth.unwrap_or(DEFAULT_MAX_DEPTH),
            allow_unknown: self.render.allow_unknown.unwrap_or(false),
        };
    }
}

/// Search for a config file in `start` and its parents.
fn discover_config(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
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
