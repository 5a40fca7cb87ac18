//! Configuration for echo-sleuth: TOML file, environment, command line.

use crate::source::snapshot::{ScanOptions, DEFAULT_CHUNK_SIZE, DEFAULT_FORWARD_THRESHOLD};
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "ECHO_SLEUTH_CONFIG";

/// Environment variable overriding the projects directory.
pub const PROJECTS_DIR_ENV_VAR: &str = "ECHO_SLEUTH_PROJECTS_DIR";

/// Default cap on listed sessions.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Config file failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to read config file (permission issues, a directory, etc.).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O message.
        reason: String,
    },

    /// Config file contains invalid TOML syntax or unknown keys.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// File holding the bad TOML.
        path: PathBuf,
        /// TOML parser message.
        reason: String,
    },
}

/// On-disk `config.toml`.
///
/// Every field is optional; absent fields keep their built-in value.
/// Corresponds to `~/.config/echo-sleuth/config.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Root holding one log directory per project.
    #[serde(default)]
    pub projects_dir: Option<PathBuf>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,

    /// Files at or above this many bytes get a reverse snapshot scan.
    #[serde(default)]
    pub snapshot_scan_threshold: Option<u64>,

    /// Block size of the reverse snapshot scan, in bytes.
    #[serde(default)]
    pub snapshot_chunk_size: Option<usize>,

    /// Default cap on listed sessions (0 = no cap).
    #[serde(default)]
    pub list_limit: Option<usize>,
}

/// Effective settings.
///
/// Built from defaults, the config file, the environment and flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Root holding one log directory per project.
    pub projects_dir: PathBuf,
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
    /// Reverse snapshot scan threshold, in bytes.
    pub snapshot_scan_threshold: u64,
    /// Reverse snapshot scan block size, in bytes.
    pub snapshot_chunk_size: usize,
    /// Default cap on listed sessions.
    pub list_limit: usize,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            projects_dir: default_projects_dir(),
            log_file_path: default_log_path(),
            snapshot_scan_threshold: DEFAULT_FORWARD_THRESHOLD,
            snapshot_chunk_size: DEFAULT_CHUNK_SIZE,
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl ResolvedConfig {
    /// Snapshot scan settings.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            forward_threshold: self.snapshot_scan_threshold,
            chunk_size: self.snapshot_chunk_size,
        }
    }
}

/// Resolve the default projects directory.
///
/// Returns `~/.claude/projects`. Falls back to a relative `.claude/projects`
/// when the home directory cannot be determined.
pub fn default_projects_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(".claude").join("projects"),
        None => PathBuf::from(".claude").join("projects"),
    }
}

/// Log file location when nothing overrides it.
///
/// Returns `~/.local/state/echo-sleuth/echo-sleuth.log` on Linux, or the
/// platform's state directory elsewhere. Falls back to the current
/// directory when no state directory exists (macOS, Windows).
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("echo-sleuth").join("echo-sleuth.log")
    } else {
        PathBuf::from("echo-sleuth.log")
    }
}

/// Read and parse the config file at `path`.
///
/// `Ok(None)` when the file does not exist.
///
/// # Errors
///
/// Fails when the file exists but cannot be read or is not valid TOML.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// `<config_dir>/echo-sleuth/config.toml`, when the platform has a config dir.
///
/// Returns `~/.config/echo-sleuth/config.toml` on Linux, appropriate path on
/// other platforms. Returns `None` if no config directory can be determined.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("echo-sleuth").join("config.toml"))
}

/// Locate and load the config file.
///
/// Lookup order:
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `ECHO_SLEUTH_CONFIG` environment variable
/// 3. Default path `~/.config/echo-sleuth/config.toml`
///
/// A file that does not exist is skipped.
///
/// # Errors
///
/// Fails only for a config file that exists but is unreadable or invalid.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Overlay `ECHO_SLEUTH_PROJECTS_DIR` when it is set and non-empty.
///
/// Checks for:
/// - `ECHO_SLEUTH_PROJECTS_DIR`: Override projects directory (ignored when empty)
pub fn apply_env_overrides(mut config: ResolvedConfig) -> ResolvedConfig {
    if let Ok(dir) = std::env::var(PROJECTS_DIR_ENV_VAR) {
        if !dir.is_empty() {
            config.projects_dir = PathBuf::from(dir);
        }
    }

    config
}

/// Fill a [`ResolvedConfig`] from an optional config file.
///
/// Fields the file leaves out keep their defaults.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    ResolvedConfig {
        projects_dir: config.projects_dir.unwrap_or(defaults.projects_dir),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
        snapshot_scan_threshold: config
            .snapshot_scan_threshold
            .unwrap_or(defaults.snapshot_scan_threshold),
        snapshot_chunk_size: config
            .snapshot_chunk_size
            .unwrap_or(defaults.snapshot_chunk_size),
        list_limit: config.list_limit.unwrap_or(defaults.list_limit),
    }
}

/// Overlay command-line flags.
///
/// Flags win over every other source.
/// `None` leaves the current value alone.
///
/// Defaults, then config file, then environment, then flags.
pub fn apply_cli_overrides(
    mut config: ResolvedConfig,
    projects_dir_override: Option<PathBuf>,
    log_file_override: Option<PathBuf>,
) -> ResolvedConfig {
    if let Some(dir) = projects_dir_override {
        config.projects_dir = dir;
    }

    if let Some(path) = log_file_override {
        config.log_file_path = path;
    }

    config
}

/// Run the whole chain: file (by precedence) → env → CLI.
///
/// # Errors
///
/// Fails only for a config file that exists but is unreadable or invalid.
pub fn resolve_config(
    config_path: Option<PathBuf>,
    projects_dir_override: Option<PathBuf>,
    log_file_override: Option<PathBuf>,
) -> Result<ResolvedConfig, ConfigError> {
    let file = load_config_with_precedence(config_path)?;
    let config = apply_env_overrides(merge_config(file));
    Ok(apply_cli_overrides(
        config,
        projects_dir_override,
        log_file_override,
    ))
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
