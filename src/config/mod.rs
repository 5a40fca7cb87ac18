//! Configuration module.
//!
//! Settings resolve from defaults, then the TOML config file, then
//! environment variables, then command-line flags.

pub mod loader;

pub use loader::{
    apply_cli_overrides, apply_env_overrides, default_config_path, default_log_path,
    default_projects_dir, load_config_file, load_config_with_precedence, merge_config,
    resolve_config, ConfigError, ConfigFile, ResolvedConfig, CONFIG_ENV_VAR, DEFAULT_LIST_LIMIT,
    PROJECTS_DIR_ENV_VAR,
};
