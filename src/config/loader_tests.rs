//! Tests for config file loading and precedence.

use super::*;
use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;

// ===== Helpers =====

/// Removes an env var on creation and again on drop.
struct EnvGuard(&'static str);

impl EnvGuard {
    fn new(var: &'static str) -> Self {
        env::remove_var(var);
        Self(var)
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        env::remove_var(self.0);
    }
}

fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, contents).expect("write config");
    path
}

// ===== load_config_file =====

#[test]
fn missing_file_is_not_an_error() {
    let dir = TempDir::new().unwrap();
    let result = load_config_file(dir.path().join("absent.toml"));
    assert_eq!(result, Ok(None), "Missing config file should give Ok(None)");
}

#[test]
fn parses_all_fields() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
projects_dir = "/data/projects"
log_file_path = "/tmp/es.log"
snapshot_scan_threshold = 1000
snapshot_chunk_size = 64
list_limit = 7
"#,
    );

    let config = load_config_file(&path)
        .expect("should parse")
        .expect("file exists");
    assert_eq!(config.projects_dir, Some(PathBuf::from("/data/projects")));
    assert_eq!(config.log_file_path, Some(PathBuf::from("/tmp/es.log")));
    assert_eq!(config.snapshot_scan_threshold, Some(1000));
    assert_eq!(config.snapshot_chunk_size, Some(64));
    assert_eq!(config.list_limit, Some(7));
}

#[test]
fn empty_file_gives_all_none() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");
    let config = load_config_file(&path).unwrap().unwrap();
    assert_eq!(config, ConfigFile::default());
}

#[test]
fn unknown_key_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "theme = \"dark\"\n");
    let result = load_config_file(&path);
    assert!(
        matches!(result, Err(ConfigError::ParseError { .. })),
        "Unknown keys should be rejected, got: {:?}",
        result
    );
}

#[test]
fn invalid_toml_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "list_limit = = 3");
    let err = load_config_file(&path).unwrap_err();
    match err {
        ConfigError::ParseError { path: p, .. } => assert_eq!(p, path),
        other => panic!("expected ParseError, got {other:?}"),
    }
}

#[test]
fn directory_path_is_a_read_error() {
    let dir = TempDir::new().unwrap();
    let result = load_config_file(dir.path());
    assert!(
        matches!(result, Err(ConfigError::ReadError { .. })),
        "Reading a directory should fail, got: {:?}",
        result
    );
}

// ===== merge_config =====

#[test]
fn merge_without_file_gives_defaults() {
    let resolved = merge_config(None);
    assert_eq!(resolved, ResolvedConfig::default());
    assert_eq!(resolved.list_limit, DEFAULT_LIST_LIMIT);
    assert_eq!(resolved.snapshot_scan_threshold, DEFAULT_FORWARD_THRESHOLD);
    assert_eq!(resolved.snapshot_chunk_size, DEFAULT_CHUNK_SIZE);
}

#[test]
fn merge_takes_set_fields_and_keeps_defaults_for_rest() {
    let file = ConfigFile {
        list_limit: Some(3),
        snapshot_chunk_size: Some(16),
        ..ConfigFile::default()
    };
    let resolved = merge_config(Some(file));
    assert_eq!(resolved.list_limit, 3);
    assert_eq!(resolved.snapshot_chunk_size, 16);
    assert_eq!(resolved.projects_dir, default_projects_dir());
    assert_eq!(resolved.snapshot_scan_threshold, DEFAULT_FORWARD_THRESHOLD);
}

#[test]
fn scan_options_mirror_resolved_values() {
    let config = ResolvedConfig {
        snapshot_scan_threshold: 10,
        snapshot_chunk_size: 4,
        ..ResolvedConfig::default()
    };
    let opts = config.scan_options();
    assert_eq!(opts.forward_threshold, 10);
    assert_eq!(opts.chunk_size, 4);
}

#[test]
fn default_projects_dir_ends_with_claude_projects() {
    let dir = default_projects_dir();
    assert!(
        dir.ends_with(".claude/projects"),
        "Unexpected default projects dir: {:?}",
        dir
    );
}

// ===== Overrides =====

#[test]
fn cli_overrides_win_when_set() {
    let base = ResolvedConfig::default();
    let resolved = apply_cli_overrides(
        base.clone(),
        Some(PathBuf::from("/cli/projects")),
        Some(PathBuf::from("/cli/log")),
    );
    assert_eq!(resolved.projects_dir, PathBuf::from("/cli/projects"));
    assert_eq!(resolved.log_file_path, PathBuf::from("/cli/log"));

    let untouched = apply_cli_overrides(base.clone(), None, None);
    assert_eq!(untouched, base, "Unset CLI flags should change nothing");
}

#[test]
#[serial(echo_sleuth_config)]
fn env_overrides_projects_dir() {
    let _guard = EnvGuard::new(PROJECTS_DIR_ENV_VAR);
    env::set_var(PROJECTS_DIR_ENV_VAR, "/env/projects");

    let resolved = apply_env_overrides(ResolvedConfig::default());
    assert_eq!(resolved.projects_dir, PathBuf::from("/env/projects"));
}

#[test]
#[serial(echo_sleuth_config)]
fn empty_env_value_is_ignored() {
    let _guard = EnvGuard::new(PROJECTS_DIR_ENV_VAR);
    env::set_var(PROJECTS_DIR_ENV_VAR, "");

    let resolved = apply_env_overrides(ResolvedConfig::default());
    assert_eq!(resolved.projects_dir, default_projects_dir());
}

// ===== Precedence =====

#[test]
#[serial(echo_sleuth_config)]
fn env_config_path_is_used_without_explicit_path() {
    let _guard = EnvGuard::new(CONFIG_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "list_limit = 9\n");
    env::set_var(CONFIG_ENV_VAR, &path);

    let config = load_config_with_precedence(None)
        .expect("should load")
        .expect("env config exists");
    assert_eq!(config.list_limit, Some(9));
}

#[test]
#[serial(echo_sleuth_config)]
fn explicit_path_beats_env_config_path() {
    let _guard = EnvGuard::new(CONFIG_ENV_VAR);
    let env_dir = TempDir::new().unwrap();
    let env_path = write_config(&env_dir, "list_limit = 1\n");
    env::set_var(CONFIG_ENV_VAR, &env_path);

    let cli_dir = TempDir::new().unwrap();
    let cli_path = write_config(&cli_dir, "list_limit = 2\n");

    let config = load_config_with_precedence(Some(cli_path))
        .expect("should load")
        .expect("explicit config exists");
    assert_eq!(
        config.list_limit,
        Some(2),
        "Explicit --config path should take precedence over env var"
    );
}

#[test]
#[serial(echo_sleuth_config)]
fn resolve_config_applies_whole_chain() {
    let _config_guard = EnvGuard::new(CONFIG_ENV_VAR);
    let _dir_guard = EnvGuard::new(PROJECTS_DIR_ENV_VAR);

    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "projects_dir = \"/file/projects\"\nlist_limit = 4\n",
    );
    env::set_var(PROJECTS_DIR_ENV_VAR, "/env/projects");

    let resolved = resolve_config(Some(path.clone()), None, None).unwrap();
    assert_eq!(resolved.projects_dir, PathBuf::from("/env/projects"));
    assert_eq!(resolved.list_limit, 4);

    let resolved = resolve_config(Some(path), Some(PathBuf::from("/cli")), None).unwrap();
    assert_eq!(resolved.projects_dir, PathBuf::from("/cli"));
}

#[test]
fn resolve_config_surfaces_parse_errors() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "list_limit = \"many\"\n");
    assert!(matches!(
        resolve_config(Some(path), None, None),
        Err(ConfigError::ParseError { .. })
    ));
}
