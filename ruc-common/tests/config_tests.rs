//! Configuration file resolution and graceful degradation
//!
//! Tests that touch `RUC_CONFIG` are marked `#[serial]` so they never race
//! on the process environment.

use ruc_common::config::{
    load_toml_config, resolve_config_path, AppConfig, CliOverrides, CONFIG_ENV_VAR, DEFAULT_PORT,
};
use serial_test::serial;
use std::env;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
#[serial]
fn test_env_var_names_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ruc.toml");
    fs::write(&path, "port = 6100\n").unwrap();

    env::set_var(CONFIG_ENV_VAR, &path);
    let resolved = resolve_config_path(None);
    let config = AppConfig::load(&CliOverrides::default());
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(resolved, Some(path));
    assert_eq!(config.port, 6100);
}

#[test]
#[serial]
fn test_cli_path_beats_env_var() {
    let dir = TempDir::new().unwrap();
    let env_path = dir.path().join("env.toml");
    let cli_path = dir.path().join("cli.toml");
    fs::write(&env_path, "port = 6100\n").unwrap();
    fs::write(&cli_path, "port = 6200\n").unwrap();

    env::set_var(CONFIG_ENV_VAR, &env_path);
    let config = AppConfig::load(&CliOverrides {
        config: Some(cli_path),
        ..Default::default()
    });
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(config.port, 6200);
}

#[test]
#[serial]
fn test_missing_config_file_falls_back_to_defaults() {
    let config = AppConfig::load(&CliOverrides {
        config: Some(PathBuf::from("/nonexistent/ruclasses/config.toml")),
        ..Default::default()
    });
    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.log_level, "info");
}

#[test]
#[serial]
fn test_malformed_config_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "port = \"not a number\"\n[[[").unwrap();

    assert!(load_toml_config(&path).is_err());

    let config = AppConfig::load(&CliOverrides {
        config: Some(path),
        port: Some(7001),
        ..Default::default()
    });
    assert_eq!(config.port, 7001, "CLI values still apply when the file is bad");
}

#[test]
fn test_subject_override_replaces_catalog() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("subjects.toml");
    fs::write(
        &path,
        r#"
[[subjects]]
code = "750"
name = "Physics"

[[subjects]]
code = "160"
name = "Chemistry"
"#,
    )
    .unwrap();

    let config = AppConfig::from_parts(load_toml_config(&path).unwrap(), &CliOverrides::default());
    let codes: Vec<&str> = config.catalog.subjects().iter().map(|s| s.code.as_str()).collect();
    assert_eq!(codes, vec!["750", "160"]);
    assert_eq!(config.catalog.get("750").unwrap().name, "Physics");
}
