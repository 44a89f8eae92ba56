//! Tests for configuration loading and root folder resolution
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that touch RECIPE_ROOT_FOLDER are marked #[serial].

use recipe_common::config::{
    load_toml_config, CompiledDefaults, ConfigSource, RootFolderInitializer, RootFolderResolver,
    TomlConfig, DEFAULT_MAX_UPLOAD_BYTES, ROOT_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_compiled_defaults() {
    let defaults = CompiledDefaults::default();
    assert_eq!(defaults.port, 5000);
    assert_eq!(defaults.host, "0.0.0.0");
    assert_eq!(defaults.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    assert_eq!(defaults.log_level, "info");
    assert!(!defaults.root_folder.as_os_str().is_empty());
}

#[test]
fn test_toml_full_config() {
    let config = TomlConfig::from_toml_str(
        r#"
        root_folder = "/srv/recipes"
        host = "127.0.0.1"
        port = 8080
        max_upload_bytes = 1048576

        [logging]
        level = "debug"
        "#,
    )
    .unwrap();

    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/recipes")));
    assert_eq!(config.host.as_deref(), Some("127.0.0.1"));
    assert_eq!(config.port, Some(8080));
    assert_eq!(config.max_upload_bytes, Some(1_048_576));
    assert_eq!(config.logging.level, "debug");
}

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let root_folder = RootFolderResolver::new("test").resolve();
    assert_eq!(root_folder, CompiledDefaults::default().root_folder);
}

#[test]
#[serial]
fn test_resolver_priority_order() {
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/recipe-toml")),
        ..Default::default()
    };

    env::remove_var(ROOT_FOLDER_ENV);
    let from_toml = RootFolderResolver::new("test").with_toml(&toml).resolve();
    assert_eq!(from_toml, PathBuf::from("/tmp/recipe-toml"));

    env::set_var(ROOT_FOLDER_ENV, "/tmp/recipe-env");
    let from_env = RootFolderResolver::new("test").with_toml(&toml).resolve();
    assert_eq!(from_env, PathBuf::from("/tmp/recipe-env"));

    let from_cli = RootFolderResolver::new("test")
        .with_toml(&toml)
        .with_cli_arg(Some(PathBuf::from("/tmp/recipe-cli")))
        .resolve();
    assert_eq!(from_cli, PathBuf::from("/tmp/recipe-cli"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
fn test_load_explicit_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "port = 6001\nhost = \"127.0.0.1\"\n").unwrap();

    let (config, source) = load_toml_config(Some(&path)).unwrap();
    assert_eq!(config.port, Some(6001));
    assert_eq!(config.host.as_deref(), Some("127.0.0.1"));
    assert_eq!(source, ConfigSource::File(path));
}

#[test]
fn test_invalid_explicit_config_is_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "port = [").unwrap();

    assert!(load_toml_config(Some(&path)).is_err());
}

#[test]
fn test_missing_explicit_config_is_error() {
    let dir = TempDir::new().unwrap();
    let result = load_toml_config(Some(&dir.path().join("absent.toml")));
    assert!(result.is_err());
}

#[test]
fn test_initializer_creates_layout() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("data");

    let initializer = RootFolderInitializer::new(root.clone());
    initializer.ensure_directory_exists().unwrap();

    assert!(root.is_dir());
    assert!(initializer.uploads_path().is_dir());
    assert_eq!(initializer.database_path(), root.join("recipes.db"));

    // Idempotent
    initializer.ensure_directory_exists().unwrap();
}
