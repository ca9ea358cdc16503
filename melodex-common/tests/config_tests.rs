//! Tests for bootstrap configuration loading and graceful degradation
//!
//! - Missing TOML files do not cause failure
//! - TOML values are parsed per section with defaults for omitted keys
//! - Environment variables override TOML values
//!
//! Note: Uses serial_test to prevent ENV variable race conditions.

use melodex_common::config::{
    default_config_path, default_database_path, Environment, TomlConfig, ENV_OPENAI_API_KEY,
    ENV_SPOTIFY_CLIENT_ID,
};
use melodex_common::Error;
use serial_test::serial;
use std::env;
use std::path::PathBuf;

#[test]
fn test_missing_config_file_uses_defaults() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = TomlConfig::load(&temp_dir.path().join("absent.toml")).unwrap();

    assert_eq!(config.server.bind_addr, "127.0.0.1:5780");
    assert_eq!(config.catalog.client_id, None);
}

#[test]
fn test_partial_config_file_fills_defaults() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[server]
bind_addr = "0.0.0.0:8080"
database_path = "/srv/melodex/melodex.db"
environment = "development"

[catalog]
client_id = "from-toml"
cache_token = false
"#,
    )
    .unwrap();

    let config = TomlConfig::load(&path).unwrap();

    assert_eq!(config.server.bind_addr, "0.0.0.0:8080");
    assert_eq!(
        config.database_path(),
        PathBuf::from("/srv/melodex/melodex.db")
    );
    assert_eq!(config.server.environment, Environment::Development);
    assert_eq!(config.catalog.client_id.as_deref(), Some("from-toml"));
    assert!(!config.catalog.cache_token);
    assert_eq!(
        config.catalog.token_url,
        "https://accounts.spotify.com/api/token"
    );
    assert_eq!(config.completion.timeout_secs, 10);
}

#[test]
fn test_malformed_config_file_is_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[server\nbind_addr = ").unwrap();

    assert!(matches!(TomlConfig::load(&path), Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_env_overrides_take_priority_over_toml() {
    env::set_var(ENV_SPOTIFY_CLIENT_ID, "from-env");
    env::set_var(ENV_OPENAI_API_KEY, "sk-test");

    let mut config = TomlConfig::default();
    config.catalog.client_id = Some("from-toml".to_string());
    config.apply_env_overrides().unwrap();

    assert_eq!(config.catalog.client_id.as_deref(), Some("from-env"));
    assert_eq!(config.completion.api_key.as_deref(), Some("sk-test"));

    env::remove_var(ENV_SPOTIFY_CLIENT_ID);
    env::remove_var(ENV_OPENAI_API_KEY);
}

#[test]
fn test_default_paths_are_under_melodex_folder() {
    assert!(default_config_path().to_string_lossy().contains("melodex"));
    assert!(default_database_path().ends_with("melodex.db"));
}
