//! Config file error-message and round-trip integration tests.

use assert_fs::prelude::*;
use dolisync_core::{
    config::{self, ENV_BASE_URL},
    Config, ConfigError,
};
use predicates::prelude::*;

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn corrupt_yaml_returns_parse_error_with_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let file = home.child(".dolisync/config.yaml");
    file.write_str("api: : : broken\n  - [unclosed").expect("write");

    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("config.yaml"), "got: {err}");
}

#[test]
fn wrong_type_yaml_returns_parse_error() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".dolisync/config.yaml")
        .write_str("- a list\n- not a mapping\n")
        .expect("write");

    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
}

#[test]
fn empty_file_means_defaults() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".dolisync/config.yaml").write_str("\n").expect("write");
    assert_eq!(config::load_at(home.path()).expect("load"), Config::default());
}

// ---------------------------------------------------------------------------
// 2. Partial files and explicit paths
// ---------------------------------------------------------------------------

#[test]
fn partial_file_keeps_defaults_for_other_keys() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("custom.yaml");
    file.write_str("api:\n  api_key: secret\nbulletin:\n  subject: Weekly\n")
        .expect("write");

    let loaded = config::load_from(file.path()).expect("load");
    assert_eq!(loaded.api.api_key, "secret");
    assert_eq!(loaded.api.base_url, "http://localhost/api/index.php");
    assert_eq!(loaded.bulletin.subject, "Weekly");
    assert_eq!(loaded.bulletin.email_from, "no-reply@tudominio.com");
}

#[test]
fn saved_file_round_trips_and_is_readable_yaml() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let mut cfg = Config::default();
    cfg.api.api_key = "k-123".into();
    cfg.apply_env(vec![(ENV_BASE_URL.to_string(), "https://crm.example/api/index.php".to_string())])
        .expect("env");
    config::save_at(home.path(), &cfg).expect("save");

    home.child(".dolisync/config.yaml")
        .assert(predicate::str::contains("https://crm.example/api/index.php"));
    assert_eq!(config::load_at(home.path()).expect("load"), cfg);
    assert!(cfg.validate().is_ok());
}
