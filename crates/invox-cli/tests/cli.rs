use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

/// Command isolated from the user's config, stored settings and environment.
fn invox(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("invox").unwrap();
    cmd.env_remove("GEMINI_API_KEY")
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .arg("--data-dir")
        .arg(home.join("settings"));
    cmd
}

#[test]
fn test_extract_missing_file() {
    let home = TempDir::new().unwrap();

    invox(home.path())
        .args(["extract", "does-not-exist.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_extract_without_api_key_fails_before_network() {
    let home = TempDir::new().unwrap();
    let image = home.path().join("invoice.png");
    fs::write(&image, PNG_HEADER).unwrap();

    invox(home.path())
        .arg("extract")
        .arg(&image)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no API key configured"));
}

#[test]
fn test_blank_env_key_falls_back_to_stored_key() {
    let home = TempDir::new().unwrap();
    let image = home.path().join("invoice.png");
    fs::write(&image, PNG_HEADER).unwrap();

    // Nothing listens on port 9, so a credentialed run stops at the transport.
    let config = home.path().join("invox.json");
    fs::write(
        &config,
        r#"{"api": {"endpoint": "http://127.0.0.1:9", "timeout_secs": 5}}"#,
    )
    .unwrap();

    invox(home.path())
        .args(["key", "set", "AIzaStoredKey"])
        .assert()
        .success();

    invox(home.path())
        .env("GEMINI_API_KEY", "")
        .args(["key", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Using stored key AIza"));

    invox(home.path())
        .env("GEMINI_API_KEY", "")
        .arg("--config")
        .arg(&config)
        .arg("extract")
        .arg(&image)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no API key configured").not())
        .stderr(predicate::str::contains("Extraction failed"));
}

#[test]
fn test_extract_rejects_unsupported_file() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("notes.txt");
    fs::write(&file, "just text").unwrap();

    invox(home.path())
        .arg("extract")
        .arg(&file)
        .args(["--api-key", "test-key"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("notes.txt"));
}

#[test]
fn test_models_list_shows_default_active() {
    let home = TempDir::new().unwrap();

    invox(home.path())
        .args(["models", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gemini-2.5-flash"))
        .stdout(predicate::str::contains("gemini-2.5-pro"))
        .stdout(predicate::str::contains("(active)"));
}

#[test]
fn test_models_use_persists_choice() {
    let home = TempDir::new().unwrap();

    invox(home.path())
        .args(["models", "use", "pro"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gemini-2.5-pro"));

    let stored = fs::read_to_string(home.path().join("settings").join("gemini_model")).unwrap();
    assert_eq!(stored.trim(), "gemini-2.5-pro");
}

#[test]
fn test_models_use_rejects_unknown_model() {
    let home = TempDir::new().unwrap();

    invox(home.path())
        .args(["models", "use", "gpt-4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("gemini-2.5-flash"));
}

#[test]
fn test_key_set_status_clear() {
    let home = TempDir::new().unwrap();

    invox(home.path())
        .args(["key", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No API key configured"));

    invox(home.path())
        .args(["key", "set", "AIzaStoredKey"])
        .assert()
        .success();

    invox(home.path())
        .args(["key", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Using stored key AIza"));

    invox(home.path()).args(["key", "clear"]).assert().success();

    invox(home.path())
        .args(["key", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No API key configured"));
}

#[test]
fn test_key_status_prefers_environment() {
    let home = TempDir::new().unwrap();

    invox(home.path())
        .env("GEMINI_API_KEY", "envkey123")
        .args(["key", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("GEMINI_API_KEY"));
}

#[test]
fn test_config_init_get_set() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("invox.json");

    invox(home.path())
        .arg("--config")
        .arg(&config)
        .args(["config", "init"])
        .assert()
        .success();
    assert!(config.exists());

    invox(home.path())
        .arg("--config")
        .arg(&config)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    invox(home.path())
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "extraction.default_currency", "EUR"])
        .assert()
        .success();

    invox(home.path())
        .arg("--config")
        .arg(&config)
        .args(["config", "get", "extraction.default_currency"])
        .assert()
        .success()
        .stdout(predicate::str::contains("EUR"));

    invox(home.path())
        .arg("--config")
        .arg(&config)
        .args(["config", "get", "extraction.missing"])
        .assert()
        .failure();
}

#[test]
fn test_config_path_reports_missing_file() {
    let home = TempDir::new().unwrap();

    invox(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.json"))
        .stdout(predicate::str::contains("not created"));
}
