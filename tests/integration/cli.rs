//! The `plugin-deps` binary, driven through `assert_cmd`.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary workspace with its own config file and cache location.
struct CliEnv {
    temp: TempDir,
}

impl CliEnv {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let env = Self {
            temp,
        };
        env.write_config("");
        env
    }

    fn path(&self) -> &Path {
        self.temp.path()
    }

    fn cache_path(&self) -> PathBuf {
        self.path().join("metadata-cache.json")
    }

    /// Write `config.toml` with the cache pointed into the workspace, plus `extra`.
    fn write_config(&self, extra: &str) {
        let content = format!("[cache]\npath = '{}'\n\n{extra}", self.cache_path().display());
        std::fs::write(self.path().join("config.toml"), content).unwrap();
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn file_url(&self, name: &str) -> String {
        format!("file://{}", self.path().join(name).display())
    }

    fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("plugin-deps").unwrap();
        cmd.arg("--config")
            .arg(self.path().join("config.toml"))
            .env("NO_COLOR", "1")
            .env("PLUGIN_DEPS_NO_PROGRESS", "1")
            .env_remove("RUST_LOG");
        cmd
    }
}

const CYCLIC_UNITS: &str = r#"
[[units]]
id = "a/a.php"
name = "A"
requires_plugins = "b, woocommerce"

[[units]]
id = "b/b.php"
name = "B"
requires_plugins = "a"
"#;

#[test]
fn test_parse_text_output() {
    let env = CliEnv::new();
    env.command()
        .args(["parse", "ext|https://example.com/ext.json", "a|b|c"])
        .assert()
        .success()
        .stdout(predicate::str::contains("identifier: ext"))
        .stdout(predicate::str::contains("endpoint:   https://example.com/ext.json"))
        .stdout(predicate::str::contains("identifier: a|b|c"))
        .stdout(predicate::str::contains("(none)"));
}

#[test]
fn test_parse_json_output() {
    let env = CliEnv::new();
    let output = env.command().args(["parse", "slug", "--format", "json"]).output().unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed[0]["token"], "slug");
    assert_eq!(parsed[0]["identifier"], "slug");
    assert!(parsed[0]["endpoint"].is_null());
}

#[test]
fn test_check_reports_missing_and_cycles() {
    let env = CliEnv::new();
    let units = env.write("units.toml", CYCLIC_UNITS);

    env.command()
        .arg("check")
        .arg("--units")
        .arg(&units)
        .assert()
        .success()
        .stdout(predicate::str::contains("Checked 2 units"))
        .stdout(predicate::str::contains("Missing dependencies:"))
        .stdout(predicate::str::contains("woocommerce (required by a/a.php)"))
        .stdout(predicate::str::contains("Dependency cycles:"));
}

#[test]
fn test_check_json_report() {
    let env = CliEnv::new();
    let units = env.write("units.toml", CYCLIC_UNITS);

    let output = env.command().arg("check").arg("--units").arg(&units).args(["-f", "json"]).output().unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["units"], 2);
    assert_eq!(report["missing"], serde_json::json!(["woocommerce"]));
    assert_eq!(report["cycles"].as_array().map(Vec::len), Some(1));
    assert_eq!(report["dependents"]["a"], serde_json::json!(["b/b.php"]));
}

#[test]
fn test_check_clean_json_units() {
    let env = CliEnv::new();
    let units = env.write(
        "units.json",
        r#"[{"id": "a/a.php", "requires_plugins": "b"}, {"id": "b/b.php"}]"#,
    );

    env.command()
        .arg("check")
        .arg("--units")
        .arg(&units)
        .assert()
        .success()
        .stdout(predicate::str::contains("All dependencies are installed"))
        .stdout(predicate::str::contains("No dependency cycles"));
}

#[test]
fn test_check_missing_units_file_fails() {
    let env = CliEnv::new();
    env.command()
        .arg("check")
        .arg("--units")
        .arg(env.path().join("absent.toml"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Units manifest not found"));
}

#[test]
#[cfg(unix)]
fn test_resolve_fetches_file_endpoint_and_synthesizes_the_rest() {
    let env = CliEnv::new();
    env.write("ext.json", r#"{"name": "Ext Plugin", "slug": "ext", "version": "1.2.3"}"#);
    let units = env.write(
        "units.toml",
        &format!("[[units]]\nid = \"a/a.php\"\nrequires_plugins = 'ext|{}, missing'\n", env.file_url("ext.json")),
    );

    env.command()
        .arg("resolve")
        .arg("--units")
        .arg(&units)
        .assert()
        .success()
        .stdout(predicate::str::contains("Ext Plugin 1.2.3"))
        .stdout(predicate::str::contains("missing (synthesized: manual installation required)"))
        .stdout(predicate::str::contains("Resolved 2 dependencies: 1 fetched, 1 synthesized"));

    assert!(env.cache_path().exists());

    // A second run is served from the persisted cache even without the source.
    std::fs::remove_file(env.path().join("ext.json")).unwrap();
    let output = env.command().arg("resolve").arg("--units").arg(&units).args(["ext", "-f", "json"]).output().unwrap();
    assert!(output.status.success());

    let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(records[0]["identifier"], "ext");
    assert_eq!(records[0]["name"], "Ext Plugin");
    assert_eq!(records[0]["origin"], "fetched");
}

#[test]
#[cfg(unix)]
fn test_resolve_refresh_bypasses_cache() {
    let env = CliEnv::new();
    env.write("ext.json", r#"{"name": "Ext Plugin"}"#);
    let units = env.write(
        "units.toml",
        &format!("[[units]]\nid = \"a/a.php\"\nrequires_plugins = 'ext|{}'\n", env.file_url("ext.json")),
    );

    env.command().arg("resolve").arg("--units").arg(&units).assert().success();

    std::fs::remove_file(env.path().join("ext.json")).unwrap();
    env.command()
        .arg("resolve")
        .arg("--units")
        .arg(&units)
        .arg("--refresh")
        .assert()
        .success()
        .stdout(predicate::str::contains("ext (synthesized: manual installation required)"));
}

#[test]
#[cfg(unix)]
fn test_configured_endpoint_is_used() {
    let env = CliEnv::new();
    env.write("woo.json", r#"{"name": "WooCommerce"}"#);
    env.write_config(&format!("[[endpoints]]\nidentifier = \"woo\"\nurl = '{}'\n", env.file_url("woo.json")));
    let units = env.write("units.toml", "[[units]]\nid = \"a/a.php\"\nrequires_plugins = \"woo\"\n");

    env.command()
        .arg("resolve")
        .arg("--units")
        .arg(&units)
        .assert()
        .success()
        .stdout(predicate::str::contains("WooCommerce"))
        .stdout(predicate::str::contains("1 fetched, 0 synthesized"));
}

#[test]
fn test_cache_show_and_clear() {
    let env = CliEnv::new();
    let units = env.write("units.toml", "[[units]]\nid = \"a/a.php\"\nrequires_plugins = \"missing\"\n");

    env.command()
        .args(["cache", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Metadata cache is empty"));

    env.command().arg("resolve").arg("--units").arg(&units).assert().success();

    env.command()
        .args(["cache", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("missing"))
        .stdout(predicate::str::contains("[synthesized]"));

    env.command().args(["cache", "clear"]).assert().success().stdout(predicate::str::contains("Cleared"));
    assert!(!env.cache_path().exists());

    env.command()
        .args(["cache", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No metadata cache at"));
}

#[test]
fn test_invalid_config_fails() {
    let env = CliEnv::new();
    env.write_config("[resolver]\nmax_concurrency = 0\n");

    env.command()
        .args(["cache", "show"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("max_concurrency"));
}

#[test]
fn test_malformed_config_is_reported_as_config_error() {
    let env = CliEnv::new();
    std::fs::write(env.path().join("config.toml"), "[resolver\n").unwrap();

    env.command()
        .args(["cache", "show"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Configuration error: Failed to parse config from"))
        .stderr(predicate::str::contains("config.toml"))
        .stderr(predicate::str::contains("units manifest").not());
}
