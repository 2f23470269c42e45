//! Integration tests driving the compiled hook binary.
//!
//! The transparent post-start path needs root and a live nftables; that
//! test is marked #[ignore]. Run with: `sudo cargo test -- --ignored`.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Helper to get the path to the compiled binary
fn get_binary_path() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // Remove test binary name
    path.pop(); // Remove deps directory
    path.push("v2raya-hook");
    path
}

/// Run the hook binary and return output
fn run_hook(args: &[&str]) -> Output {
    Command::new(get_binary_path())
        .args(args)
        .output()
        .expect("Failed to execute v2raya-hook")
}

/// Check if running as root
fn is_root() -> bool {
    Command::new("id")
        .arg("-u")
        .output()
        .map(|o| String::from_utf8_lossy(&o.stdout).trim() == "0")
        .unwrap_or(false)
}

fn confdir_with_custom_config() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("custom_config.json"),
        r#"{
  "fake_dns_exclude_domains": ["geosite:cn"],
  "bypass_users": [1000],
  "common_ports": [22, 80, 443]
}
"#,
    )
    .unwrap();
    dir
}

fn confdir_arg(dir: &TempDir) -> String {
    format!("--v2raya-confdir={}", dir.path().display())
}

#[test]
fn test_help() {
    let output = run_hook(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("core"));
    assert!(stdout.contains("transparent"));
}

#[test]
fn test_noop_stages_exit_zero_without_side_effects() {
    let dir = confdir_with_custom_config();
    let confdir = confdir_arg(&dir);

    for args in [
        ["core", "--stage=pre-stop", confdir.as_str()],
        ["core", "--stage=post-start", confdir.as_str()],
        ["core", "--stage=post-stop", confdir.as_str()],
        ["transparent", "--stage=pre-start", confdir.as_str()],
        ["transparent", "--stage=pre-stop", confdir.as_str()],
        ["transparent", "--stage=post-stop", confdir.as_str()],
    ] {
        let output = run_hook(&args);
        assert!(output.status.success(), "expected exit 0 for {:?}", args);
    }

    // No handler ran, so no core config was ever created.
    assert!(!dir.path().join("config.json").exists());
}

#[test]
fn test_unknown_argument_is_ignored() {
    let dir = confdir_with_custom_config();
    let output = run_hook(&[
        "core",
        "--stage=pre-stop",
        "--introduced-later=1",
        &confdir_arg(&dir),
    ]);
    assert!(output.status.success());
}

#[test]
fn test_missing_custom_config_exits_one() {
    let dir = TempDir::new().unwrap();
    let output = run_hook(&["core", "--stage=pre-start", &confdir_arg(&dir)]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("custom config"));
}

#[test]
fn test_core_pre_start_patches_config() {
    let dir = confdir_with_custom_config();
    let config_path = dir.path().join("config.json");
    fs::write(
        &config_path,
        r#"{
  "inbounds": [
    { "tag": "transparent", "sniffing": { "destOverride": ["http", "tls"] } },
    { "tag": "socks", "sniffing": { "destOverride": ["http"] } }
  ],
  "dns": { "servers": [{ "address": "223.5.5.5" }] },
  "routing": { "domainStrategy": "AsIs" }
}
"#,
    )
    .unwrap();

    let output = run_hook(&["core", "--stage=pre-start", &confdir_arg(&dir)]);
    assert!(
        output.status.success(),
        "stdout: {}",
        String::from_utf8_lossy(&output.stdout)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("v2rayA core hook pre-start finished"));

    let patched: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&config_path).unwrap()).unwrap();
    assert_eq!(
        patched["inbounds"][0]["sniffing"]["destOverride"],
        serde_json::json!(["http", "tls", "fakedns"])
    );
    assert_eq!(
        patched["inbounds"][1]["sniffing"]["destOverride"],
        serde_json::json!(["http"])
    );
    assert_eq!(
        patched["dns"]["servers"][0],
        serde_json::json!({ "address": "fakedns" })
    );
    assert_eq!(
        patched["dns"]["servers"][1]["domains"],
        serde_json::json!(["geosite:cn"])
    );
    assert_eq!(patched["dns"]["domainMatcher"], "mph");
    assert_eq!(patched["routing"]["domainStrategy"], "IpIfNonMatch");
}

#[test]
fn test_core_pre_start_without_core_config_exits_one() {
    let dir = confdir_with_custom_config();
    let output = run_hook(&["core", "--stage=pre-start", &confdir_arg(&dir)]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("config.json"));
}

#[test]
fn test_core_pre_start_with_malformed_core_config_exits_one() {
    let dir = confdir_with_custom_config();
    fs::write(dir.path().join("config.json"), "{ broken").unwrap();

    let output = run_hook(&["core", "--stage=pre-start", &confdir_arg(&dir)]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Failed to parse"));
}

#[test]
fn test_invalid_custom_config_values_exit_one() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("custom_config.json"),
        r#"{ "bypass_users": ["1000; flush ruleset"] }"#,
    )
    .unwrap();

    let output = run_hook(&["transparent", "--stage=post-start", &confdir_arg(&dir)]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("invalid uid"));
}

#[test]
#[ignore] // Requires root and nftables
fn test_transparent_post_start_against_live_nft() {
    if !is_root() {
        eprintln!("Skipping test_transparent_post_start_against_live_nft: requires root");
        return;
    }

    let dir = confdir_with_custom_config();
    let output = run_hook(&["transparent", "--stage=post-start", &confdir_arg(&dir)]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("v2rayA transparent hook post-start finished"));
}
