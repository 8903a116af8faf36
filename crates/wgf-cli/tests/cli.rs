//! Binary-level tests for `wg-federation`.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const PASSPHRASE: &str = "correct horse battery staple";

// ============================================================================
// Helper Functions
// ============================================================================

fn wg_federation(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("wg-federation").expect("binary");
    cmd.env_clear()
        .env("WG_FEDERATION_STATE_DIR", dir.path().join("state"))
        .env("WG_FEDERATION_WIREGUARD_DIR", dir.path().join("wireguard"))
        .env("WG_FEDERATION_LOCK_TIMEOUT_SECS", "5");
    cmd
}

fn bootstrapped() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    wg_federation(&dir).args(["salt", "create"]).assert().success();
    wg_federation(&dir)
        .env("WG_FEDERATION_ROOT_PASSPHRASE", PASSPHRASE)
        .args(["hq", "bootstrap"])
        .assert()
        .success();
    dir
}

fn ini(dir: &TempDir, relative: &str) -> String {
    std::fs::read_to_string(dir.path().join("wireguard").join(relative)).expect("ini")
}

// ============================================================================
// Commands
// ============================================================================

#[test]
fn test_bootstrap_writes_interface_files() {
    let dir = bootstrapped();
    for relative in [
        "interfaces/wg-federation0.conf",
        "forums/wgf-forum0.conf",
        "phone_lines/wgf-phoneline0.conf",
    ] {
        assert!(ini(&dir, relative).starts_with("[Interface]\n"));
    }
    assert!(dir.path().join("state/state.json").is_file());
}

#[test]
fn test_get_private_key_matches_file() {
    let dir = bootstrapped();
    let output = wg_federation(&dir)
        .env("WG_FEDERATION_ROOT_PASSPHRASE", PASSPHRASE)
        .args([
            "hq",
            "get-private-key",
            "--interface-kind",
            "forums",
            "--interface-name",
            "wgf-forum0",
        ])
        .output()
        .expect("run");
    assert!(output.status.success());

    let key = String::from_utf8(output.stdout).expect("utf8");
    assert!(ini(&dir, "forums/wgf-forum0.conf").contains(&format!("PrivateKey = {key}")));
}

#[test]
fn test_reconcile_json_output() {
    let dir = bootstrapped();
    wg_federation(&dir)
        .env("WG_FEDERATION_ROOT_PASSPHRASE", PASSPHRASE)
        .args(["hq", "reconcile", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"federation\": \"wg-federation0\""));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_missing_passphrase_fails() {
    let dir = bootstrapped();
    wg_federation(&dir)
        .args(["hq", "reconcile"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("root passphrase"));
}

#[test]
fn test_bootstrap_without_passphrase_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    wg_federation(&dir).args(["salt", "create"]).assert().success();
    wg_federation(&dir)
        .args(["hq", "bootstrap"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("root passphrase"));
    assert!(!dir.path().join("wireguard").exists());
}

#[test]
fn test_wrong_passphrase_fails() {
    let dir = bootstrapped();
    wg_federation(&dir)
        .env("WG_FEDERATION_ROOT_PASSPHRASE", "wrong")
        .args(["hq", "reconcile"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: "));
}

#[test]
fn test_unknown_interface_fails() {
    let dir = bootstrapped();
    wg_federation(&dir)
        .env("WG_FEDERATION_ROOT_PASSPHRASE", PASSPHRASE)
        .args([
            "hq",
            "get-private-key",
            "--interface-kind",
            "interfaces",
            "--interface-name",
            "wg9",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no interfaces configuration named 'wg9'"));
}
