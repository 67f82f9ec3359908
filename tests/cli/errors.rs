//! Tests for error handling and global CLI flags.

use crate::support::*;
use predicates::prelude::*;

#[test]
fn test_help_lists_commands() {
    let t = Test::new();

    let output = t.exec(&["--help"]);
    assert_success(&output);
    for command in ["put", "get", "sync", "run", "json", "completion"] {
        assert_stdout_contains(&output, command);
    }
}

#[test]
fn test_unknown_command_fails() {
    let t = Test::new();
    assert_failure(&t.exec(&["unknown-command"]));
}

#[test]
fn test_version_flag() {
    let t = Test::new();

    t.cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("vault-env"));
}

#[test]
fn test_missing_vault_addr() {
    let t = Test::new();

    let output = t.put("app/token", "x");
    assert_failure(&output);
    assert_stderr_contains(&output, "VAULT_ADDR environment variable is required");
    assert_stderr_contains(&output, "--vault-addr");
}

#[test]
fn test_missing_token() {
    let t = Test::new();

    let output = t
        .cmd()
        .env("VAULT_ADDR", "http://127.0.0.1:1")
        .args(["get", "-p", "app"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "VAULT_TOKEN is required for token auth");
}

#[test]
fn test_unsupported_auth_method() {
    let t = Test::new();

    let output = t
        .cmd()
        .env("VAULT_ADDR", "http://127.0.0.1:1")
        .env("VAULT_AUTH_METHOD", "ldap")
        .args(["get", "-p", "app"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "unsupported auth method: ldap");
}

#[test]
fn test_invalid_transit_toggle() {
    let t = Test::new();

    let output = t
        .cmd()
        .env("TRANSIT", "maybe")
        .args(["json"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "maybe");
}

#[test]
fn test_unreachable_server_names_operation() {
    let t = Test::new();

    let output = t
        .cmd()
        .env("VAULT_ADDR", "http://127.0.0.1:1")
        .env("VAULT_TOKEN", "hvs.x")
        .args(["get", "-p", "app"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "kv get");
}

#[test]
fn test_rejected_token_reports_status() {
    let t = Test::with_records(&[("kv/app/token", &[("value", "x")])]);

    let output = t
        .cmd()
        .env("VAULT_TOKEN", "hvs.wrong")
        .args(["get", "-p", "app/token"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "permission denied");
}

#[test]
fn test_verbose_flag_accepted() {
    let t = Test::new();
    t.write(".env", "A=1\n");

    assert_success(&t.exec(&["--verbose", "json"]));
}

#[test]
fn test_command_aliases() {
    let t = Test::new();
    t.write(".env", "A=1\n");

    assert_success(&t.exec(&["j"]));
}

#[test]
fn test_completion_scripts() {
    let t = Test::new();

    for shell in ["bash", "zsh", "fish", "power-shell", "elvish"] {
        t.cmd()
            .args(["completion", shell])
            .assert()
            .success()
            .stdout(predicate::str::contains("vault-env"));
    }
}

#[test]
fn test_completion_alias() {
    let t = Test::new();

    t.cmd()
        .args(["comp", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("put").and(predicate::str::contains("sync")));
}
