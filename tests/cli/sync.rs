//! Tests for `vault-env sync`.

use crate::support::*;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

#[test]
fn test_sync_writes_env_file() {
    let t = Test::with_records(&[("kv/app/db", DB_RECORD)]);
    t.write("vault-env.yaml", CONFIG_NEW_FORMAT);

    let output = t.sync();
    assert_success(&output);
    assert_stdout_contains(&output, "Generated .env with 2 secrets");

    assert_eq!(
        t.read(".env"),
        "DATABASE_HOST=localhost\nDATABASE_PASSWORD=hunter2\n"
    );
}

#[test]
fn test_sync_warns_for_optional_entries() {
    let t = Test::with_records(&[("kv/app/db", DB_RECORD)]);
    t.write("vault-env.yaml", CONFIG_NEW_FORMAT);

    let output = t.sync();
    assert_success(&output);
    assert_stderr_contains(&output, "OPTIONAL_VAR: secret not found: kv/app/optional");
}

#[test]
fn test_sync_old_format_whole_record() {
    let t = Test::with_records(&[("kv/app/token", &[("value", "tok-123")])]);
    t.write("vault-env.yaml", CONFIG_OLD_FORMAT);

    assert_success(&t.sync());
    assert_eq!(t.read(".env"), "API_TOKEN=tok-123\n");
}

#[test]
fn test_sync_required_failure_writes_nothing() {
    let t = Test::with_vault();
    t.write("vault-env.yaml", CONFIG_REQUIRED_MISSING);

    let output = t.sync();
    assert_failure(&output);
    assert_stderr_contains(&output, "gone");
    assert!(!t.path(".env").exists());
}

#[test]
fn test_sync_custom_config_and_output() {
    let t = Test::with_records(&[("kv/app/token", &[("value", "tok-123")])]);
    t.write("custom.yaml", CONFIG_OLD_FORMAT);

    let output = t.exec(&["sync", "-c", "custom.yaml", "-o", "out.env"]);
    assert_success(&output);
    assert_eq!(t.read("out.env"), "API_TOKEN=tok-123\n");
}

#[test]
fn test_sync_toml_config() {
    let t = Test::with_records(&[("kv/app/db", DB_RECORD)]);
    t.write(
        "vault-env.toml",
        "[[secrets]]\npath = \"app/db\"\nkey = \"DB_PORT\"\nenv_key = \"PORT\"\n",
    );

    assert_success(&t.exec(&["sync", "-c", "vault-env.toml"]));
    assert_eq!(t.read(".env"), "PORT=5432\n");
}

#[test]
fn test_sync_decrypts_encrypted_fields() {
    let t = Test::with_vault();
    t.vault().seed(
        "kv/app/db",
        &[
            ("DB_HOST", "localhost"),
            ("DB_PASS", FakeVault::seal("app-key", "hunter2").as_str()),
        ],
    );
    t.write(
        "vault-env.yaml",
        "transit:\n  key: app-key\nsecrets:\n  - path: app/db\n",
    );

    let output = t.sync();
    assert_success(&output);
    assert_eq!(t.read(".env"), "DB_HOST=localhost\nDB_PASS=hunter2\n");
}

#[test]
fn test_sync_missing_config() {
    let t = Test::with_vault();

    let output = t.sync();
    assert_failure(&output);
    assert_stderr_contains(&output, "vault-env.yaml");
}

#[cfg(unix)]
#[test]
fn test_sync_env_file_is_owner_only() {
    let t = Test::with_records(&[("kv/app/token", &[("value", "tok-123")])]);
    t.write("vault-env.yaml", CONFIG_OLD_FORMAT);

    assert_success(&t.sync());
    let mode = std::fs::metadata(t.path(".env")).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}
