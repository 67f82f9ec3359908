//! Tests for `vault-env put`.

use crate::support::*;
use std::collections::BTreeMap;

fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_put_value_stores_singleton() {
    let t = Test::with_vault();

    let output = t.put("app/token", "supersecret");
    assert_success(&output);
    assert_stdout_contains(&output, "Stored 1 secret(s) as plaintext: kv/app/token");

    assert_eq!(
        t.vault().record("kv/app/token"),
        Some(fields(&[("value", "supersecret")]))
    );
}

#[test]
fn test_put_value_replaces_existing_record() {
    let t = Test::with_records(&[("kv/app/db", DB_RECORD)]);

    assert_success(&t.put("app/db", "just-one"));
    assert_eq!(
        t.vault().record("kv/app/db"),
        Some(fields(&[("value", "just-one")]))
    );
}

#[test]
fn test_put_field_keeps_siblings() {
    let t = Test::with_records(&[("kv/app/db", DB_RECORD)]);

    let output = t.put_field("app/db", "DB_PASS", "rotated");
    assert_success(&output);
    assert_stdout_contains(&output, "Updated key 'DB_PASS' as plaintext: kv/app/db");

    assert_eq!(
        t.vault().record("kv/app/db"),
        Some(fields(&[
            ("DB_HOST", "localhost"),
            ("DB_PASS", "rotated"),
            ("DB_PORT", "5432"),
        ]))
    );
}

#[test]
fn test_put_field_onto_singleton_drops_sentinel() {
    let t = Test::with_records(&[("kv/app/token", &[("value", "old")])]);

    assert_success(&t.put_field("app/token", "EXTRA", "x"));
    assert_eq!(
        t.vault().record("kv/app/token"),
        Some(fields(&[("EXTRA", "x")]))
    );
}

#[test]
fn test_put_from_stdin_strips_newline() {
    let t = Test::with_vault();

    let output = t
        .cmd()
        .args(["put", "-p", "app/piped"])
        .write_stdin("from-pipe\n")
        .output()
        .unwrap();
    assert_success(&output);

    assert_eq!(
        t.vault().record("kv/app/piped"),
        Some(fields(&[("value", "from-pipe")]))
    );
}

#[test]
fn test_put_from_env_replaces_record() {
    let t = Test::with_records(&[("kv/app/db", DB_RECORD)]);
    t.write("db.env", SAMPLE_ENV);

    let output = t.exec(&["put", "-p", "app/db", "--from-env", "db.env"]);
    assert_success(&output);
    assert_stdout_contains(&output, "Stored 3 secret(s) as plaintext: kv/app/db");

    assert_eq!(
        t.vault().record("kv/app/db"),
        Some(fields(&[("KEY1", "value1"), ("KEY2", "value2"), ("KEY3", "value3")]))
    );
}

#[test]
fn test_put_from_env_merge_keeps_other_fields() {
    let t = Test::with_records(&[("kv/app/db", DB_RECORD)]);
    t.write("db.env", "DB_PASS=rotated\nNEW_KEY=n\n");

    let output = t.exec(&["put", "-p", "app/db", "--from-env", "db.env", "--merge"]);
    assert_success(&output);

    assert_eq!(
        t.vault().record("kv/app/db"),
        Some(fields(&[
            ("DB_HOST", "localhost"),
            ("DB_PASS", "rotated"),
            ("DB_PORT", "5432"),
            ("NEW_KEY", "n"),
        ]))
    );
}

#[test]
fn test_put_from_env_parses_quotes_and_export() {
    let t = Test::with_vault();
    t.write("complex.env", SAMPLE_ENV_COMPLEX);

    assert_success(&t.exec(&["put", "-p", "app/complex", "--from-env", "complex.env"]));

    let record = t.vault().record("kv/app/complex").unwrap();
    assert_eq!(record["QUOTED"], "quoted value");
    assert_eq!(record["SINGLE_QUOTED"], "single quoted");
    assert_eq!(record["EXPORTED"], "yes");
    assert_eq!(record["SPECIAL_CHARS"], "p@ssw0rd!#$%");
}

#[test]
fn test_put_from_file_stores_base64() {
    let t = Test::with_vault();
    t.write("cert.pem", "-----BEGIN-----\nabc\n");

    assert_success(&t.exec(&["put", "-p", "app/cert", "--from-file", "cert.pem"]));

    assert_eq!(
        t.vault().record("kv/app/cert"),
        Some(fields(&[("value", "LS0tLS1CRUdJTi0tLS0tCmFiYwo=")]))
    );
}

#[test]
fn test_put_encrypted_with_key() {
    let t = Test::with_vault();

    let output = t
        .cmd()
        .env("ENCRYPTION_KEY", "app-key")
        .args(["put", "-p", "app/token", "--value", "s3cret"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "as encrypted: kv/app/token");

    assert_eq!(
        t.vault().record("kv/app/token"),
        Some(fields(&[("ciphertext", FakeVault::seal("app-key", "s3cret").as_str())]))
    );
}

#[test]
fn test_put_transit_false_forces_plaintext() {
    let t = Test::with_vault();

    let output = t
        .cmd()
        .env("ENCRYPTION_KEY", "app-key")
        .env("TRANSIT", "false")
        .args(["put", "-p", "app/token", "--value", "plain"])
        .output()
        .unwrap();
    assert_success(&output);

    assert_eq!(
        t.vault().record("kv/app/token"),
        Some(fields(&[("value", "plain")]))
    );
}

#[test]
fn test_put_custom_kv_mount() {
    let t = Test::with_vault();

    assert_success(&t.exec(&["put", "-p", "app", "--value", "x", "--kv-mount", "secret"]));
    assert!(t.vault().record("secret/app").is_some());
    assert!(t.vault().record("kv/app").is_none());
}

#[test]
fn test_put_empty_value_fails_without_writing() {
    let t = Test::with_vault();

    let output = t.put("app/token", "");
    assert_failure(&output);
    assert_stderr_contains(&output, "no secret value provided");
    assert!(t.vault().writes().is_empty());
}

#[test]
fn test_put_conflicting_inputs() {
    let t = Test::with_vault();
    t.write("a.env", SAMPLE_ENV);

    let output = t.exec(&["put", "-p", "app", "--value", "x", "--from-env", "a.env"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "only one of --value, --from-env, or --from-file");
}

#[test]
fn test_put_merge_requires_from_env() {
    let t = Test::with_vault();

    let output = t.exec(&["put", "-p", "app", "--value", "x", "--merge"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "--merge can only be used with --from-env");
}

#[test]
fn test_put_malformed_env_file_reports_line() {
    let t = Test::with_vault();
    t.write("bad.env", "GOOD=1\nnot a pair\n");

    let output = t.exec(&["put", "-p", "app", "--from-env", "bad.env"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "bad.env:2");
    assert!(t.vault().writes().is_empty());
}

#[test]
fn test_put_sentinel_key_is_refused() {
    let t = Test::with_records(&[("kv/app/token", &[("A", "1")])]);

    for reserved in ["value", "ciphertext"] {
        let output = t.put_field("app/token", reserved, "keepme");
        assert_failure(&output);
        assert_stderr_contains(&output, &format!("key name \"{}\" is reserved", reserved));
    }
    assert!(t.vault().writes().is_empty());
    assert_eq!(t.vault().record("kv/app/token"), Some(fields(&[("A", "1")])));
}

#[test]
fn test_put_from_env_with_sentinel_variable_is_refused() {
    let t = Test::with_records(&[("kv/app/db", DB_RECORD)]);
    t.write("value.env", "value=x\n");
    t.write("cipher.env", "ciphertext=vault:v1:app-key:eA==\n");

    for file in ["value.env", "cipher.env"] {
        let output = t.exec(&["put", "-p", "app/db", "--from-env", file]);
        assert_failure(&output);
        assert_stderr_contains(&output, "is reserved for single-value secrets");

        let output = t.exec(&["put", "-p", "app/db", "--from-env", file, "--merge"]);
        assert_failure(&output);
    }
    assert!(t.vault().writes().is_empty());
}
