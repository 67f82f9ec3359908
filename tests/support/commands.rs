//! Command helper methods for Test.

use super::{vault, Test};
use assert_cmd::Command;
use std::process::Output;

/// Variables that would leak the developer's own Vault setup into a test.
const SCRUBBED_VARS: &[&str] = &[
    "VAULT_ADDR",
    "VAULT_TOKEN",
    "VAULT_NAMESPACE",
    "VAULT_CACERT",
    "VAULT_SKIP_VERIFY",
    "VAULT_TIMEOUT",
    "VAULT_AUTH_METHOD",
    "VAULT_ROLE_ID",
    "VAULT_SECRET_ID",
    "VAULT_GITHUB_TOKEN",
    "VAULT_K8S_ROLE",
    "VAULT_K8S_JWT_PATH",
    "VAULT_K8S_AUTH_PATH",
    "ENCRYPTION_KEY",
    "TRANSIT_MOUNT",
    "TRANSIT",
    "VAULT_ENV_LOG",
];

impl Test {
    /// Create a vault-env command with a clean environment.
    ///
    /// Returns a Command configured with:
    /// - every Vault variable removed, then VAULT_ADDR/VAULT_TOKEN pointing
    ///   at the fake server when there is one
    /// - NO_COLOR set so output is plain
    /// - current directory set to the test directory
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("vault-env").expect("failed to find vault-env binary");
        for var in SCRUBBED_VARS {
            cmd.env_remove(var);
        }
        if let Some(fake) = &self.vault {
            cmd.env("VAULT_ADDR", fake.uri());
            cmd.env("VAULT_TOKEN", vault::TOKEN);
        }
        cmd.env("NO_COLOR", "1");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Run vault-env with `args`.
    pub fn exec(&self, args: &[&str]) -> Output {
        self.cmd()
            .args(args)
            .output()
            .expect("failed to run vault-env")
    }

    /// Shortcut for `vault-env put -p <path> --value <value>`.
    pub fn put(&self, path: &str, value: &str) -> Output {
        self.exec(&["put", "-p", path, "--value", value])
    }

    /// Shortcut for `vault-env put -p <path> -k <key> --value <value>`.
    pub fn put_field(&self, path: &str, key: &str, value: &str) -> Output {
        self.exec(&["put", "-p", path, "-k", key, "--value", value])
    }

    /// Shortcut for `vault-env get -p <path>`.
    pub fn get(&self, path: &str) -> Output {
        self.exec(&["get", "-p", path])
    }

    /// Shortcut for `vault-env sync`.
    pub fn sync(&self) -> Output {
        self.exec(&["sync"])
    }

    /// Shortcut for `vault-env run <args> -- <command>`.
    pub fn run(&self, args: &[&str], command: &[&str]) -> Output {
        let mut cmd = self.cmd();
        cmd.arg("run").args(args).arg("--").args(command);
        cmd.output().expect("failed to run vault-env run")
    }

    /// Shortcut for `vault-env json <file>`.
    pub fn json(&self, file: &str) -> Output {
        self.exec(&["json", file])
    }
}
