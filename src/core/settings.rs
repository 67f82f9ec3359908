//! Connection settings.
//!
//! Flags and their environment fallbacks are collected by the CLI into a
//! [`VaultOptions`]; [`VaultOptions::resolve`] validates them (with an
//! optional config-file `vault:` section as lowest-priority source) into an
//! immutable [`Settings`] handed to the backend constructor. Nothing below
//! this point reads the process environment.

use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use crate::core::backend::AuthMethod;
use crate::core::config::VaultSection;
use crate::core::constants;
use crate::error::{ConfigError, Result};

/// Raw connection inputs, as given on the command line or in the environment.
#[derive(Debug, Clone, Default)]
pub struct VaultOptions {
    pub addr: Option<String>,
    pub token: Option<String>,
    pub namespace: Option<String>,
    pub ca_cert: Option<PathBuf>,
    pub skip_verify: Option<bool>,
    pub timeout_secs: Option<u64>,
    pub auth_method: Option<String>,
    pub role_id: Option<String>,
    pub secret_id: Option<String>,
    pub github_token: Option<String>,
    pub k8s_role: Option<String>,
    pub k8s_jwt_path: Option<PathBuf>,
    pub k8s_auth_path: Option<String>,
}

/// Validated connection settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub addr: String,
    pub namespace: Option<String>,
    pub ca_cert: Option<PathBuf>,
    pub skip_verify: bool,
    pub timeout: Duration,
    pub auth: AuthMethod,
}

fn present(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

impl VaultOptions {
    /// Validate into [`Settings`].
    ///
    /// # Errors
    ///
    /// `ConfigError::MissingAddress` without an address,
    /// `ConfigError::MissingCredential` when the selected auth method lacks
    /// its inputs, `ConfigError::UnsupportedAuthMethod` for unknown methods.
    pub fn resolve(&self, config: Option<&VaultSection>) -> Result<Settings> {
        let addr = present(&self.addr)
            .or_else(|| config.and_then(|v| present(&v.addr)))
            .ok_or(ConfigError::MissingAddress)?;

        let namespace =
            present(&self.namespace).or_else(|| config.and_then(|v| present(&v.namespace)));

        let ca_cert = self
            .ca_cert
            .clone()
            .or_else(|| config.and_then(|v| v.ca_cert.clone()));

        let skip_verify = self
            .skip_verify
            .or_else(|| config.and_then(|v| v.skip_verify))
            .unwrap_or(false);

        let timeout = Duration::from_secs(
            self.timeout_secs
                .filter(|t| *t > 0)
                .unwrap_or(constants::DEFAULT_TIMEOUT_SECS),
        );

        let auth = self.auth_method()?;

        debug!(
            addr = %addr,
            namespace = namespace.as_deref().unwrap_or(""),
            auth = auth.name(),
            timeout_secs = timeout.as_secs(),
            "resolved vault settings"
        );

        Ok(Settings {
            addr,
            namespace,
            ca_cert,
            skip_verify,
            timeout,
            auth,
        })
    }

    /// Auto-detect the auth method from the credentials present.
    ///
    /// Priority: token, approle (role id and secret id), github, kubernetes.
    /// Falls back to token, which then fails validation.
    pub fn detect_auth_method(&self) -> &'static str {
        if present(&self.token).is_some() {
            "token"
        } else if present(&self.role_id).is_some() && present(&self.secret_id).is_some() {
            "approle"
        } else if present(&self.github_token).is_some() {
            "github"
        } else if present(&self.k8s_role).is_some() {
            "kubernetes"
        } else {
            "token"
        }
    }

    fn auth_method(&self) -> Result<AuthMethod> {
        let explicit = present(&self.auth_method).map(|m| m.to_ascii_lowercase());
        let method = explicit
            .as_deref()
            .unwrap_or_else(|| self.detect_auth_method());

        let missing = |method: &'static str, var: &'static str| ConfigError::MissingCredential {
            method,
            var,
        };

        let auth = match method {
            "token" => AuthMethod::Token(
                present(&self.token).ok_or_else(|| missing("token", "VAULT_TOKEN"))?,
            ),
            "approle" => AuthMethod::AppRole {
                role_id: present(&self.role_id).ok_or_else(|| missing("AppRole", "VAULT_ROLE_ID"))?,
                secret_id: present(&self.secret_id)
                    .ok_or_else(|| missing("AppRole", "VAULT_SECRET_ID"))?,
            },
            "github" => AuthMethod::GitHub {
                token: present(&self.github_token)
                    .ok_or_else(|| missing("GitHub", "VAULT_GITHUB_TOKEN"))?,
            },
            "kubernetes" => AuthMethod::Kubernetes {
                role: present(&self.k8s_role)
                    .ok_or_else(|| missing("Kubernetes", "VAULT_K8S_ROLE"))?,
                jwt_path: self
                    .k8s_jwt_path
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(constants::K8S_JWT_PATH)),
                mount: present(&self.k8s_auth_path)
                    .unwrap_or_else(|| constants::K8S_AUTH_PATH.to_string()),
            },
            other => return Err(ConfigError::UnsupportedAuthMethod(other.to_string()).into()),
        };

        Ok(auth)
    }
}
