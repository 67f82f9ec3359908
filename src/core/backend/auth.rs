//! Authentication methods.
//!
//! Every method other than a plain token is a single login call that
//! exchanges credentials for a client token.

use std::path::PathBuf;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::{BackendError, Result};

/// How to obtain a client token.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMethod {
    Token(String),
    AppRole { role_id: String, secret_id: String },
    GitHub { token: String },
    Kubernetes {
        role: String,
        jwt_path: PathBuf,
        mount: String,
    },
}

#[derive(Deserialize)]
struct LoginResponse {
    auth: Option<LoginAuth>,
}

#[derive(Deserialize)]
struct LoginAuth {
    client_token: String,
}

impl AuthMethod {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Token(_) => "token",
            Self::AppRole { .. } => "approle",
            Self::GitHub { .. } => "github",
            Self::Kubernetes { .. } => "kubernetes",
        }
    }

    /// Login endpoint relative to `/v1/`, or `None` for token auth.
    fn endpoint(&self) -> Option<String> {
        match self {
            Self::Token(_) => None,
            Self::AppRole { .. } => Some("auth/approle/login".to_string()),
            Self::GitHub { .. } => Some("auth/github/login".to_string()),
            Self::Kubernetes { mount, .. } => {
                Some(format!("auth/{}/login", mount.trim_matches('/')))
            }
        }
    }

    fn payload(&self) -> Result<serde_json::Value> {
        let body = match self {
            Self::Token(_) => json!({}),
            Self::AppRole { role_id, secret_id } => {
                json!({ "role_id": role_id, "secret_id": secret_id })
            }
            Self::GitHub { token } => json!({ "token": token }),
            Self::Kubernetes { role, jwt_path, .. } => {
                let jwt = Zeroizing::new(std::fs::read_to_string(jwt_path).map_err(|e| {
                    BackendError::Auth(format!(
                        "failed to read kubernetes JWT from {}: {}",
                        jwt_path.display(),
                        e
                    ))
                })?);
                json!({ "role": role, "jwt": jwt.trim() })
            }
        };
        Ok(body)
    }

    /// Exchange credentials for a client token.
    ///
    /// `base` is the API root including `/v1`.
    ///
    /// # Errors
    ///
    /// `BackendError::Auth` when the login call fails or returns no token.
    pub fn login(
        &self,
        http: &Client,
        base: &str,
        namespace: Option<&str>,
    ) -> Result<Zeroizing<String>> {
        let endpoint = match (self, self.endpoint()) {
            (Self::Token(token), _) => return Ok(Zeroizing::new(token.clone())),
            (_, Some(endpoint)) => endpoint,
            (_, None) => return Err(BackendError::Auth("no login endpoint".to_string()).into()),
        };

        debug!(method = self.name(), endpoint = %endpoint, "logging in");

        let mut request = http
            .post(format!("{}/{}", base, endpoint))
            .json(&self.payload()?);
        if let Some(ns) = namespace {
            request = request.header("X-Vault-Namespace", ns);
        }

        let response = request
            .send()
            .map_err(|e| BackendError::Auth(format!("{} login: {}", self.name(), e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(BackendError::Auth(format!(
                "{} login returned {}: {}",
                self.name(),
                status.as_u16(),
                super::vault::error_message(&body)
            ))
            .into());
        }

        let parsed: LoginResponse = response
            .json()
            .map_err(|e| BackendError::Auth(format!("{} login: {}", self.name(), e)))?;

        parsed
            .auth
            .map(|auth| Zeroizing::new(auth.client_token))
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                BackendError::Auth(format!("no client token returned from {} login", self.name()))
                    .into()
            })
    }
}

impl std::fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Token(***)"),
            Self::AppRole { role_id, .. } => f
                .debug_struct("AppRole")
                .field("role_id", role_id)
                .field("secret_id", &"***")
                .finish(),
            Self::GitHub { .. } => f.write_str("GitHub { token: *** }"),
            Self::Kubernetes {
                role,
                jwt_path,
                mount,
            } => f
                .debug_struct("Kubernetes")
                .field("role", role)
                .field("jwt_path", jwt_path)
                .field("mount", mount)
                .finish(),
        }
    }
}
