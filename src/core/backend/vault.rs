//! Vault HTTP client.
//!
//! Speaks the KV v2 and Transit parts of the Vault HTTP API over a blocking
//! reqwest client. One attempt per call, bounded by the configured timeout.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Certificate, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;
use zeroize::Zeroizing;

use super::{Backend, SecretPath};
use crate::core::settings::Settings;
use crate::core::transit::EncryptionContext;
use crate::core::types::FieldMap;
use crate::error::{BackendError, ConfigError, Result};

/// Client for a single Vault server.
pub struct VaultClient {
    http: Client,
    base: String,
    token: Zeroizing<String>,
    namespace: Option<String>,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

#[derive(Deserialize)]
struct KvData {
    data: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
struct EncryptData {
    ciphertext: Option<String>,
}

#[derive(Deserialize)]
struct DecryptData {
    plaintext: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<String>,
}

/// Human-readable message from a Vault error body.
pub(crate) fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.errors.is_empty() => parsed.errors.join("; "),
        _ if body.trim().is_empty() => "no error message".to_string(),
        _ => body.trim().to_string(),
    }
}

fn build_http(settings: &Settings) -> Result<Client> {
    let mut builder = Client::builder()
        .timeout(settings.timeout)
        .danger_accept_invalid_certs(settings.skip_verify);

    if let Some(path) = &settings.ca_cert {
        let pem = std::fs::read(path).map_err(|e| ConfigError::CaCert {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let cert = Certificate::from_pem(&pem).map_err(|e| ConfigError::CaCert {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        builder = builder.add_root_certificate(cert);
    }

    builder
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()).into())
}

impl VaultClient {
    /// Build the HTTP client and authenticate.
    ///
    /// # Errors
    ///
    /// Configuration errors for an unreadable CA certificate, or
    /// `BackendError::Auth` when login fails.
    pub fn connect(settings: &Settings) -> Result<Self> {
        let http = build_http(settings)?;
        let base = format!("{}/v1", settings.addr.trim_end_matches('/'));
        let token = settings
            .auth
            .login(&http, &base, settings.namespace.as_deref())?;

        debug!(addr = %settings.addr, auth = settings.auth.name(), "connected to vault");

        Ok(Self {
            http,
            base,
            token,
            namespace: settings.namespace.clone(),
        })
    }

    fn request(&self, method: reqwest::Method, endpoint: &str) -> RequestBuilder {
        let mut request = self
            .http
            .request(method, format!("{}/{}", self.base, endpoint))
            .header("X-Vault-Token", self.token.as_str());
        if let Some(ns) = &self.namespace {
            request = request.header("X-Vault-Namespace", ns);
        }
        request
    }

    fn send(&self, op: &'static str, target: &str, request: RequestBuilder) -> Result<Response> {
        debug!(op, path = target, "vault request");
        request.send().map_err(|source| {
            BackendError::Request {
                op,
                path: target.to_string(),
                source: Box::new(source),
            }
            .into()
        })
    }

    fn fail(op: &'static str, target: &str, response: Response) -> crate::error::Error {
        let status = response.status().as_u16();
        let body = response.text().unwrap_or_default();
        BackendError::Status {
            op,
            path: target.to_string(),
            status,
            message: error_message(&body),
        }
        .into()
    }

    fn parse<T: DeserializeOwned>(op: &'static str, target: &str, response: Response) -> Result<T> {
        response.json::<T>().map_err(|e| {
            BackendError::Malformed {
                op,
                path: target.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    fn malformed(op: &'static str, target: &str, reason: &str) -> crate::error::Error {
        BackendError::Malformed {
            op,
            path: target.to_string(),
            reason: reason.to_string(),
        }
        .into()
    }
}

fn stringify(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

impl Backend for VaultClient {
    fn read(&self, path: &SecretPath) -> Result<Option<FieldMap>> {
        const OP: &str = "kv get";
        let target = path.to_string();
        let response = self.send(
            OP,
            &target,
            self.request(reqwest::Method::GET, &path.data_endpoint()),
        )?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::fail(OP, &target, response));
        }

        let envelope: Envelope<KvData> = Self::parse(OP, &target, response)?;
        let fields = envelope
            .data
            .and_then(|kv| kv.data)
            .map(|data| data.into_iter().map(|(k, v)| (k, stringify(v))).collect());

        Ok(fields)
    }

    fn write(&self, path: &SecretPath, fields: &FieldMap) -> Result<()> {
        const OP: &str = "kv put";
        let target = path.to_string();
        let response = self.send(
            OP,
            &target,
            self.request(reqwest::Method::POST, &path.data_endpoint())
                .json(&json!({ "data": fields })),
        )?;

        if !response.status().is_success() {
            return Err(Self::fail(OP, &target, response));
        }
        Ok(())
    }

    fn encrypt(&self, ctx: &EncryptionContext, plaintext: &[u8]) -> Result<String> {
        const OP: &str = "transit encrypt";
        let target = format!("{}/{}", ctx.mount(), ctx.key());
        let encoded = Zeroizing::new(STANDARD.encode(plaintext));
        let response = self.send(
            OP,
            &target,
            self.request(reqwest::Method::POST, &ctx.encrypt_endpoint())
                .json(&json!({ "plaintext": encoded.as_str() })),
        )?;

        if !response.status().is_success() {
            return Err(Self::fail(OP, &target, response));
        }

        let envelope: Envelope<EncryptData> = Self::parse(OP, &target, response)?;
        envelope
            .data
            .and_then(|d| d.ciphertext)
            .ok_or_else(|| Self::malformed(OP, &target, "no ciphertext in response"))
    }

    fn decrypt(&self, ctx: &EncryptionContext, ciphertext: &str) -> Result<Vec<u8>> {
        const OP: &str = "transit decrypt";
        let target = format!("{}/{}", ctx.mount(), ctx.key());
        let response = self.send(
            OP,
            &target,
            self.request(reqwest::Method::POST, &ctx.decrypt_endpoint())
                .json(&json!({ "ciphertext": ciphertext })),
        )?;

        if !response.status().is_success() {
            return Err(Self::fail(OP, &target, response));
        }

        let envelope: Envelope<DecryptData> = Self::parse(OP, &target, response)?;
        let encoded = envelope
            .data
            .and_then(|d| d.plaintext)
            .map(Zeroizing::new)
            .ok_or_else(|| Self::malformed(OP, &target, "no plaintext in response"))?;

        STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| Self::malformed(OP, &target, &format!("invalid base64 plaintext: {}", e)))
    }
}

impl std::fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClient")
            .field("base", &self.base)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}
