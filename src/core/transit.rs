//! Transit encryption context.
//!
//! Decides once per invocation whether values go through the Transit
//! oracle, and with which key. [`Sealer`] and [`Opener`] wrap the backend
//! oracle for the merge engine, loaders, and readers.

use std::collections::BTreeMap;

use tracing::trace;

use crate::core::backend::{Backend, SecretPath};
use crate::core::config::TransitSection;
use crate::core::constants;
use crate::core::record::FieldValue;
use crate::core::types::FieldName;
use crate::error::{Result, SecretError};

/// A Transit key and the mount it lives under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionContext {
    mount: String,
    key: String,
}

impl EncryptionContext {
    pub fn new(mount: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            mount: mount.into().trim_end_matches('/').to_string(),
            key: key.into(),
        }
    }

    pub fn mount(&self) -> &str {
        &self.mount
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// API path of the encrypt endpoint, relative to `/v1/`.
    pub fn encrypt_endpoint(&self) -> String {
        format!("{}/encrypt/{}", self.mount, self.key)
    }

    /// API path of the decrypt endpoint, relative to `/v1/`.
    pub fn decrypt_endpoint(&self) -> String {
        format!("{}/decrypt/{}", self.mount, self.key)
    }
}

/// Parse a `TRANSIT` toggle value.
///
/// Accepts true/false, 1/0, yes/no, on/off, enable/disable, enabled/disabled.
pub fn parse_toggle(raw: &str) -> std::result::Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enable" | "enabled" => Ok(true),
        "false" | "0" | "no" | "off" | "disable" | "disabled" => Ok(false),
        other => Err(format!(
            "{} (expected true/false, 1/0, yes/no, on/off, enable/disable)",
            other
        )),
    }
}

/// Encryption inputs gathered from flags and environment.
#[derive(Debug, Clone, Default)]
pub struct TransitOptions {
    /// `--encryption-key` / `ENCRYPTION_KEY`.
    pub key: Option<String>,
    /// `--transit-mount` / `TRANSIT_MOUNT`.
    pub mount: Option<String>,
    /// `TRANSIT` toggle, when set.
    pub enabled: Option<bool>,
}

impl TransitOptions {
    fn mount_for(&self, config: Option<&TransitSection>) -> String {
        non_empty(self.mount.as_deref())
            .or_else(|| config.and_then(|t| non_empty(t.mount.as_deref())))
            .unwrap_or(constants::TRANSIT_MOUNT)
            .to_string()
    }

    fn key_for(&self, config: Option<&TransitSection>) -> Option<String> {
        non_empty(self.key.as_deref())
            .or_else(|| config.and_then(|t| non_empty(t.key.as_deref())))
            .map(str::to_string)
            .or_else(|| {
                (self.enabled == Some(true)).then(|| constants::DEFAULT_TRANSIT_KEY.to_string())
            })
    }

    /// Context for reading. A disabled toggle does not stop decryption of
    /// values that are already encrypted.
    pub fn for_read(&self, config: Option<&TransitSection>) -> Option<EncryptionContext> {
        let key = self.key_for(config)?;
        Some(EncryptionContext::new(self.mount_for(config), key))
    }

    /// Context for writing. `TRANSIT=false` forces plaintext.
    pub fn for_write(&self, config: Option<&TransitSection>) -> Option<EncryptionContext> {
        if self.enabled == Some(false) {
            return None;
        }
        self.for_read(config)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Turns plaintext into the value that gets stored.
#[derive(Clone, Copy)]
pub enum Sealer<'a> {
    /// Store as-is.
    Plaintext,
    /// Encrypt through the Transit oracle first.
    Transit {
        backend: &'a dyn Backend,
        ctx: &'a EncryptionContext,
        record: Option<&'a SecretPath>,
    },
}

impl<'a> Sealer<'a> {
    /// Build from an optional context.
    pub fn new(backend: &'a dyn Backend, ctx: Option<&'a EncryptionContext>) -> Self {
        match ctx {
            Some(ctx) => Self::Transit {
                backend,
                ctx,
                record: None,
            },
            None => Self::Plaintext,
        }
    }

    /// Name the record being written in oracle errors.
    pub fn for_record(self, path: &'a SecretPath) -> Self {
        match self {
            Self::Transit { backend, ctx, .. } => Self::Transit {
                backend,
                ctx,
                record: Some(path),
            },
            Self::Plaintext => Self::Plaintext,
        }
    }

    pub fn is_encrypting(&self) -> bool {
        matches!(self, Self::Transit { .. })
    }

    pub fn seal(&self, plaintext: &str) -> Result<FieldValue> {
        match self {
            Self::Plaintext => Ok(FieldValue::Plain(plaintext.to_string())),
            Self::Transit {
                backend,
                ctx,
                record,
            } => {
                trace!(key = ctx.key(), "sealing value");
                let ciphertext = backend
                    .encrypt(ctx, plaintext.as_bytes())
                    .map_err(|e| match record {
                        Some(path) => e.for_record(&path.to_string()),
                        None => e,
                    })?;
                Ok(FieldValue::Cipher(ciphertext))
            }
        }
    }
}

impl std::fmt::Debug for Sealer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plaintext => f.write_str("Sealer::Plaintext"),
            Self::Transit { ctx, .. } => f.debug_struct("Sealer::Transit").field("ctx", ctx).finish(),
        }
    }
}

/// Recovers plaintext from stored values.
pub struct Opener<'a> {
    backend: &'a dyn Backend,
    ctx: Option<&'a EncryptionContext>,
}

impl<'a> Opener<'a> {
    pub fn new(backend: &'a dyn Backend, ctx: Option<&'a EncryptionContext>) -> Self {
        Self { backend, ctx }
    }

    pub fn has_key(&self) -> bool {
        self.ctx.is_some()
    }

    /// Decrypt a ciphertext read from `path`.
    ///
    /// # Errors
    ///
    /// `SecretError::EncryptionKeyRequired` when no key was supplied, kept
    /// distinct from oracle failures.
    pub fn decrypt(&self, ciphertext: &str, path: &SecretPath) -> Result<String> {
        let ctx = self
            .ctx
            .ok_or_else(|| SecretError::EncryptionKeyRequired(path.to_string()))?;
        let bytes = self
            .backend
            .decrypt(ctx, ciphertext)
            .map_err(|e| e.for_record(&path.to_string()))?;
        String::from_utf8(bytes).map_err(|_| {
            SecretError::NotUtf8 {
                path: path.to_string(),
            }
            .into()
        })
    }

    /// Plaintext of a single field value.
    pub fn open(&self, value: &FieldValue, path: &SecretPath) -> Result<String> {
        match value {
            FieldValue::Plain(plain) => Ok(plain.clone()),
            FieldValue::Cipher(ciphertext) => self.decrypt(ciphertext, path),
        }
    }

    /// Plaintext of every field, stopping at the first failure.
    pub fn open_all(
        &self,
        fields: &BTreeMap<FieldName, FieldValue>,
        path: &SecretPath,
    ) -> Result<BTreeMap<FieldName, String>> {
        fields
            .iter()
            .map(|(name, value)| Ok((name.clone(), self.open(value, path)?)))
            .collect()
    }
}
