//! In-memory backend.
//!
//! Holds records in a map and fakes the Transit oracle with a reversible
//! encoding. The fake ciphertext embeds the key it was produced with, so
//! decrypting under any other key fails the way Transit would.
//!
//! NOT cryptographically secure.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::{Backend, SecretPath};
use crate::core::transit::EncryptionContext;
use crate::core::types::FieldMap;
use crate::error::{BackendError, Result};

const FAKE_PREFIX: &str = "vault:v1:";

/// Backend kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: RefCell<BTreeMap<SecretPath, FieldMap>>,
    unreachable: RefCell<BTreeSet<SecretPath>>,
    fail_encrypt: Cell<bool>,
    writes: Cell<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly, bypassing the write counter.
    pub fn insert(&self, path: SecretPath, fields: FieldMap) {
        self.records.borrow_mut().insert(path, fields);
    }

    /// Stored fields at `path`, if any.
    pub fn get(&self, path: &SecretPath) -> Option<FieldMap> {
        self.records.borrow().get(path).cloned()
    }

    /// Make every read of `path` fail as if the server were unreachable.
    pub fn fail_reads_at(&self, path: SecretPath) {
        self.unreachable.borrow_mut().insert(path);
    }

    /// Make every encrypt call fail.
    pub fn fail_encryption(&self, fail: bool) {
        self.fail_encrypt.set(fail);
    }

    /// Number of writes performed through [`Backend::write`].
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    /// Produce the same ciphertext [`Backend::encrypt`] would, for seeding.
    pub fn seal(ctx: &EncryptionContext, plaintext: &str) -> String {
        let payload = format!("{}\0{}", key_id(ctx), plaintext);
        format!("{}{}", FAKE_PREFIX, STANDARD.encode(payload))
    }
}

fn key_id(ctx: &EncryptionContext) -> String {
    format!("{}/{}", ctx.mount(), ctx.key())
}

fn oracle_error(op: &'static str, ctx: &EncryptionContext, reason: impl Into<String>) -> BackendError {
    BackendError::Oracle {
        op,
        path: key_id(ctx),
        reason: reason.into(),
    }
}

impl Backend for MemoryBackend {
    fn read(&self, path: &SecretPath) -> Result<Option<FieldMap>> {
        if self.unreachable.borrow().contains(path) {
            return Err(BackendError::Request {
                op: "kv get",
                path: path.to_string(),
                source: Box::new(std::io::Error::from(std::io::ErrorKind::ConnectionRefused)),
            }
            .into());
        }
        Ok(self.get(path))
    }

    fn write(&self, path: &SecretPath, fields: &FieldMap) -> Result<()> {
        self.records
            .borrow_mut()
            .insert(path.clone(), fields.clone());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn encrypt(&self, ctx: &EncryptionContext, plaintext: &[u8]) -> Result<String> {
        if self.fail_encrypt.get() {
            return Err(oracle_error("transit encrypt", ctx, "permission denied").into());
        }
        let plaintext = String::from_utf8_lossy(plaintext);
        Ok(Self::seal(ctx, &plaintext))
    }

    fn decrypt(&self, ctx: &EncryptionContext, ciphertext: &str) -> Result<Vec<u8>> {
        let encoded = ciphertext
            .strip_prefix(FAKE_PREFIX)
            .ok_or_else(|| oracle_error("transit decrypt", ctx, "invalid ciphertext"))?;
        let payload = STANDARD
            .decode(encoded)
            .map_err(|e| oracle_error("transit decrypt", ctx, e.to_string()))?;
        let payload = String::from_utf8(payload)
            .map_err(|e| oracle_error("transit decrypt", ctx, e.to_string()))?;
        let (sealed_with, plaintext) = payload
            .split_once('\0')
            .ok_or_else(|| oracle_error("transit decrypt", ctx, "invalid ciphertext"))?;

        if sealed_with != key_id(ctx) {
            return Err(oracle_error("transit decrypt", ctx, "cipher: message authentication failed").into());
        }

        Ok(plaintext.as_bytes().to_vec())
    }
}
