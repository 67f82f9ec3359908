//! Backend gateway.
//!
//! Everything the rest of the crate needs from Vault is expressed by the
//! four operations of [`Backend`]. Each call is a single attempt bounded by
//! the client's timeout; failures come back with the operation name and path
//! attached.
//!
//! ## Implementations
//!
//! - [`VaultClient`]: Vault HTTP API (KV v2 + Transit) over blocking reqwest.
//! - [`MemoryBackend`]: in-memory records and a fake Transit oracle, for tests
//!   and offline use.

use crate::core::transit::EncryptionContext;
use crate::core::types::{Ciphertext, FieldMap};
use crate::error::Result;

mod auth;
mod memory;
mod vault;

pub use auth::AuthMethod;
pub use memory::MemoryBackend;
pub use vault::VaultClient;

/// A KV v2 location: mount plus the path under it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SecretPath {
    mount: String,
    path: String,
}

impl SecretPath {
    pub fn new(mount: impl AsRef<str>, path: impl AsRef<str>) -> Self {
        Self {
            mount: mount.as_ref().trim_end_matches('/').to_string(),
            path: path.as_ref().trim_start_matches('/').to_string(),
        }
    }

    pub fn mount(&self) -> &str {
        &self.mount
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// API path of the versioned data endpoint, relative to `/v1/`.
    pub fn data_endpoint(&self) -> String {
        format!("{}/data/{}", self.mount, self.path)
    }
}

impl std::fmt::Display for SecretPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.mount, self.path)
    }
}

/// Secret storage and Transit oracle.
pub trait Backend {
    /// Read the field map at `path`. `Ok(None)` means nothing is stored there.
    fn read(&self, path: &SecretPath) -> Result<Option<FieldMap>>;

    /// Write `fields` as the new version at `path`.
    fn write(&self, path: &SecretPath, fields: &FieldMap) -> Result<()>;

    /// Encrypt plaintext bytes with the named Transit key.
    fn encrypt(&self, ctx: &EncryptionContext, plaintext: &[u8]) -> Result<Ciphertext>;

    /// Decrypt a Transit ciphertext with the named key.
    fn decrypt(&self, ctx: &EncryptionContext, ciphertext: &str) -> Result<Vec<u8>>;
}
