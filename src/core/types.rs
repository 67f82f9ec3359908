//! Type aliases for domain concepts.
//!
//! Provides semantic type aliases to make function signatures more descriptive.

use std::collections::BTreeMap;

/// A field name inside a secret record (e.g. DB_HOST). Case-sensitive.
pub type FieldName = String;

/// The raw wire form of a record: field name to stored string.
///
/// This is what the backend reads and writes; sentinel keys
/// (`value`, `ciphertext`) only exist at this level.
pub type FieldMap = BTreeMap<FieldName, String>;

/// A Transit ciphertext (`vault:v1:...`).
pub type Ciphertext = String;

/// An environment variable name.
pub type VarName = String;
