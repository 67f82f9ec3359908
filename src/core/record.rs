//! Secret record classification.
//!
//! A record stored in KV is an untyped string map, but it always means one
//! of a few things: nothing, one unnamed plaintext secret, one unnamed
//! encrypted secret, or a set of named fields that may individually be
//! encrypted. [`Record`] makes that explicit. The sentinel keys used by the
//! stored format only appear in [`Record::from_fields`] and
//! [`Record::to_fields`].

use std::collections::BTreeMap;

use crate::core::constants::{CIPHERTEXT_FIELD, CIPHERTEXT_PREFIX, PLAINTEXT_FIELD};
use crate::core::types::{FieldMap, FieldName};

/// Whether a stored string is a Transit ciphertext.
pub fn is_ciphertext(value: &str) -> bool {
    value.starts_with(CIPHERTEXT_PREFIX)
}

/// A single field of a multi-value record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Plain(String),
    Cipher(String),
}

impl FieldValue {
    /// Classify a stored string by the ciphertext prefix.
    pub fn classify(raw: String) -> Self {
        if is_ciphertext(&raw) {
            Self::Cipher(raw)
        } else {
            Self::Plain(raw)
        }
    }

    /// The stored representation.
    pub fn as_stored(&self) -> &str {
        match self {
            Self::Plain(v) | Self::Cipher(v) => v,
        }
    }

    pub fn is_cipher(&self) -> bool {
        matches!(self, Self::Cipher(_))
    }
}

/// The four outcomes of classification.
///
/// The empty record classifies as [`Shape::MultiPlaintext`]; callers that
/// care about emptiness check [`Record::is_empty`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    SingleEncrypted,
    SinglePlaintext,
    MultiEncrypted,
    MultiPlaintext,
}

impl Shape {
    pub fn is_single(self) -> bool {
        matches!(self, Self::SingleEncrypted | Self::SinglePlaintext)
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::SingleEncrypted => "single encrypted value",
            Self::SinglePlaintext => "single plaintext value",
            Self::MultiEncrypted => "multi-value (encrypted)",
            Self::MultiPlaintext => "multi-value (plaintext)",
        };
        f.write_str(name)
    }
}

/// A secret record in its logical shape.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Record {
    #[default]
    Empty,
    SingletonPlain(String),
    SingletonCipher(String),
    MultiValue(BTreeMap<FieldName, FieldValue>),
}

impl Record {
    /// Classify a stored field map.
    ///
    /// Never fails: anything that is not a recognised singleton becomes a
    /// multi-value record, with each field classified on its own.
    pub fn from_fields(fields: FieldMap) -> Self {
        if fields.is_empty() {
            return Self::Empty;
        }

        if fields.len() == 1 {
            if let Some(ciphertext) = fields.get(CIPHERTEXT_FIELD) {
                if is_ciphertext(ciphertext) {
                    return Self::SingletonCipher(ciphertext.clone());
                }
            }
            if let Some(value) = fields.get(PLAINTEXT_FIELD) {
                return Self::SingletonPlain(value.clone());
            }
        }

        Self::MultiValue(
            fields
                .into_iter()
                .map(|(name, raw)| (name, FieldValue::classify(raw)))
                .collect(),
        )
    }

    /// Classify an optional fetch result; absent records are empty.
    pub fn from_fetched(fields: Option<FieldMap>) -> Self {
        fields.map(Self::from_fields).unwrap_or_default()
    }

    /// Serialize back to the stored field map.
    pub fn to_fields(&self) -> FieldMap {
        match self {
            Self::Empty => FieldMap::new(),
            Self::SingletonPlain(value) => {
                FieldMap::from([(PLAINTEXT_FIELD.to_string(), value.clone())])
            }
            Self::SingletonCipher(ciphertext) => {
                FieldMap::from([(CIPHERTEXT_FIELD.to_string(), ciphertext.clone())])
            }
            Self::MultiValue(fields) => fields
                .iter()
                .map(|(name, value)| (name.clone(), value.as_stored().to_string()))
                .collect(),
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            Self::SingletonCipher(_) => Shape::SingleEncrypted,
            Self::SingletonPlain(_) => Shape::SinglePlaintext,
            Self::MultiValue(fields) if fields.values().any(FieldValue::is_cipher) => {
                Shape::MultiEncrypted
            }
            Self::MultiValue(_) | Self::Empty => Shape::MultiPlaintext,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::MultiValue(fields) => fields.is_empty(),
            _ => false,
        }
    }

    /// Number of stored fields.
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::SingletonPlain(_) | Self::SingletonCipher(_) => 1,
            Self::MultiValue(fields) => fields.len(),
        }
    }

    /// Whether decrypting this record needs an encryption key.
    pub fn needs_key(&self) -> bool {
        matches!(self.shape(), Shape::SingleEncrypted | Shape::MultiEncrypted)
    }

    /// Collapse into a multi-value map.
    ///
    /// Singletons are dropped rather than converted: their sentinel key is
    /// not a field name and must never reappear as one.
    pub fn into_multi(self) -> BTreeMap<FieldName, FieldValue> {
        match self {
            Self::MultiValue(fields) => fields,
            Self::Empty | Self::SingletonPlain(_) | Self::SingletonCipher(_) => BTreeMap::new(),
        }
    }

    /// Look up a named field.
    ///
    /// Singletons answer only to their sentinel name.
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        match self {
            Self::MultiValue(fields) => fields.get(name).cloned(),
            Self::SingletonPlain(value) if name == PLAINTEXT_FIELD => {
                Some(FieldValue::Plain(value.clone()))
            }
            Self::SingletonCipher(ciphertext) if name == CIPHERTEXT_FIELD => {
                Some(FieldValue::Cipher(ciphertext.clone()))
            }
            _ => None,
        }
    }
}
