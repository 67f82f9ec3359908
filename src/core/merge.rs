//! Merge engine.
//!
//! Combines the record currently stored at a path with an update. Values
//! carried over from the existing record are copied verbatim; only values
//! introduced by the update pass through the [`Sealer`]. Any sealing
//! failure aborts the merge, so callers never write a partial record.

use std::collections::BTreeMap;

use tracing::debug;

use crate::core::record::{FieldValue, Record};
use crate::core::transit::Sealer;
use crate::core::types::FieldName;
use crate::core::validation::validate_field_name;
use crate::error::Result;

/// A change to apply to a stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// Replace the whole record with an already-sealed one.
    Replace(Record),
    /// Overlay plaintext fields onto the existing multi-value fields.
    Merge(BTreeMap<FieldName, String>),
    /// Store a single unnamed value.
    Set(String),
    /// Add or overwrite one named field.
    SetField { field: FieldName, value: String },
}

impl Update {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Replace(_) => "replace",
            Self::Merge(_) => "merge",
            Self::Set(_) => "set",
            Self::SetField { .. } => "set-field",
        }
    }
}

/// Apply `update` to `existing`.
///
/// # Errors
///
/// `ValidationError::EmptyField` for an empty field name,
/// `ValidationError::ReservedField` for a sentinel name, or the oracle error
/// when sealing fails.
pub fn merge(existing: Record, update: Update, sealer: &Sealer) -> Result<Record> {
    debug!(
        existing = %existing.shape(),
        existing_fields = existing.len(),
        update = update.kind(),
        encrypt = sealer.is_encrypting(),
        "merging record"
    );

    let merged = match update {
        Update::Replace(record) => record,

        Update::Set(value) => match sealer.seal(&value)? {
            FieldValue::Cipher(ciphertext) => Record::SingletonCipher(ciphertext),
            FieldValue::Plain(plain) => Record::SingletonPlain(plain),
        },

        Update::SetField { field, value } => {
            validate_field_name(&field)?;
            let sealed = sealer.seal(&value)?;
            let mut fields = existing.into_multi();
            fields.insert(field, sealed);
            Record::MultiValue(fields)
        }

        Update::Merge(incoming) => {
            for name in incoming.keys() {
                validate_field_name(name)?;
            }
            // Seal everything before touching the existing fields.
            let sealed = incoming
                .into_iter()
                .map(|(name, value)| Ok((name, sealer.seal(&value)?)))
                .collect::<Result<Vec<_>>>()?;

            let mut fields = existing.into_multi();
            fields.extend(sealed);
            if fields.is_empty() {
                Record::Empty
            } else {
                Record::MultiValue(fields)
            }
        }
    };

    Ok(merged)
}
