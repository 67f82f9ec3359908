//! Bulk loaders.
//!
//! Turn a file into a complete [`Record`], sealing values when encryption is
//! active. The result always replaces whatever is stored at the target path
//! unless the caller asks the merge engine otherwise, so an env file with no
//! variables is refused rather than wiping the record.

use std::collections::BTreeMap;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;
use zeroize::Zeroizing;

use crate::core::env::Env;
use crate::core::record::{FieldValue, Record};
use crate::core::transit::Sealer;
use crate::core::validation::validate_field_name;
use crate::error::{LoadError, Result, ValidationError};

/// Read an env file as plaintext field pairs.
///
/// # Errors
///
/// `LoadError` for an unreadable or malformed file,
/// `ValidationError::EmptyEnvFile` when it holds no variables, and
/// `ValidationError::ReservedField` for a variable named after a singleton
/// sentinel.
pub fn read_env_fields(path: &Path) -> Result<BTreeMap<String, String>> {
    let fields: BTreeMap<String, String> =
        Env::load(path)?.into_entries().into_iter().collect();

    if fields.is_empty() {
        return Err(ValidationError::EmptyEnvFile(path.display().to_string()).into());
    }
    for name in fields.keys() {
        validate_field_name(name)?;
    }
    Ok(fields)
}

/// Build a multi-value record from an env file, one field per variable.
///
/// # Errors
///
/// Everything [`read_env_fields`] rejects, plus oracle errors when sealing
/// fails. Nothing is written in either case.
pub fn load_env_file(path: &Path, sealer: &Sealer) -> Result<Record> {
    let fields = read_env_fields(path)?;
    debug!(path = %path.display(), fields = fields.len(), encrypt = sealer.is_encrypting(), "loaded env file");

    let sealed = fields
        .into_iter()
        .map(|(name, value)| {
            let value = Zeroizing::new(value);
            Ok((name, sealer.seal(&value)?))
        })
        .collect::<Result<BTreeMap<_, _>>>()?;

    Ok(Record::MultiValue(sealed))
}

/// Build a singleton record holding the base64 encoding of a whole file.
///
/// # Errors
///
/// `LoadError::Read` if the file cannot be read; oracle errors when sealing.
pub fn load_raw_file(path: &Path, sealer: &Sealer) -> Result<Record> {
    let bytes = Zeroizing::new(std::fs::read(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?);
    let encoded = Zeroizing::new(STANDARD.encode(bytes.as_slice()));
    debug!(path = %path.display(), bytes = bytes.len(), encrypt = sealer.is_encrypting(), "loaded raw file");

    let record = match sealer.seal(&encoded)? {
        FieldValue::Cipher(ciphertext) => Record::SingletonCipher(ciphertext),
        FieldValue::Plain(plain) => Record::SingletonPlain(plain),
    };
    Ok(record)
}
