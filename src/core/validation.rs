//! Input validation for `put`.
//!
//! Checks the combination of input flags before anything is read or fetched.

use std::path::Path;

use crate::core::constants::{CIPHERTEXT_FIELD, PLAINTEXT_FIELD};
use crate::error::{Result, SecretError, ValidationError};

/// Where a `put` takes its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutSource<'a> {
    Value(&'a str),
    EnvFile(&'a Path),
    RawFile(&'a Path),
    Stdin,
}

/// Choose the input source from the flags given.
///
/// # Errors
///
/// - `ValidationError::ConflictingInputs` for more than one source
/// - `ValidationError::FieldWithBulkLoad` for `--key` with a file loader
/// - `ValidationError::MergeWithoutEnvFile` for `--merge` without `--from-env`
pub fn put_source<'a>(
    value: Option<&'a str>,
    from_env: Option<&'a Path>,
    from_file: Option<&'a Path>,
    field: Option<&str>,
    merge: bool,
) -> Result<PutSource<'a>> {
    let given = [value.is_some(), from_env.is_some(), from_file.is_some()]
        .into_iter()
        .filter(|set| *set)
        .count();
    if given > 1 {
        return Err(ValidationError::ConflictingInputs.into());
    }

    if field.is_some() && (from_env.is_some() || from_file.is_some()) {
        return Err(ValidationError::FieldWithBulkLoad.into());
    }

    if merge && from_env.is_none() {
        return Err(ValidationError::MergeWithoutEnvFile.into());
    }

    if let Some(field) = field {
        validate_field_name(field)?;
    }

    Ok(match (value, from_env, from_file) {
        (Some(value), _, _) => PutSource::Value(value),
        (_, Some(path), _) => PutSource::EnvFile(path),
        (_, _, Some(path)) => PutSource::RawFile(path),
        _ => PutSource::Stdin,
    })
}

/// Field names must be non-empty and must not collide with the singleton
/// sentinels, which would read back as a single unnamed value.
pub fn validate_field_name(field: &str) -> Result<()> {
    if field.trim().is_empty() {
        return Err(ValidationError::EmptyField.into());
    }
    if field == PLAINTEXT_FIELD || field == CIPHERTEXT_FIELD {
        return Err(ValidationError::ReservedField(field.to_string()).into());
    }
    Ok(())
}

/// Secret values must be non-empty.
pub fn validate_value(value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(SecretError::NoValue.into());
    }
    Ok(())
}

/// Drop one trailing line ending, as left by `echo` or a heredoc.
pub fn strip_trailing_newline(mut input: String) -> String {
    if input.ends_with('\n') {
        input.pop();
        if input.ends_with('\r') {
            input.pop();
        }
    }
    input
}
