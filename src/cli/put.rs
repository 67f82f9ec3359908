//! Put command.
//!
//! Stores a single value, one named field, or a whole file at a KV path.

use std::io::Read;
use std::path::PathBuf;

use tracing::debug;
use zeroize::Zeroizing;

use crate::cli::{output, Context, PutArgs};
use crate::core::backend::{Backend, SecretPath};
use crate::core::constants;
use crate::core::loader;
use crate::core::merge::{merge, Update};
use crate::core::record::Record;
use crate::core::transit::{EncryptionContext, Sealer};
use crate::core::validation::{self, PutSource};
use crate::error::Result;

/// What to store, after flag validation.
pub enum PutInput {
    Value(Zeroizing<String>),
    Field {
        field: String,
        value: Zeroizing<String>,
    },
    EnvFile {
        path: PathBuf,
        merge: bool,
    },
    RawFile(PathBuf),
}

/// Summary of a completed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stored {
    pub path: SecretPath,
    pub field: Option<String>,
    pub count: usize,
    pub encrypted: bool,
}

impl std::fmt::Display for Stored {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = if self.encrypted { "encrypted" } else { "plaintext" };
        match &self.field {
            Some(field) => write!(f, "Updated key '{}' as {}: {}", field, mode, self.path),
            None => write!(f, "Stored {} secret(s) as {}: {}", self.count, mode, self.path),
        }
    }
}

/// Store a secret.
pub fn execute(args: PutArgs, ctx: &Context) -> Result<()> {
    let input = collect_input(&args)?;
    let path = SecretPath::new(
        args.kv_mount.as_deref().unwrap_or(constants::KV_MOUNT),
        &args.path,
    );

    let backend = ctx.connect(None)?;
    let encryption = ctx.transit.for_write(None);
    let stored = store(&backend, &path, &input, encryption.as_ref())?;

    output::success(&stored.to_string());
    Ok(())
}

fn collect_input(args: &PutArgs) -> Result<PutInput> {
    let source = validation::put_source(
        args.value.as_deref(),
        args.from_env.as_deref(),
        args.from_file.as_deref(),
        args.key.as_deref(),
        args.merge,
    )?;

    let value = match source {
        PutSource::EnvFile(path) => {
            return Ok(PutInput::EnvFile {
                path: path.to_path_buf(),
                merge: args.merge,
            })
        }
        PutSource::RawFile(path) => return Ok(PutInput::RawFile(path.to_path_buf())),
        PutSource::Value(value) => Zeroizing::new(value.to_string()),
        PutSource::Stdin => read_stdin()?,
    };

    validation::validate_value(&value)?;

    Ok(match &args.key {
        Some(field) => PutInput::Field {
            field: field.clone(),
            value,
        },
        None => PutInput::Value(value),
    })
}

fn read_stdin() -> Result<Zeroizing<String>> {
    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer)?;
    Ok(Zeroizing::new(validation::strip_trailing_newline(buffer)))
}

fn fetch_existing(backend: &dyn Backend, path: &SecretPath) -> Result<Record> {
    Ok(Record::from_fetched(backend.read(path)?))
}

/// Merge `input` into the record at `path` and write the result.
///
/// The existing record is only fetched when the update keeps part of it.
/// Every value is sealed before the single write, so a failure leaves the
/// stored record untouched.
pub fn store(
    backend: &dyn Backend,
    path: &SecretPath,
    input: &PutInput,
    encryption: Option<&EncryptionContext>,
) -> Result<Stored> {
    let sealer = Sealer::new(backend, encryption).for_record(path);

    let (existing, update, field) = match input {
        PutInput::Value(value) => (Record::Empty, Update::Set(value.to_string()), None),
        PutInput::Field { field, value } => (
            fetch_existing(backend, path)?,
            Update::SetField {
                field: field.clone(),
                value: value.to_string(),
            },
            Some(field.clone()),
        ),
        PutInput::EnvFile { path: file, merge: true } => (
            fetch_existing(backend, path)?,
            Update::Merge(loader::read_env_fields(file)?),
            None,
        ),
        PutInput::EnvFile { path: file, merge: false } => (
            Record::Empty,
            Update::Replace(loader::load_env_file(file, &sealer)?),
            None,
        ),
        PutInput::RawFile(file) => (
            Record::Empty,
            Update::Replace(loader::load_raw_file(file, &sealer)?),
            None,
        ),
    };

    let count = match &update {
        Update::Set(_) | Update::SetField { .. } => 1,
        Update::Merge(fields) => fields.len(),
        Update::Replace(record) => record.len(),
    };

    let merged = merge(existing, update, &sealer)?;
    debug!(path = %path, shape = %merged.shape(), fields = merged.len(), "writing record");
    backend.write(path, &merged.to_fields())?;

    Ok(Stored {
        path: path.clone(),
        field,
        count,
        encrypted: sealer.is_encrypting(),
    })
}

/// Convenience for tests and scripts: store a plain value.
pub fn store_value(
    backend: &dyn Backend,
    path: &SecretPath,
    value: &str,
    encryption: Option<&EncryptionContext>,
) -> Result<Stored> {
    store(
        backend,
        path,
        &PutInput::Value(Zeroizing::new(value.to_string())),
        encryption,
    )
}
