//! Get command.
//!
//! Prints one secret, one field of it, or every secret listed in a config
//! file. Single values are printed without a trailing newline so they can be
//! captured with `$(vault-env get ...)`.

use std::io::Write;

use zeroize::Zeroizing;

use crate::cli::{output, Context, GetArgs};
use crate::core::aggregate::{self, Lookup};
use crate::core::backend::{Backend, SecretPath};
use crate::core::config::SecretsConfig;
use crate::core::constants;
use crate::core::record::{FieldValue, Record};
use crate::core::render;
use crate::core::transit::{EncryptionContext, Opener};
use crate::error::{Result, SecretError, ValidationError};

/// How to print a multi-value record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Env,
    Json,
}

impl Format {
    pub fn from_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Env
        }
    }
}

/// Read and print secrets.
pub fn execute(args: GetArgs, ctx: &Context) -> Result<()> {
    let format = Format::from_flag(args.json);

    let text = match &args.path {
        Some(path) => {
            let path = SecretPath::new(
                args.kv_mount.as_deref().unwrap_or(constants::KV_MOUNT),
                path,
            );
            let backend = ctx.connect(None)?;
            let encryption = ctx.transit.for_read(None);
            read(&backend, &path, args.key.as_deref(), format, encryption.as_ref())?
        }
        None => {
            let config = SecretsConfig::discover(args.config.as_deref())?
                .ok_or(ValidationError::NoSource)?;
            let backend = ctx.connect(Some(&config))?;
            let encryption = ctx.transit.for_read(config.transit.as_ref());
            let kv_mount = config.kv_mount(args.kv_mount.as_deref());
            read_config(
                &backend,
                &config,
                Lookup {
                    kv_mount: &kv_mount,
                    ctx: encryption.as_ref(),
                },
                args.key.as_deref(),
                format,
            )?
        }
    };

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// Render the secret at `path`.
///
/// - a single value prints as-is
/// - `field` selects one field, printed as-is
/// - a record with one plaintext field prints that field's value
/// - otherwise every field, as env lines or JSON
///
/// # Errors
///
/// `SecretError::NotFound` for an absent path, `SecretError::FieldNotFound`
/// for a missing field, `SecretError::EncryptionKeyRequired` when an
/// encrypted value is read without a key.
pub fn read(
    backend: &dyn Backend,
    path: &SecretPath,
    field: Option<&str>,
    format: Format,
    encryption: Option<&EncryptionContext>,
) -> Result<Zeroizing<String>> {
    let fields = backend
        .read(path)?
        .ok_or_else(|| SecretError::NotFound(path.to_string()))?;
    let record = Record::from_fields(fields);
    let opener = Opener::new(backend, encryption);

    if let Some(field) = field {
        let value = record.field(field).ok_or_else(|| SecretError::FieldNotFound {
            field: field.to_string(),
            path: path.to_string(),
        })?;
        return Ok(Zeroizing::new(opener.open(&value, path)?));
    }

    let text = match record {
        Record::Empty => match format {
            Format::Json => "{}\n".to_string(),
            Format::Env => String::new(),
        },
        Record::SingletonPlain(value) => value,
        Record::SingletonCipher(ciphertext) => opener.decrypt(&ciphertext, path)?,
        Record::MultiValue(fields)
            if fields.len() == 1 && !fields.values().any(FieldValue::is_cipher) =>
        {
            let (_, value) = fields
                .into_iter()
                .next()
                .ok_or_else(|| SecretError::NotFound(path.to_string()))?;
            opener.open(&value, path)?
        }
        Record::MultiValue(fields) => {
            let plain = opener.open_all(&fields, path)?;
            match format {
                Format::Json => format!("{}\n", render::fields_to_json(&plain)?),
                Format::Env => {
                    render::to_env_lines(plain.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                }
            }
        }
    };

    Ok(Zeroizing::new(text))
}

/// Render every secret listed in `config`.
///
/// With `var`, prints only that variable's value.
pub fn read_config(
    backend: &dyn Backend,
    config: &SecretsConfig,
    lookup: Lookup<'_>,
    var: Option<&str>,
    format: Format,
) -> Result<Zeroizing<String>> {
    let resolution = aggregate::resolve(backend, &config.secrets, lookup);
    output::entry_warnings(&resolution.warnings);
    let vars = resolution.finish()?;

    if let Some(var) = var {
        let value = vars.get(var).ok_or_else(|| SecretError::FieldNotFound {
            field: var.to_string(),
            path: "configured secrets".to_string(),
        })?;
        return Ok(Zeroizing::new(value.to_string()));
    }

    let text = match format {
        Format::Json => format!("{}\n", render::env_to_json(&vars)?),
        Format::Env => render::to_env_lines(vars.iter()),
    };
    Ok(Zeroizing::new(text))
}
