//! Json command.
//!
//! Converts a .env file into a flat JSON object. With Transit encryption
//! enabled, every value is replaced by its ciphertext so the output can be
//! committed or pasted into `vault kv put`.

use std::collections::BTreeMap;
use std::path::Path;

use crate::cli::{Context, JsonArgs};
use crate::core::backend::Backend;
use crate::core::env::Env;
use crate::core::render;
use crate::core::transit::{EncryptionContext, Sealer};
use crate::error::Result;

/// Print a .env file as JSON.
pub fn execute(args: JsonArgs, ctx: &Context) -> Result<()> {
    let text = match ctx.transit.for_write(None) {
        Some(encryption) => {
            let backend = ctx.connect(None)?;
            convert(&args.file, Some((&backend, &encryption)))?
        }
        None => convert(&args.file, None)?,
    };

    println!("{}", text);
    Ok(())
}

/// Render `file` as pretty JSON, sealing each value when `encryption` is
/// given.
pub fn convert(
    file: &Path,
    encryption: Option<(&dyn Backend, &EncryptionContext)>,
) -> Result<String> {
    let env = Env::load(file)?;

    let fields = match encryption {
        Some((backend, ctx)) => {
            let sealer = Sealer::new(backend, Some(ctx));
            env.entries()
                .iter()
                .map(|(key, value)| -> Result<(String, String)> {
                    Ok((key.clone(), sealer.seal(value)?.as_stored().to_string()))
                })
                .collect::<Result<BTreeMap<_, _>>>()?
        }
        None => env.into_entries().into_iter().collect(),
    };

    render::fields_to_json(&fields)
}
