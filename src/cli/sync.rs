//! Sync command.
//!
//! Resolves every configured secret and writes them to a .env file. The
//! file is only written when every required secret resolved.

use std::path::Path;

use crate::cli::{output, Context, SyncArgs};
use crate::core::aggregate::{self, Lookup};
use crate::core::backend::Backend;
use crate::core::config::SecretsConfig;
use crate::core::env::Env;
use crate::error::Result;

/// Generate a .env file from the config.
pub fn execute(args: SyncArgs, ctx: &Context) -> Result<()> {
    let config = SecretsConfig::load(&args.config)?;
    let backend = ctx.connect(Some(&config))?;
    let encryption = ctx.transit.for_read(config.transit.as_ref());
    let kv_mount = config.kv_mount(args.kv_mount.as_deref());

    let count = sync(
        &backend,
        &config,
        Lookup {
            kv_mount: &kv_mount,
            ctx: encryption.as_ref(),
        },
        &args.output,
    )?;

    output::success(&format!(
        "Generated {} with {} secrets",
        output::path(&args.output.display().to_string()),
        count
    ));
    Ok(())
}

/// Resolve `config` and write the result to `output_path` with mode 0600.
///
/// Returns the number of variables written.
///
/// # Errors
///
/// `AggregateError::Required` when any required entry failed; the output
/// file is left as it was.
pub fn sync(
    backend: &dyn Backend,
    config: &SecretsConfig,
    lookup: Lookup<'_>,
    output_path: &Path,
) -> Result<usize> {
    let resolution = aggregate::resolve(backend, &config.secrets, lookup);
    output::entry_warnings(&resolution.warnings);
    let vars = resolution.finish()?;

    let env = Env::from_pairs(vars.into_vec(), output_path.to_path_buf());
    env.save()?;
    Ok(env.len())
}
