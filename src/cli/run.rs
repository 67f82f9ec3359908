//! Run command.
//!
//! Executes a command with secrets injected as environment variables.
//! Layers, later ones winning: the inherited environment, `--env-file`,
//! config entries, `--inject` arguments.

use std::path::Path;
use std::process::Command;

use tracing::debug;
use zeroize::Zeroizing;

use crate::cli::{output, Context, RunArgs};
use crate::core::aggregate::{self, EnvMap, Injection, Lookup};
use crate::core::backend::Backend;
use crate::core::config::SecretsConfig;
use crate::core::constants;
use crate::core::env::Env;
use crate::error::{Error, Result, ValidationError};

/// Run a command with secrets injected as environment variables.
pub fn execute(args: RunArgs, ctx: &Context) -> Result<()> {
    if args.command.is_empty() {
        return Err(ValidationError::NoCommand.into());
    }

    let injections = args
        .inject
        .iter()
        .map(|raw| raw.parse::<Injection>())
        .collect::<Result<Vec<_>>>()?;

    let config = SecretsConfig::discover(args.config.as_deref())?;
    if config.is_none() && injections.is_empty() {
        return Err(ValidationError::NoRunSource.into());
    }

    let inherited: Vec<(String, String)> = if args.preserve_env {
        std::env::vars().collect()
    } else {
        Vec::new()
    };

    let backend = ctx.connect(config.as_ref())?;
    let encryption = ctx
        .transit
        .for_read(config.as_ref().and_then(|c| c.transit.as_ref()));
    let kv_mount = match &config {
        Some(config) => config.kv_mount(args.kv_mount.as_deref()),
        None => args
            .kv_mount
            .clone()
            .unwrap_or_else(|| constants::KV_MOUNT.to_string()),
    };

    let added = secret_environment(
        &backend,
        args.env_file.as_deref(),
        config.as_ref(),
        &injections,
        Lookup {
            kv_mount: &kv_mount,
            ctx: encryption.as_ref(),
        },
    )?;

    if args.dry_run {
        println!("Environment variables that would be set:");
        print!("{}", crate::core::render::to_env_lines(added.iter()));
        println!();
        println!("Command that would be executed: {}", args.command.join(" "));
        return Ok(());
    }

    let mut environment: EnvMap = inherited.into_iter().collect();
    environment.extend(added.into_vec());

    let exit_code = spawn(&args.command, environment, args.preserve_env)?;
    std::process::exit(exit_code);
}

/// Variables vault-env adds on top of the inherited environment.
///
/// Config entries follow the usual required/optional rules; a failed
/// injection is always fatal.
pub fn secret_environment(
    backend: &dyn Backend,
    env_file: Option<&Path>,
    config: Option<&SecretsConfig>,
    injections: &[Injection],
    lookup: Lookup<'_>,
) -> Result<EnvMap> {
    let mut vars = EnvMap::new();

    if let Some(path) = env_file {
        let env = Env::load(path)?;
        debug!(path = %path.display(), vars = env.len(), "loaded env file");
        vars.extend(env.into_entries());
    }

    if let Some(config) = config {
        let resolution = aggregate::resolve(backend, &config.secrets, lookup);
        output::entry_warnings(&resolution.warnings);
        vars.extend(resolution.finish()?.into_vec());
    }

    if !injections.is_empty() {
        let injected = aggregate::resolve_injections(backend, injections, lookup)?;
        vars.extend(injected.into_vec());
    }

    Ok(vars)
}

/// Run `command` with exactly `environment`, forwarding stdio.
///
/// Returns the child's exit code; a child killed by a signal maps to
/// 128 + signal number.
fn spawn(command: &[String], environment: EnvMap, inherit: bool) -> Result<i32> {
    let (program, rest) = command.split_first().ok_or(ValidationError::NoCommand)?;

    let mut cmd = Command::new(program);
    cmd.args(rest);
    if !inherit {
        cmd.env_clear();
    }

    for (key, value) in environment.into_vec() {
        let value = Zeroizing::new(value);
        cmd.env(key, value.as_str());
    }

    debug!(program = %program, "spawning command");
    let status = cmd
        .status()
        .map_err(|e| Error::Other(format!("failed to run {}: {}", program, e)))?;

    Ok(exit_code(status))
}

#[cfg(unix)]
fn exit_code(status: std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}
