//! vault-env - Vault KV and Transit secrets for the command line.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vault_env::cli::output;
use vault_env::cli::{execute, Cli, Context};
use vault_env::error::{ConfigError, Error, SecretError, ValidationError};

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for secret values
    let filter = EnvFilter::try_from_env("VAULT_ENV_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("vault_env=debug")
        } else {
            EnvFilter::new("vault_env=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let ctx = Context {
        vault: cli.vault.options(),
        transit: cli.transit.options(),
    };

    if let Err(e) = execute(cli.command, &ctx) {
        let suggestion = match &e {
            Error::Config(ConfigError::MissingAddress) => Some("set VAULT_ADDR or pass --vault-addr"),
            Error::Config(ConfigError::MissingCredential { .. }) => {
                Some("set the variable or pass --vault-auth-method to pick another method")
            }
            Error::Secret(SecretError::EncryptionKeyRequired(_)) => {
                Some("pass --encryption-key or set ENCRYPTION_KEY")
            }
            Error::Validation(ValidationError::NoSource) => Some("pass --path or --config"),
            Error::Validation(ValidationError::NoRunSource) => {
                Some("pass --config or at least one --inject ENV_VAR=path")
            }
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
