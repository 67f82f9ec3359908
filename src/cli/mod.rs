//! Command-line interface.

pub mod completions;
pub mod get;
pub mod json;
pub mod output;
pub mod put;
pub mod run;
pub mod sync;

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::core::backend::VaultClient;
use crate::core::config::SecretsConfig;
use crate::core::constants;
use crate::core::settings::VaultOptions;
use crate::core::transit::{parse_toggle, TransitOptions};
use crate::error::Result;

/// vault-env - Vault KV and Transit secrets for the command line.
#[derive(Parser)]
#[command(
    name = "vault-env",
    about = "Store, fetch and inject secrets from HashiCorp Vault",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub vault: VaultArgs,

    #[command(flatten)]
    pub transit: TransitArgs,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Connection and authentication options.
#[derive(Args, Debug, Clone, Default)]
pub struct VaultArgs {
    /// Vault server address
    #[arg(long, env = "VAULT_ADDR", global = true)]
    pub vault_addr: Option<String>,

    /// Vault token
    #[arg(long, env = "VAULT_TOKEN", global = true, hide_env_values = true)]
    pub vault_token: Option<String>,

    /// Vault Enterprise namespace
    #[arg(long, env = "VAULT_NAMESPACE", global = true)]
    pub vault_namespace: Option<String>,

    /// PEM CA certificate used to verify the server
    #[arg(long, env = "VAULT_CACERT", global = true)]
    pub vault_cacert: Option<PathBuf>,

    /// Skip TLS certificate verification
    #[arg(
        long,
        env = "VAULT_SKIP_VERIFY",
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = parse_toggle
    )]
    pub vault_skip_verify: Option<bool>,

    /// Per-request timeout in seconds [default: 15]
    #[arg(long, env = "VAULT_TIMEOUT", global = true)]
    pub vault_timeout: Option<u64>,

    /// Auth method: token, approle, github, kubernetes
    #[arg(long, env = "VAULT_AUTH_METHOD", global = true)]
    pub vault_auth_method: Option<String>,

    /// AppRole role id
    #[arg(long, env = "VAULT_ROLE_ID", global = true)]
    pub vault_role_id: Option<String>,

    /// AppRole secret id
    #[arg(long, env = "VAULT_SECRET_ID", global = true, hide_env_values = true)]
    pub vault_secret_id: Option<String>,

    /// GitHub personal access token
    #[arg(long, env = "VAULT_GITHUB_TOKEN", global = true, hide_env_values = true)]
    pub vault_github_token: Option<String>,

    /// Kubernetes auth role
    #[arg(long, env = "VAULT_K8S_ROLE", global = true)]
    pub vault_k8s_role: Option<String>,

    /// Kubernetes service-account token path
    #[arg(long, env = "VAULT_K8S_JWT_PATH", global = true)]
    pub vault_k8s_jwt_path: Option<PathBuf>,

    /// Kubernetes auth mount
    #[arg(long, env = "VAULT_K8S_AUTH_PATH", global = true)]
    pub vault_k8s_auth_path: Option<String>,
}

impl VaultArgs {
    pub fn options(&self) -> VaultOptions {
        VaultOptions {
            addr: self.vault_addr.clone(),
            token: self.vault_token.clone(),
            namespace: self.vault_namespace.clone(),
            ca_cert: self.vault_cacert.clone(),
            skip_verify: self.vault_skip_verify,
            timeout_secs: self.vault_timeout,
            auth_method: self.vault_auth_method.clone(),
            role_id: self.vault_role_id.clone(),
            secret_id: self.vault_secret_id.clone(),
            github_token: self.vault_github_token.clone(),
            k8s_role: self.vault_k8s_role.clone(),
            k8s_jwt_path: self.vault_k8s_jwt_path.clone(),
            k8s_auth_path: self.vault_k8s_auth_path.clone(),
        }
    }
}

/// Transit encryption options.
#[derive(Args, Debug, Clone, Default)]
pub struct TransitArgs {
    /// Transit key to encrypt and decrypt with
    #[arg(long, env = "ENCRYPTION_KEY", global = true, hide_env_values = true)]
    pub encryption_key: Option<String>,

    /// Transit mount [default: transit]
    #[arg(long, env = "TRANSIT_MOUNT", global = true)]
    pub transit_mount: Option<String>,

    /// Enable or disable Transit encryption for writes
    #[arg(
        long,
        env = "TRANSIT",
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = parse_toggle
    )]
    pub transit: Option<bool>,
}

impl TransitArgs {
    pub fn options(&self) -> TransitOptions {
        TransitOptions {
            key: self.encryption_key.clone(),
            mount: self.transit_mount.clone(),
            enabled: self.transit,
        }
    }
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Store a secret value, a field, or a whole file
    #[command(visible_alias = "p")]
    Put(PutArgs),

    /// Read a secret, or every secret in a config file
    #[command(visible_alias = "g")]
    Get(GetArgs),

    /// Write configured secrets to a .env file
    #[command(visible_alias = "s")]
    Sync(SyncArgs),

    /// Run a command with secrets in its environment
    #[command(visible_alias = "r")]
    Run(RunArgs),

    /// Convert a .env file to JSON
    #[command(visible_alias = "j")]
    Json(JsonArgs),

    /// Generate shell completions
    #[command(visible_alias = "comp")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
pub struct PutArgs {
    /// Secret path under the KV mount
    #[arg(short, long)]
    pub path: String,

    /// Store the value under this field, keeping the others
    #[arg(short, long)]
    pub key: Option<String>,

    /// Secret value (read from stdin when no input is given)
    #[arg(long)]
    pub value: Option<String>,

    /// Store every variable of a .env file as a field
    #[arg(long, value_name = "FILE")]
    pub from_env: Option<PathBuf>,

    /// Store a file's content, base64 encoded
    #[arg(long, value_name = "FILE")]
    pub from_file: Option<PathBuf>,

    /// Merge --from-env fields into the existing record instead of replacing it
    #[arg(long)]
    pub merge: bool,

    /// KV v2 mount [default: kv]
    #[arg(long)]
    pub kv_mount: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct GetArgs {
    /// Secret path under the KV mount
    #[arg(short, long, conflicts_with = "config")]
    pub path: Option<String>,

    /// Config file listing secrets [default: vault-env.yaml]
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print only this field
    #[arg(short, long)]
    pub key: Option<String>,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,

    /// KV v2 mount [default: kv]
    #[arg(long)]
    pub kv_mount: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    /// Config file listing secrets
    #[arg(short, long, default_value = constants::CONFIG_FILE)]
    pub config: PathBuf,

    /// Output file
    #[arg(short, long, default_value = constants::ENV_FILE)]
    pub output: PathBuf,

    /// KV v2 mount [default: kv]
    #[arg(long)]
    pub kv_mount: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Config file listing secrets [default: vault-env.yaml]
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Inject a secret as ENV_VAR=path (repeatable)
    #[arg(short, long, value_name = "ENV_VAR=PATH")]
    pub inject: Vec<String>,

    /// Load variables from a .env file first
    #[arg(long, value_name = "FILE")]
    pub env_file: Option<PathBuf>,

    /// Print the environment instead of running the command
    #[arg(long)]
    pub dry_run: bool,

    /// Pass the current environment through to the command
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub preserve_env: bool,

    /// KV v2 mount [default: kv]
    #[arg(long)]
    pub kv_mount: Option<String>,

    /// Command and arguments, after --
    #[arg(last = true)]
    pub command: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct JsonArgs {
    /// .env file to convert
    #[arg(default_value = constants::ENV_FILE)]
    pub file: PathBuf,
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

/// Options shared by every command, resolved once from flags and
/// environment.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub vault: VaultOptions,
    pub transit: TransitOptions,
}

impl Context {
    /// Validate settings and connect.
    ///
    /// The config file's `vault:` section fills in anything not given on
    /// the command line or in the environment.
    pub fn connect(&self, config: Option<&SecretsConfig>) -> Result<VaultClient> {
        let settings = self
            .vault
            .resolve(config.and_then(|c| c.vault.as_ref()))?;
        VaultClient::connect(&settings)
    }
}

/// Execute a command.
pub fn execute(command: Command, ctx: &Context) -> Result<()> {
    use Command::*;

    match command {
        Put(args) => put::execute(args, ctx),
        Get(args) => get::execute(args, ctx),
        Sync(args) => sync::execute(args, ctx),
        Run(args) => run::execute(args, ctx),
        Json(args) => json::execute(args, ctx),
        Completion { shell } => completions::execute(shell),
    }
}
