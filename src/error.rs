//! Error types.
//!
//! Every failure surfaces through [`Error`], grouped by the layer that
//! produced it. Nothing in this crate retries; errors propagate straight to
//! the invoking command.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Startup configuration problems. Raised before any backend call.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("VAULT_ADDR environment variable is required")]
    MissingAddress,

    #[error("{var} is required for {method} auth")]
    MissingCredential {
        method: &'static str,
        var: &'static str,
    },

    #[error("unsupported auth method: {0}. Supported: token, approle, github, kubernetes")]
    UnsupportedAuthMethod(String),

    #[error("invalid TRANSIT value: {0}")]
    InvalidToggle(String),

    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse yaml config {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to parse toml config {path}: {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to read CA certificate {path}: {reason}")]
    CaCert { path: PathBuf, reason: String },

    #[error("failed to build http client: {0}")]
    HttpClient(String),
}

/// Errors returned by the backend gateway. Each carries the operation and
/// the path it was issued against.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("{op} {path}: request failed: {source}")]
    Request {
        op: &'static str,
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{op} {path}: vault returned {status}: {message}")]
    Status {
        op: &'static str,
        path: String,
        status: u16,
        message: String,
    },

    #[error("{op} {path}: {reason}")]
    Malformed {
        op: &'static str,
        path: String,
        reason: String,
    },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("{op} {path}: {reason}")]
    Oracle {
        op: &'static str,
        path: String,
        reason: String,
    },
}

impl BackendError {
    /// Name the KV record a Transit call was made for, keeping the
    /// `mount/key` target alongside it.
    pub fn for_record(self, record: &str) -> Self {
        let retarget = |path: String| format!("{} ({})", record, path);
        match self {
            Self::Request { op, path, source } => Self::Request {
                op,
                path: retarget(path),
                source,
            },
            Self::Status {
                op,
                path,
                status,
                message,
            } => Self::Status {
                op,
                path: retarget(path),
                status,
                message,
            },
            Self::Malformed { op, path, reason } => Self::Malformed {
                op,
                path: retarget(path),
                reason,
            },
            Self::Oracle { op, path, reason } => Self::Oracle {
                op,
                path: retarget(path),
                reason,
            },
            auth @ Self::Auth(_) => auth,
        }
    }
}

/// Errors about the secret being read or written.
#[derive(Error, Debug)]
pub enum SecretError {
    #[error("secret not found: {0}")]
    NotFound(String),

    #[error("key {field:?} not found in {path}")]
    FieldNotFound { field: String, path: String },

    #[error("--encryption-key is required for encrypted secrets at {0}")]
    EncryptionKeyRequired(String),

    #[error("no secret value provided")]
    NoValue,

    #[error("decrypted value for {path} is not valid utf-8")]
    NotUtf8 { path: String },

    #[error("{0}")]
    Unresolvable(String),
}

/// Bulk loader failures. A single malformed line fails the whole load.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {reason}")]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

/// Raised when one or more `required` config entries could not be resolved.
#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("{} required secret(s) could not be resolved:\n{}", .0.len(), format_failures(.0))]
    Required(Vec<EntryFailure>),
}

/// A single unresolved entry, with the variable it was meant to fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFailure {
    pub entry: String,
    pub reason: String,
}

impl std::fmt::Display for EntryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.entry, self.reason)
    }
}

fn format_failures(failures: &[EntryFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("  {}", failure))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Input validation errors for command arguments.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("only one of --value, --from-env, or --from-file can be specified")]
    ConflictingInputs,

    #[error("--key cannot be used with --from-env or --from-file")]
    FieldWithBulkLoad,

    #[error("--merge can only be used with --from-env")]
    MergeWithoutEnvFile,

    #[error("key name cannot be empty")]
    EmptyField,

    #[error("key name {0:?} is reserved for single-value secrets")]
    ReservedField(String),

    #[error("{0} contains no variables")]
    EmptyEnvFile(String),

    #[error("invalid inject format: {0} (expected ENV_VAR=vault_path)")]
    InvalidInject(String),

    #[error("either --path, --config, or vault-env.yaml file must be specified")]
    NoSource,

    #[error("either --config, vault-env.yaml file, or --inject must be specified")]
    NoRunSource,

    #[error("command to run is required. Use -- to separate vault-env options from the command")]
    NoCommand,
}

impl Error {
    /// See [`BackendError::for_record`]. Other errors pass through.
    pub fn for_record(self, record: &str) -> Self {
        match self {
            Self::Backend(e) => Self::Backend(e.for_record(record)),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
