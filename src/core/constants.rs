//! Constants used throughout vault-env.
//!
//! Centralizes magic strings and default values.

/// Sentinel field holding a single plaintext secret.
pub const PLAINTEXT_FIELD: &str = "value";

/// Sentinel field holding a single Transit-encrypted secret.
pub const CIPHERTEXT_FIELD: &str = "ciphertext";

/// Prefix of every Transit ciphertext (`vault:v<version>:<payload>`).
pub const CIPHERTEXT_PREFIX: &str = "vault:v";

/// Default entry-list config file, used when present in the working directory.
pub const CONFIG_FILE: &str = "vault-env.yaml";

/// Default output of `sync` and default input of `json`.
pub const ENV_FILE: &str = ".env";

/// Default KV v2 mount.
pub const KV_MOUNT: &str = "kv";

/// Default Transit mount.
pub const TRANSIT_MOUNT: &str = "transit";

/// Transit key used when `TRANSIT` is enabled without an explicit key.
pub const DEFAULT_TRANSIT_KEY: &str = "app-secrets";

/// Per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Service-account token read by Kubernetes auth.
pub const K8S_JWT_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

/// Mount of the Kubernetes auth method.
pub const K8S_AUTH_PATH: &str = "kubernetes";
