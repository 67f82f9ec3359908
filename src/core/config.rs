//! Entry-list configuration.
//!
//! Reads `vault-env.yaml` (or a `.toml` file) declaring which secrets to pull
//! and which environment variables they fill. Two entry formats are accepted
//! and may be mixed in one file:
//!
//! ```yaml
//! secrets:
//!   - name: database            # individual: one record into one variable
//!     kv_path: app/db-password
//!     env_var: DB_PASSWORD
//!     required: true
//!   - path: app/config          # path-based: one field, or every field
//!     key: api_key
//!     env_key: API_KEY
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::constants;
use crate::error::{ConfigError, Result};

/// Root of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretsConfig {
    #[serde(default)]
    pub vault: Option<VaultSection>,
    #[serde(default)]
    pub transit: Option<TransitSection>,
    #[serde(default)]
    pub kv: Option<KvSection>,
    #[serde(default)]
    pub secrets: Vec<SecretEntry>,
}

/// Connection overrides. Flags and environment take precedence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VaultSection {
    #[serde(default)]
    pub addr: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub skip_verify: Option<bool>,
    #[serde(default)]
    pub ca_cert: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransitSection {
    #[serde(default)]
    pub mount: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KvSection {
    #[serde(default)]
    pub mount: Option<String>,
}

/// One declared secret, in either format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kv_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_var: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_key: Option<String>,
    #[serde(default)]
    pub required: bool,
}

/// What an entry asks for once both formats are folded together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// One named field of the record.
    Field { field: String, var: String },
    /// The whole record, which must be a singleton.
    Whole { var: String },
    /// Every field of the record, each under its own name.
    AllFields,
}

/// A normalized entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntry {
    pub path: String,
    pub selector: Selector,
    pub required: bool,
    /// Name used in warnings and errors.
    pub label: String,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl SecretEntry {
    /// Fold the two formats into one shape. `None` when no path is given.
    pub fn resolve(&self) -> Option<ResolvedEntry> {
        let path = non_empty(&self.path).or_else(|| non_empty(&self.kv_path))?;
        let field = non_empty(&self.key);
        let var = non_empty(&self.env_key).or_else(|| non_empty(&self.env_var));

        let selector = match (field, var) {
            (Some(field), var) => Selector::Field {
                field: field.to_string(),
                var: var
                    .map(str::to_string)
                    .unwrap_or_else(|| field.to_uppercase()),
            },
            (None, Some(var)) => Selector::Whole {
                var: var.to_string(),
            },
            (None, None) => Selector::AllFields,
        };

        let label = non_empty(&self.name)
            .map(str::to_string)
            .or_else(|| match &selector {
                Selector::Field { var, .. } | Selector::Whole { var } => Some(var.clone()),
                Selector::AllFields => None,
            })
            .unwrap_or_else(|| path.to_string());

        Some(ResolvedEntry {
            path: path.to_string(),
            selector,
            required: self.required,
            label,
        })
    }

    /// Name used when reporting an entry that could not be normalized.
    pub fn display_name(&self) -> String {
        non_empty(&self.name)
            .or_else(|| non_empty(&self.env_key))
            .or_else(|| non_empty(&self.env_var))
            .unwrap_or("<unnamed>")
            .to_string()
    }
}

impl SecretsConfig {
    /// Load from `path`. `.toml` files are parsed as TOML, anything else as
    /// YAML.
    ///
    /// # Errors
    ///
    /// `ConfigError::ReadFile` if unreadable, `ParseYaml`/`ParseToml` if
    /// malformed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;

        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));

        let config: Self = if is_toml {
            toml::from_str(&content).map_err(|source| ConfigError::ParseToml {
                path: path.to_path_buf(),
                source,
            })?
        } else if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&content).map_err(|source| ConfigError::ParseYaml {
                path: path.to_path_buf(),
                source,
            })?
        };

        debug!(path = %path.display(), entries = config.secrets.len(), "loaded config");
        Ok(config)
    }

    /// Load `path` if given, else the default file if it exists.
    ///
    /// An explicitly named file that does not exist is an error; a missing
    /// default file is not.
    pub fn discover(path: Option<&Path>) -> Result<Option<Self>> {
        match path {
            Some(path) => Self::load(path).map(Some),
            None => {
                let default = Path::new(constants::CONFIG_FILE);
                if default.exists() {
                    Self::load(default).map(Some)
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// KV mount: explicit flag, then the config file, then `kv`.
    pub fn kv_mount(&self, flag: Option<&str>) -> String {
        flag.filter(|m| !m.is_empty())
            .or_else(|| self.kv.as_ref().and_then(|kv| kv.mount.as_deref()))
            .filter(|m| !m.is_empty())
            .unwrap_or(constants::KV_MOUNT)
            .to_string()
    }
}
