//! Config-driven aggregation.
//!
//! Resolves a list of declared secrets into one environment map. Every
//! entry is attempted; each produces its variables or a failure, and the
//! failures are sorted into warnings (optional entries) and fatal errors
//! (required entries) only after the whole list has been processed.

use std::collections::HashMap;

use tracing::debug;

use crate::core::backend::{Backend, SecretPath};
use crate::core::config::{ResolvedEntry, SecretEntry, Selector};
use crate::core::record::Record;
use crate::core::transit::{EncryptionContext, Opener};
use crate::core::types::VarName;
use crate::error::{AggregateError, EntryFailure, Result, SecretError, ValidationError};

/// Environment variables in first-insertion order.
///
/// Inserting an existing name replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvMap {
    entries: Vec<(VarName, String)>,
    index: HashMap<VarName, usize>,
}

impl EnvMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<VarName>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.index.get(&name) {
            Some(&at) => self.entries[at].1 = value,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, value));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.index.get(name).map(|&at| self.entries[at].1.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<(VarName, String)> {
        self.entries
    }
}

impl<K: Into<VarName>, V: Into<String>> Extend<(K, V)> for EnvMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K: Into<VarName>, V: Into<String>> FromIterator<(K, V)> for EnvMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

/// Where and how to look secrets up.
#[derive(Debug, Clone, Copy)]
pub struct Lookup<'a> {
    pub kv_mount: &'a str,
    pub ctx: Option<&'a EncryptionContext>,
}

/// Outcome of resolving an entry list.
#[derive(Debug, Default)]
pub struct Resolution {
    pub vars: EnvMap,
    pub warnings: Vec<EntryFailure>,
    pub failures: Vec<EntryFailure>,
}

impl Resolution {
    /// The resolved environment, or every required failure.
    ///
    /// # Errors
    ///
    /// `AggregateError::Required` listing all fatal entries.
    pub fn finish(self) -> Result<EnvMap> {
        if self.failures.is_empty() {
            Ok(self.vars)
        } else {
            Err(AggregateError::Required(self.failures).into())
        }
    }
}

/// Resolve every entry in declaration order.
pub fn resolve(backend: &dyn Backend, entries: &[SecretEntry], lookup: Lookup<'_>) -> Resolution {
    let opener = Opener::new(backend, lookup.ctx);
    let mut resolution = Resolution::default();

    for entry in entries {
        let Some(resolved) = entry.resolve() else {
            debug!(entry = %entry.display_name(), "skipping secret entry without a path");
            resolution.warnings.push(EntryFailure {
                entry: entry.display_name(),
                reason: "skipped: no path".to_string(),
            });
            continue;
        };

        match resolve_entry(backend, &opener, &resolved, lookup.kv_mount) {
            Ok(vars) => {
                debug!(entry = %resolved.label, vars = vars.len(), "resolved entry");
                resolution.vars.extend(vars);
            }
            Err(e) => {
                let failure = EntryFailure {
                    entry: resolved.label.clone(),
                    reason: e.to_string(),
                };
                if resolved.required {
                    resolution.failures.push(failure);
                } else {
                    debug!(entry = %resolved.label, "optional secret not resolved");
                    resolution.warnings.push(failure);
                }
            }
        }
    }

    resolution
}

fn fetch(backend: &dyn Backend, path: &SecretPath) -> Result<Record> {
    backend
        .read(path)?
        .map(Record::from_fields)
        .ok_or_else(|| SecretError::NotFound(path.to_string()).into())
}

fn unresolvable(reason: String) -> crate::error::Error {
    SecretError::Unresolvable(reason).into()
}

fn resolve_entry(
    backend: &dyn Backend,
    opener: &Opener<'_>,
    entry: &ResolvedEntry,
    kv_mount: &str,
) -> Result<Vec<(VarName, String)>> {
    let path = SecretPath::new(kv_mount, &entry.path);
    let record = fetch(backend, &path)?;

    match &entry.selector {
        Selector::Field { field, var } => {
            let value = record.field(field).ok_or_else(|| SecretError::FieldNotFound {
                field: field.clone(),
                path: path.to_string(),
            })?;
            Ok(vec![(var.clone(), opener.open(&value, &path)?)])
        }

        Selector::Whole { var } => Ok(vec![(var.clone(), whole_value(opener, record, &path, false)?)]),

        Selector::AllFields => match record {
            Record::SingletonPlain(_) | Record::SingletonCipher(_) => Err(unresolvable(format!(
                "{} holds a single unnamed value; set env_var or env_key",
                path
            ))),
            Record::Empty => Ok(Vec::new()),
            Record::MultiValue(fields) => Ok(opener.open_all(&fields, &path)?.into_iter().collect()),
        },
    }
}

/// Value of a record used as a single variable.
///
/// With `any_single_field`, a multi-value record with exactly one field
/// also qualifies.
fn whole_value(
    opener: &Opener<'_>,
    record: Record,
    path: &SecretPath,
    any_single_field: bool,
) -> Result<String> {
    match record {
        Record::SingletonPlain(value) => Ok(value),
        Record::SingletonCipher(ciphertext) => opener.decrypt(&ciphertext, path),
        Record::MultiValue(fields) if any_single_field && fields.len() == 1 => {
            let (_, value) = fields
                .into_iter()
                .next()
                .ok_or_else(|| SecretError::NotFound(path.to_string()))?;
            opener.open(&value, path)
        }
        Record::MultiValue(fields) if fields.len() > 1 => Err(unresolvable(format!(
            "{} contains {} values, cannot pick one for a single variable",
            path,
            fields.len()
        ))),
        Record::MultiValue(_) | Record::Empty => {
            Err(unresolvable(format!("no single value found at {}", path)))
        }
    }
}

/// A parsed `--inject VAR=path` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Injection {
    pub var: VarName,
    pub path: String,
}

impl std::str::FromStr for Injection {
    type Err = crate::error::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let (var, path) = raw
            .split_once('=')
            .ok_or_else(|| ValidationError::InvalidInject(raw.to_string()))?;
        let (var, path) = (var.trim(), path.trim());
        if var.is_empty() || path.is_empty() {
            return Err(ValidationError::InvalidInject(raw.to_string()).into());
        }
        Ok(Self {
            var: var.to_string(),
            path: path.to_string(),
        })
    }
}

/// Resolve `--inject` arguments. Unlike config entries, every failure here
/// is fatal and stops at the first one.
pub fn resolve_injections(
    backend: &dyn Backend,
    injections: &[Injection],
    lookup: Lookup<'_>,
) -> Result<EnvMap> {
    let opener = Opener::new(backend, lookup.ctx);
    let mut vars = EnvMap::new();

    for injection in injections {
        let path = SecretPath::new(lookup.kv_mount, &injection.path);
        let record = fetch(backend, &path)?;
        let value = whole_value(&opener, record, &path, true)?;
        debug!(var = %injection.var, path = %path, "resolved injection");
        vars.insert(injection.var.clone(), value);
    }

    Ok(vars)
}
