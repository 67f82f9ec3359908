//! Env files.
//!
//! Parsing and writing of `KEY=VALUE` files. Parsing is strict: a line that
//! is not blank, not a comment and not an assignment fails the whole file.

#[cfg(unix)]
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::core::types::VarName;
use crate::error::{LoadError, Result};

/// A parsed env file, in first-seen key order.
#[derive(Debug, Clone)]
pub struct Env {
    entries: Vec<(VarName, String)>,
    path: PathBuf,
}

impl Env {
    /// Read and parse an env file.
    ///
    /// # Errors
    ///
    /// `LoadError::Read` if the file cannot be read, `LoadError::Malformed`
    /// (with the 1-based line number) for a line without `=` or with an
    /// empty key.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents, path)
    }

    /// Parse env-file text. `path` is only used for error messages.
    pub fn parse(contents: &str, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut env = Self {
            entries: Vec::new(),
            path: path.to_path_buf(),
        };

        for (index, line) in contents.lines().enumerate() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let malformed = |reason: &str| LoadError::Malformed {
                path: path.to_path_buf(),
                line: index + 1,
                reason: reason.to_string(),
            };

            let line = line.strip_prefix("export ").map(str::trim_start).unwrap_or(line);
            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| malformed("expected KEY=VALUE"))?;

            let key = key.trim();
            if key.is_empty() {
                return Err(malformed("empty key").into());
            }

            env.set(key, parse_env_value(value.trim()));
        }

        Ok(env)
    }

    /// Create from raw key-value pairs. Later duplicates win.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (VarName, String)>, path: PathBuf) -> Self {
        let mut env = Self {
            entries: Vec::new(),
            path,
        };
        for (key, value) in pairs {
            env.set(&key, value);
        }
        env
    }

    /// Insert or replace in place, keeping the original position.
    pub fn set(&mut self, key: &str, value: String) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    /// Write the file with owner-only permissions.
    ///
    /// Values are written verbatim, one `KEY=VALUE` per line.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        let content = self.to_string();

        #[cfg(unix)]
        {
            use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .mode(0o600)
                .open(&self.path)?;
            file.write_all(content.as_bytes())?;
            file.flush()?;

            // mode() only applies on create
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        #[cfg(not(unix))]
        {
            std::fs::write(&self.path, content)?;
        }

        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn entries(&self) -> &[(VarName, String)] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<(VarName, String)> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn parse_env_value(raw: &str) -> String {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        return unescape_double_quoted(&raw[1..raw.len() - 1]);
    }

    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return raw[1..raw.len() - 1].to_string();
    }

    raw.to_string()
}

fn unescape_double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }

        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

impl std::fmt::Display for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (key, value) in &self.entries {
            writeln!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}
