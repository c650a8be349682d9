//! Remote path policy and shell quoting.
//!
//! Every remote path a file operation touches is normalized and checked
//! against the configured storage roots before it is put into a command.

use crate::config::Config;
use crate::error::{Error, Result};

/// Resolves `.` and `..` against `/` the way a POSIX shell would for an
/// absolute path. Relative input is treated as relative to `/`.
pub fn normalize_remote_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    format!("/{}", parts.join("/"))
}

/// Wraps `arg` in single quotes, escaping embedded single quotes.
pub fn shell_quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', r"'\''"))
}

/// Rejects empty values for required arguments.
pub fn require<'a>(name: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        Err(Error::InvalidArgument(format!("{} must not be empty", name)))
    } else {
        Ok(value)
    }
}

/// Validates `ls` flags, which are passed through unquoted.
pub fn ls_options(options: &str) -> Result<&str> {
    let valid = options.split_whitespace().all(|flag| {
        flag.len() > 1
            && flag.starts_with('-')
            && flag[1..]
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '=')
    });
    if valid {
        Ok(options)
    } else {
        Err(Error::InvalidArgument(format!("unsupported ls options: {}", options)))
    }
}

/// Validates a value that is interpolated into an unquoted heredoc.
pub fn heredoc_safe<'a>(name: &str, value: &'a str) -> Result<&'a str> {
    const FORBIDDEN: &[char] = &['"', '$', '`', '\\', '\n', '\r'];
    if value.contains(FORBIDDEN) {
        Err(Error::InvalidArgument(format!(
            "{} contains characters that cannot be passed to cpptraj: {}",
            name, value
        )))
    } else {
        Ok(value)
    }
}

/// Set of remote directories file operations may touch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPolicy {
    bases: Vec<String>,
}

impl PathPolicy {
    pub fn new<I, S>(bases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            bases: bases
                .into_iter()
                .map(|b| normalize_remote_path(b.as_ref()))
                .collect(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.allowed_bases())
    }

    pub fn bases(&self) -> &[String] {
        &self.bases
    }

    /// True if `path` resolves to a base or somewhere beneath one.
    pub fn is_allowed(&self, path: &str) -> bool {
        let resolved = normalize_remote_path(path);
        self.bases.iter().any(|base| {
            base == "/"
                || resolved == *base
                || resolved
                    .strip_prefix(base.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// Returns the normalized path, or [`Error::PathNotAllowed`].
    pub fn check(&self, path: &str) -> Result<String> {
        if self.is_allowed(path) {
            Ok(normalize_remote_path(path))
        } else {
            Err(Error::PathNotAllowed(path.to_string()))
        }
    }
}
