//! Configuration management for hpgate.
//!
//! This module handles loading and saving the cluster connection settings,
//! storage bases used by the path policy, timeouts and SLURM defaults.
//!
//! # Configuration File Location
//!
//! The first existing file in this list wins:
//! - `./hpgate.yml`
//! - Linux: `~/.config/hpgate/config.yml`
//!   (macOS: `~/Library/Application Support/hpgate/config.yml`)
//! - `~/.hpgate.yml`
//!
//! When no file exists, the `HPG_HOST`, `HPG_USER`, `HPG_PORT`,
//! `HPG_IDENTITY_FILE` and `HPG_PROJECT_BASE` environment variables override
//! the built-in defaults.
//!
//! # Example Configuration
//!
//! ```yaml
//! host: "hpg.rc.ufl.edu"
//! user: "jdoe"
//! port: 2222
//! identity_file: "~/.ssh/id_ed25519_hpg"
//! control_path: "~/.ssh/sockets/hpg-%r@%h:%p"
//! project_base: "/blue/mygroup/jdoe"
//! scratch_base: "/red/mygroup/jdoe"
//! orange_base: "/orange/mygroup/jdoe"
//! command_timeout_ms: 60000
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

const DEFAULT_HOST: &str = "hpg.rc.ufl.edu";
const DEFAULT_PORT: u16 = 2222;
const DEFAULT_IDENTITY_FILE: &str = "~/.ssh/id_ed25519_hpg";
const DEFAULT_CONTROL_PATH: &str = "~/.ssh/sockets/hpg-%r@%h:%p";

const DEFAULT_CONNECTION_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 60_000;
const DEFAULT_LONG_COMMAND_TIMEOUT_MS: u64 = 600_000;

/// Cluster connection and workflow settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Login node hostname
    pub host: String,

    /// Cluster username
    pub user: String,

    /// SSH port of the login node
    pub port: u16,

    /// Private key used for authentication
    pub identity_file: String,

    /// OpenSSH control socket template (`%r`, `%h`, `%p` are expanded)
    pub control_path: String,

    /// Project storage root
    pub project_base: String,

    /// Scratch storage root
    pub scratch_base: String,

    /// Archive storage root
    pub orange_base: String,

    /// Budget for the connect probe
    pub connection_timeout_ms: u64,

    /// Default budget for a command
    pub command_timeout_ms: u64,

    /// Budget for operations known to be slow
    pub long_command_timeout_ms: u64,

    pub default_partition: String,
    pub default_account: String,
    pub default_qos: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            user: String::new(),
            port: DEFAULT_PORT,
            identity_file: DEFAULT_IDENTITY_FILE.to_string(),
            control_path: DEFAULT_CONTROL_PATH.to_string(),
            project_base: String::new(),
            scratch_base: String::new(),
            orange_base: String::new(),
            connection_timeout_ms: DEFAULT_CONNECTION_TIMEOUT_MS,
            command_timeout_ms: DEFAULT_COMMAND_TIMEOUT_MS,
            long_command_timeout_ms: DEFAULT_LONG_COMMAND_TIMEOUT_MS,
            default_partition: "hpg-default".to_string(),
            default_account: String::new(),
            default_qos: String::new(),
        }
    }
}

impl Config {
    /// Candidate configuration files, in priority order.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd.join("hpgate.yml"));
        }
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("hpgate").join("config.yml"));
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".hpgate.yml"));
        }
        paths
    }

    /// The path `config init` writes to.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("hpgate").join("config.yml"))
    }

    /// Loads configuration from the standard search paths and the process
    /// environment.
    pub fn load() -> Result<Self> {
        Self::resolve(&Self::search_paths(), |key| std::env::var(key).ok())
    }

    /// Loads from the first existing candidate, or from the environment when
    /// none exists.
    pub fn resolve<F>(candidates: &[PathBuf], env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = candidates.iter().find(|p| p.exists()) {
            let mut config = Self::load_from(path)?;
            if config.user.is_empty() {
                if let Some(user) = env("HPG_USER") {
                    config.user = user;
                }
            }
            return Ok(config);
        }

        Ok(Self::default().with_env_overrides(env))
    }

    /// Applies the `HPG_*` environment variables over this configuration.
    pub fn with_env_overrides<F>(mut self, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = env("HPG_HOST") {
            self.host = host;
        }
        if let Some(user) = env("HPG_USER") {
            self.user = user;
        }
        if let Some(port) = env("HPG_PORT") {
            match port.trim().parse() {
                Ok(port) => self.port = port,
                Err(_) => log::warn!("Ignoring invalid HPG_PORT value: {}", port),
            }
        }
        if let Some(identity) = env("HPG_IDENTITY_FILE") {
            self.identity_file = identity;
        }
        if let Some(base) = env("HPG_PROJECT_BASE") {
            self.project_base = base;
        }
        self
    }

    /// Loads configuration from a specific file path. Keys missing from the
    /// file keep their defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to read config file: {}\n\n\
                     File path: {}\n\n\
                     Suggestions:\n\
                     • Check file permissions: ls -la {}\n\
                     • Try recreating with: hpgate config init --force",
                    e,
                    path.display(),
                    path.display()
                ),
            ))
        })?;

        serde_yaml::from_str(&contents).map_err(|e| {
            Error::Config(format!(
                "Failed to parse config file: {}\n\n\
                 File path: {}\n\n\
                 Suggestions:\n\
                 • Check YAML syntax in the config file\n\
                 • Verify indentation uses spaces, not tabs\n\n\
                 Example valid config:\n\
                 host: \"hpg.rc.ufl.edu\"\n\
                 user: \"username\"\n\
                 port: 2222",
                e,
                path.display()
            ))
        })
    }

    /// Saves configuration to a specific file path, creating parents.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create config directory: {}\n\n\
                         Directory: {}\n\n\
                         Suggestions:\n\
                         • Check write permissions for parent directory\n\
                         • Create directory manually: mkdir -p {}",
                        e,
                        parent.display(),
                        parent.display()
                    ),
                ))
            })?;
        }

        let contents = serde_yaml::to_string(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Returns the problems that would prevent a connection.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.user.is_empty() {
            errors.push(
                "HPG_USER not set. Set via environment variable or config file.".to_string(),
            );
        }

        let identity = expand_home(&self.identity_file);
        if !identity.exists() {
            errors.push(format!(
                "SSH identity file not found: {}",
                identity.display()
            ));
        }

        errors
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn long_command_timeout(&self) -> Duration {
        Duration::from_millis(self.long_command_timeout_ms)
    }

    /// Storage roots remote paths must live under.
    pub fn allowed_bases(&self) -> Vec<&str> {
        [
            self.project_base.as_str(),
            self.scratch_base.as_str(),
            self.orange_base.as_str(),
            "/home",
        ]
        .into_iter()
        .filter(|base| !base.is_empty())
        .collect()
    }
}

/// Expands a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.host, "hpg.rc.ufl.edu");
        assert_eq!(config.port, 2222);
        assert!(config.user.is_empty());
        assert_eq!(config.command_timeout(), Duration::from_secs(60));
        assert_eq!(config.long_command_timeout(), Duration::from_secs(600));
        assert_eq!(config.connection_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_env_overrides_without_file() {
        let config = Config::resolve(
            &[PathBuf::from("/nonexistent/hpgate.yml")],
            env_from(&[
                ("HPG_HOST", "login.example.org"),
                ("HPG_USER", "jdoe"),
                ("HPG_PORT", "22"),
                ("HPG_PROJECT_BASE", "/blue/lab/jdoe"),
            ]),
        )
        .unwrap();

        assert_eq!(config.host, "login.example.org");
        assert_eq!(config.user, "jdoe");
        assert_eq!(config.port, 22);
        assert_eq!(config.project_base, "/blue/lab/jdoe");
    }

    #[test]
    fn test_invalid_port_env_is_ignored() {
        let config = Config::default().with_env_overrides(env_from(&[("HPG_PORT", "abc")]));
        assert_eq!(config.port, 2222);
    }

    #[test]
    fn test_file_merges_over_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hpgate.yml");
        fs::write(&path, "user: alice\nport: 22\n").unwrap();

        let config = Config::resolve(&[path], env_from(&[("HPG_HOST", "ignored")])).unwrap();

        assert_eq!(config.user, "alice");
        assert_eq!(config.port, 22);
        // Environment overrides apply only without a file
        assert_eq!(config.host, "hpg.rc.ufl.edu");
        assert_eq!(config.command_timeout_ms, 60_000);
    }

    #[test]
    fn test_first_existing_candidate_wins() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("a.yml");
        let second = dir.path().join("b.yml");
        fs::write(&second, "user: second\n").unwrap();

        let config = Config::resolve(&[first.clone(), second.clone()], env_from(&[])).unwrap();
        assert_eq!(config.user, "second");

        fs::write(&first, "user: first\n").unwrap();
        let config = Config::resolve(&[first, second], env_from(&[])).unwrap();
        assert_eq!(config.user, "first");
    }

    #[test]
    fn test_malformed_file_reports_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hpgate.yml");
        fs::write(&path, "port: [not a port\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yml");

        let mut config = Config::default();
        config.user = "bob".to_string();
        config.scratch_base = "/red/lab/bob".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_validate_reports_missing_user_and_key() {
        let mut config = Config::default();
        config.identity_file = "/nonexistent/key".to_string();

        let errors = config.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("HPG_USER"));
        assert!(errors[1].contains("/nonexistent/key"));
    }

    #[test]
    fn test_allowed_bases_skip_empty() {
        let mut config = Config::default();
        config.project_base = "/blue/lab/me".to_string();
        assert_eq!(config.allowed_bases(), vec!["/blue/lab/me", "/home"]);
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/.ssh/id"), home.join(".ssh/id"));
        }
    }
}
