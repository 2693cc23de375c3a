use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
pub const DEFAULT_USERS: &str = "admin:admin";
pub const SCRATCH_DIR_NAME: &str = "conversions";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} is not a valid socket address: {value}")]
    BindAddr { key: &'static str, value: String },

    #[error("{key} must be a positive byte count, got {value}")]
    UploadLimit { key: &'static str, value: String },

    #[error("{key} entry '{entry}' must look like user:password")]
    UserEntry { key: &'static str, entry: String },

    #[error("{key} lists user '{username}' more than once")]
    DuplicateUser { key: &'static str, username: String },

    #[error("{key} does not define any users")]
    NoUsers { key: &'static str },
}

#[derive(Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub scratch_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub users: Vec<(String, String)>,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let usernames = self.users.iter().map(|(name, _)| name).collect::<Vec<_>>();
        f.debug_struct("ServerConfig")
            .field("bind_addr", &self.bind_addr)
            .field("scratch_dir", &self.scratch_dir)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("users", &usernames)
            .finish()
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let raw_addr = value("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .trim()
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::BindAddr {
                key: "BIND_ADDR",
                value: raw_addr.clone(),
            })?;

        let scratch_dir = value("SCRATCH_DIR")
            .map_or_else(|| std::env::temp_dir().join(SCRATCH_DIR_NAME), PathBuf::from);

        let max_upload_bytes = match value("MAX_UPLOAD_BYTES") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|limit| *limit > 0)
                .ok_or(ConfigError::UploadLimit {
                    key: "MAX_UPLOAD_BYTES",
                    value: raw,
                })?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let users = parse_users(
            "CONVERTER_USERS",
            &value("CONVERTER_USERS").unwrap_or_else(|| DEFAULT_USERS.to_string()),
        )?;

        Ok(Self {
            bind_addr,
            scratch_dir,
            max_upload_bytes,
            users,
        })
    }
}

fn parse_users(key: &'static str, raw: &str) -> Result<Vec<(String, String)>, ConfigError> {
    let mut users: Vec<(String, String)> = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        let Some((username, password)) = entry.split_once(':') else {
            return Err(ConfigError::UserEntry {
                key,
                entry: entry.to_string(),
            });
        };
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(ConfigError::UserEntry {
                key,
                entry: username.to_string(),
            });
        }
        if users
            .iter()
            .any(|(existing, _)| existing.eq_ignore_ascii_case(username))
        {
            return Err(ConfigError::DuplicateUser {
                key,
                username: username.to_string(),
            });
        }
        users.push((username.to_string(), password.to_string()));
    }

    if users.is_empty() {
        return Err(ConfigError::NoUsers { key });
    }
    Ok(users)
}
