// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Settings are read from an optional JSON file and then overridden by the
//! environment. Secrets have no defaults; startup fails without them.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `KEEPER_CONFIG` | Path to a JSON config file | none |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8443` |
//! | `DATABASE_PATH` | redb database file | `data/keeper.redb` |
//! | `JWT_SECRET` | HS256 token signing secret | Required |
//! | `MASTER_KEY` | Master key wrapping every record key (16+ bytes) | Required |
//! | `TLS_CERT_PATH` | PEM certificate chain | Required |
//! | `TLS_KEY_PATH` | PEM private key | Required |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::crypto::{CryptoError, MasterKey};

pub const CONFIG_FILE_ENV: &str = "KEEPER_CONFIG";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const DATABASE_PATH_ENV: &str = "DATABASE_PATH";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const MASTER_KEY_ENV: &str = "MASTER_KEY";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8443;
pub const DEFAULT_DATABASE_PATH: &str = "data/keeper.redb";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} is required")]
    Missing(&'static str),

    #[error("invalid {name}: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("MASTER_KEY must be at least {min} bytes (got {actual})")]
    WeakMasterKey { min: usize, actual: usize },
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(ConfigError::Invalid {
                name: LOG_FORMAT_ENV,
                value: value.to_string(),
            }),
        }
    }
}

/// Shape of the optional JSON config file. Every field may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    host: Option<String>,
    port: Option<u16>,
    database_path: Option<PathBuf>,
    jwt_secret: Option<String>,
    master_key: Option<String>,
    tls_cert_path: Option<PathBuf>,
    tls_key_path: Option<PathBuf>,
    log_format: Option<LogFormat>,
}

/// Validated server configuration.
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub jwt_secret: String,
    pub master_key: MasterKey,
    pub tls_cert_path: PathBuf,
    pub tls_key_path: PathBuf,
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Load from `KEEPER_CONFIG` (if set) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` in place of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match lookup(CONFIG_FILE_ENV) {
            Some(path) => read_file(Path::new(&path))?,
            None => FileConfig::default(),
        };

        let host = lookup(HOST_ENV)
            .or(file.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup(PORT_ENV) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: PORT_ENV,
                value: raw,
            })?,
            None => file.port.unwrap_or(DEFAULT_PORT),
        };

        let database_path = lookup(DATABASE_PATH_ENV)
            .map(PathBuf::from)
            .or(file.database_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));

        let jwt_secret = lookup(JWT_SECRET_ENV)
            .or(file.jwt_secret)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing(JWT_SECRET_ENV))?;

        let master_key = lookup(MASTER_KEY_ENV)
            .or(file.master_key)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing(MASTER_KEY_ENV))?;
        let master_key = MasterKey::new(master_key.into_bytes()).map_err(|e| match e {
            CryptoError::WeakMasterKey { min, actual } => ConfigError::WeakMasterKey { min, actual },
            _ => ConfigError::Invalid {
                name: MASTER_KEY_ENV,
                value: "<redacted>".to_string(),
            },
        })?;

        let tls_cert_path = lookup(TLS_CERT_PATH_ENV)
            .map(PathBuf::from)
            .or(file.tls_cert_path)
            .ok_or(ConfigError::Missing(TLS_CERT_PATH_ENV))?;
        let tls_key_path = lookup(TLS_KEY_PATH_ENV)
            .map(PathBuf::from)
            .or(file.tls_key_path)
            .ok_or(ConfigError::Missing(TLS_KEY_PATH_ENV))?;

        let log_format = match lookup(LOG_FORMAT_ENV) {
            Some(raw) => raw.parse()?,
            None => file.log_format.unwrap_or_default(),
        };

        Ok(Self {
            host,
            port,
            database_path,
            jwt_secret,
            master_key,
            tls_cert_path,
            tls_key_path,
            log_format,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::Invalid {
                name: HOST_ENV,
                value: self.host.clone(),
            })
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_path", &self.database_path)
            .field("jwt_secret", &"<redacted>")
            .field("master_key", &self.master_key)
            .field("tls_cert_path", &self.tls_cert_path)
            .field("tls_key_path", &self.tls_key_path)
            .field("log_format", &self.log_format)
            .finish()
    }
}

fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        (JWT_SECRET_ENV, "jwt-secret"),
        (MASTER_KEY_ENV, "0123456789abcdef"),
        (TLS_CERT_PATH_ENV, "certs/server.crt"),
        (TLS_KEY_PATH_ENV, "certs/server.key"),
    ];

    #[test]
    fn defaults_apply() {
        let config = ServerConfig::from_lookup(env(REQUIRED)).unwrap();
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.database_path, PathBuf::from(DEFAULT_DATABASE_PATH));
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.bind_addr().unwrap().port(), 8443);
    }

    #[test]
    fn secrets_are_required() {
        let err = ServerConfig::from_lookup(env(&REQUIRED[1..])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(JWT_SECRET_ENV)));

        let err = ServerConfig::from_lookup(env(&[REQUIRED[0], REQUIRED[2], REQUIRED[3]]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing(MASTER_KEY_ENV)));
    }

    #[test]
    fn short_master_key_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs[1] = (MASTER_KEY_ENV, "too-short");
        let err = ServerConfig::from_lookup(env(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::WeakMasterKey { min: 16, actual: 9 }));
    }

    #[test]
    fn invalid_port_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push((PORT_ENV, "not-a-port"));
        let err = ServerConfig::from_lookup(env(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: PORT_ENV, .. }));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let config = ServerConfig::from_lookup(env(REQUIRED)).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("jwt-secret"));
        assert!(!debug.contains("0123456789abcdef"));
    }

    #[test]
    fn log_format_parses() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keeper.json");
        std::fs::write(
            &path,
            r#"{
                "host": "127.0.0.1",
                "port": 9000,
                "database_path": "/var/lib/keeper.redb",
                "jwt_secret": "from-file",
                "master_key": "file-master-key-0123",
                "tls_cert_path": "/etc/keeper/cert.pem",
                "tls_key_path": "/etc/keeper/key.pem",
                "log_format": "json"
            }"#,
        )
        .unwrap();

        let path_str = path.to_string_lossy().to_string();
        let config = ServerConfig::from_lookup(env(&[
            (CONFIG_FILE_ENV, path_str.as_str()),
            (PORT_ENV, "9443"),
        ]))
        .unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9443);
        assert_eq!(config.jwt_secret, "from-file");
        assert_eq!(config.master_key.as_bytes(), b"file-master-key-0123");
        assert_eq!(config.tls_key_path, PathBuf::from("/etc/keeper/key.pem"));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn unreadable_file_is_reported() {
        let err = ServerConfig::from_lookup(env(&[(CONFIG_FILE_ENV, "/nonexistent/keeper.json")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keeper.json");
        std::fs::write(&path, "{ not json").unwrap();

        let path_str = path.to_string_lossy().to_string();
        let err = ServerConfig::from_lookup(env(&[(CONFIG_FILE_ENV, path_str.as_str())]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
