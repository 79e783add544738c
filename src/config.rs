use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

use crate::{
    error::{Error, Result},
    password,
};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_DBNAME: &str = "icgeo";
pub const DEFAULT_USERNAME: &str = "miner";
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";
pub const DEFAULT_MIN_CONNECTIONS: u32 = 1;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 100;

/// Contents of `config.toml`. Every key is optional.
///
/// ```toml
/// [database]
/// host = "db.internal"
/// dbname = "icgeo"
///
/// [server]
/// bind = "0.0.0.0:5000"
/// max_connections = 20
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub database: DatabaseSection,
    pub server: ServerSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub bind: Option<SocketAddr>,
    pub min_connections: Option<u32>,
    pub max_connections: Option<u32>,
    pub pbkdf2_rounds: Option<u32>,
}

impl FileConfig {
    pub fn parse(raw: &str) -> Result<Self> {
        toml::from_str(raw)
            .map_err(|e| Error::Config(format!("invalid config file: {e}")))
    }

    /// Load the configuration file from, in order of priority:
    /// 1. An explicit path (from --config or ICGEO_CONFIG)
    /// 2. The XDG config directory (~/.config/icgeo/config.toml)
    ///
    /// A missing XDG file is not an error; a missing explicit one is.
    pub fn locate(explicit: Option<&Path>) -> Result<Self> {
        let path: Option<PathBuf> = match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(Error::Config(format!(
                        "config file does not exist: {}",
                        path.display()
                    )));
                }
                Some(path.to_path_buf())
            }
            None => xdg::BaseDirectories::with_prefix("icgeo")
                .find_config_file("config.toml"),
        };

        match path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "reading config file");
                Self::parse(&std::fs::read_to_string(&path)?)
            }
            None => Ok(Self::default()),
        }
    }
}

/// Values given on the command line or through the environment. These
/// win over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub bind: Option<SocketAddr>,
    pub min_connections: Option<u32>,
    pub max_connections: Option<u32>,
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub username: String,
    pub password: Option<String>,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

impl DatabaseConfig {
    /// Connection options for the configured service account.
    pub fn connect_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.dbname)
            .username(&self.username);
        match &self.password {
            Some(password) => options.password(password),
            None => options,
        }
    }

    /// Connection options for the same database under another role.
    pub fn connect_options_as(
        &self,
        username: &str,
        password: &str,
    ) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.dbname)
            .username(username)
            .password(password)
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub min_connections: u32,
    pub max_connections: u32,
    pub pbkdf2_rounds: u32,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
}

impl Settings {
    /// Merge overrides, the config file and the built-in defaults.
    pub fn resolve(
        overrides: ConfigOverrides,
        file: FileConfig,
    ) -> Result<Self> {
        let db = file.database;
        let srv = file.server;

        let database = DatabaseConfig {
            host: overrides
                .host
                .or(db.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: overrides.port.or(db.port).unwrap_or(DEFAULT_PORT),
            dbname: overrides
                .dbname
                .or(db.dbname)
                .unwrap_or_else(|| DEFAULT_DBNAME.to_string()),
            username: overrides
                .username
                .or(db.username)
                .unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
            password: overrides.password.or(db.password),
        };

        let bind = match overrides.bind.or(srv.bind) {
            Some(bind) => bind,
            None => DEFAULT_BIND.parse().map_err(|e| {
                Error::Config(format!("invalid default bind address: {e}"))
            })?,
        };
        let server = ServerConfig {
            bind,
            min_connections: overrides
                .min_connections
                .or(srv.min_connections)
                .unwrap_or(DEFAULT_MIN_CONNECTIONS),
            max_connections: overrides
                .max_connections
                .or(srv.max_connections)
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            pbkdf2_rounds: srv
                .pbkdf2_rounds
                .unwrap_or(password::DEFAULT_ROUNDS),
        };

        if server.max_connections == 0 {
            return Err(Error::Config(
                "max_connections must be at least 1".into(),
            ));
        }
        if server.min_connections > server.max_connections {
            return Err(Error::Config(format!(
                "min_connections ({}) exceeds max_connections ({})",
                server.min_connections, server.max_connections
            )));
        }
        if server.pbkdf2_rounds == 0 {
            return Err(Error::Config("pbkdf2_rounds must be positive".into()));
        }

        Ok(Self { database, server })
    }
}
