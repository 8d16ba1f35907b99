//! Command-line and environment configuration.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};

use crate::storage::{MemoryStorage, SqliteStorage, StorageResult};
use crate::handlers::SharedStorage;

/// Which storage backend holds the resource collection.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Backend {
    /// Single-table SQLite file.
    Sqlite,
    /// Process memory; lost on restart.
    Memory,
}

/// Command-line arguments for the resource server.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Host address to bind to
    #[arg(long, env = "RESOURCE_SERVER_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "RESOURCE_SERVER_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Storage backend
    #[arg(long, env = "RESOURCE_SERVER_BACKEND", value_enum, default_value_t = Backend::Sqlite)]
    pub backend: Backend,

    /// SQLite database file, created if missing
    #[arg(long, env = "RESOURCE_SERVER_DATABASE", default_value = "./resources.db")]
    pub database: PathBuf,

    /// Mount the hello/echo/static demo endpoints
    #[arg(long, env = "RESOURCE_SERVER_DEMO_ROUTES")]
    pub demo_routes: bool,

    /// Directory served under /static when demo routes are enabled
    #[arg(long, env = "RESOURCE_SERVER_STATIC_DIR", default_value = "./static")]
    pub static_dir: PathBuf,
}

impl Config {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Opens the configured backend.
    pub fn open_storage(&self) -> StorageResult<SharedStorage> {
        let store: SharedStorage = match self.backend {
            Backend::Sqlite => Arc::new(SqliteStorage::open(&self.database)?),
            Backend::Memory => Arc::new(MemoryStorage::new()),
        };
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_surface() {
        let config = Config::try_parse_from(["resource-server"]).unwrap();
        assert_eq!(config.addr(), "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.database, PathBuf::from("./resources.db"));
        assert!(!config.demo_routes);
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "resource-server",
            "--host", "127.0.0.1",
            "-p", "9090",
            "--backend", "memory",
            "--demo-routes",
        ])
        .unwrap();
        assert_eq!(config.addr(), "127.0.0.1:9090".parse().unwrap());
        assert_eq!(config.backend, Backend::Memory);
        assert!(config.demo_routes);
    }

    #[test]
    fn memory_backend_opens_empty() {
        let config = Config::try_parse_from(["resource-server", "--backend", "memory"]).unwrap();
        let store = config.open_storage().unwrap();
        assert!(store.list().unwrap().is_empty());
    }
}
