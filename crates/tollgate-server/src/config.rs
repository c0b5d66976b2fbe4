use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tollgate_ledger::Provisioning;
use tollgate_store::SyncMode;

use crate::error::{ServerError, ServerResult};

/// Process-wide ledger service configuration, fixed at startup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub provisioning: Provisioning,
    pub store: StoreConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8000)),
            provisioning: Provisioning::default(),
            store: StoreConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from a TOML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> ServerResult<String> {
        toml::to_string_pretty(self).map_err(|e| ServerError::Config(e.to_string()))
    }
}

/// Which account store backend to open.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "kebab-case")]
pub enum StoreConfig {
    /// Balances live only as long as the process.
    #[default]
    Memory,
    /// Balances persist in a write-ahead log.
    Wal {
        path: PathBuf,
        #[serde(default)]
        sync: SyncMode,
        /// Rewrite the log to one record per account after recovery.
        #[serde(default)]
        compact_on_open: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "0.0.0.0:8000".parse::<SocketAddr>().unwrap());
        assert_eq!(c.provisioning.starting_credits, 5);
        assert_eq!(c.store, StoreConfig::Memory);
    }

    #[test]
    fn parse_wal_config() {
        let c = ServerConfig::from_toml(
            r#"
            bind_addr = "127.0.0.1:9000"

            [provisioning]
            starting_credits = 3
            accounts = ["alice"]

            [store]
            backend = "wal"
            path = "/var/lib/tollgate/accounts.wal"
            sync = "os-default"
            "#,
        )
        .unwrap();

        assert_eq!(c.bind_addr.port(), 9000);
        assert_eq!(c.provisioning.accounts, vec!["alice".to_string()]);
        assert_eq!(
            c.store,
            StoreConfig::Wal {
                path: "/var/lib/tollgate/accounts.wal".into(),
                sync: SyncMode::OsDefault,
                compact_on_open: false,
            }
        );
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(ServerConfig::from_toml("").unwrap(), ServerConfig::default());
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = ServerConfig::from_toml("bind_addr = 12").unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn toml_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tollgate.toml");
        let mut c = ServerConfig::default();
        c.store = StoreConfig::Wal {
            path: dir.path().join("accounts.wal"),
            sync: SyncMode::EveryWrite,
            compact_on_open: true,
        };
        std::fs::write(&path, c.to_toml().unwrap()).unwrap();
        assert_eq!(ServerConfig::load(&path).unwrap(), c);
    }
}
