use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use tollgate_ledger::Ledger;
use tollgate_store::{AccountStore, InMemoryAccountStore, WalAccountStore};

use crate::config::{ServerConfig, StoreConfig};
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;

/// Ledger over whichever backend the configuration selected.
pub type DynLedger = Ledger<Box<dyn AccountStore>>;

/// The credit ledger service.
pub struct LedgerServer {
    config: ServerConfig,
}

impl LedgerServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Open the configured store and seed the allow-list.
    pub fn open_ledger(&self) -> ServerResult<Arc<DynLedger>> {
        let store: Box<dyn AccountStore> = match &self.config.store {
            StoreConfig::Memory => Box::new(InMemoryAccountStore::new()),
            StoreConfig::Wal {
                path,
                sync,
                compact_on_open,
            } => {
                let mut wal = WalAccountStore::open(path, *sync)?;
                if *compact_on_open {
                    wal.compact()?;
                }
                Box::new(wal)
            }
        };
        let ledger = Ledger::open(store, &self.config.provisioning)?;
        Ok(Arc::new(ledger))
    }

    /// Start serving until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        self.serve_with_shutdown(shutdown_signal()).await
    }

    /// Start serving until `shutdown` resolves. The ledger is dropped (and
    /// its store closed) when this returns.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let ledger = self.open_ledger()?;
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        info!("tollgate ledger listening on {}", listener.local_addr()?);
        run(listener, ledger, shutdown).await?;
        info!("tollgate ledger stopped");
        Ok(())
    }
}

/// Serve `ledger` on an already-bound listener until `shutdown` resolves.
pub async fn run<S, F>(listener: TcpListener, ledger: Arc<Ledger<S>>, shutdown: F) -> ServerResult<()>
where
    S: AccountStore + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, build_router(ledger))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_ledger::Provisioning;
    use tollgate_store::{AccountId, SyncMode};

    #[test]
    fn server_construction() {
        let server = LedgerServer::new(ServerConfig::default());
        assert_eq!(server.config().bind_addr.port(), 8000);
    }

    #[test]
    fn memory_ledger_is_seeded() {
        let ledger = LedgerServer::new(ServerConfig::default()).open_ledger().unwrap();
        assert_eq!(ledger.balance(&AccountId::new("avy")).unwrap(), Some(5));
        assert_eq!(ledger.balance(&AccountId::new("vaibhav")).unwrap(), Some(5));
    }

    #[test]
    fn wal_ledger_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            provisioning: Provisioning::new(2, ["avy"]),
            store: StoreConfig::Wal {
                path: dir.path().join("accounts.wal"),
                sync: SyncMode::EveryWrite,
                compact_on_open: true,
            },
            ..ServerConfig::default()
        };

        {
            let ledger = LedgerServer::new(config.clone()).open_ledger().unwrap();
            ledger.consume(&AccountId::new("avy")).unwrap();
        }

        let ledger = LedgerServer::new(config).open_ledger().unwrap();
        assert_eq!(ledger.balance(&AccountId::new("avy")).unwrap(), Some(1));
    }

    #[tokio::test]
    async fn serve_stops_on_shutdown_signal() {
        let config = ServerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            ..ServerConfig::default()
        };
        LedgerServer::new(config)
            .serve_with_shutdown(async {})
            .await
            .unwrap();
    }
}
