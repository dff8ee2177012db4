use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use ccl_consensus::{InMemoryConsensusLog, LedgerReader, Publisher};
use ccl_ledger::{EventRecorder, MemoryDirectory};
use ccl_store::{CustodyStore, MemoryStore};
use ccl_types::LogId;

use crate::auth::{ActorProvider, HeaderActorProvider};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;

/// Shared handles behind every request handler.
#[derive(Clone)]
pub struct AppState {
    pub recorder: Arc<EventRecorder>,
    pub reader: Arc<LedgerReader>,
    pub store: Arc<dyn CustodyStore>,
    pub actors: Arc<dyn ActorProvider>,
    pub log: LogId,
    pub page_limit: u32,
    pub max_walk_pages: u32,
}

/// An [`AppState`] wired entirely in memory, with handles to the backing
/// pieces for seeding and inspection.
pub struct InMemoryParts {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub directory: Arc<MemoryDirectory>,
    pub log: Arc<InMemoryConsensusLog>,
}

impl AppState {
    /// Wire the in-memory store, directory, and consensus log. Facilities
    /// listed in the config are registered up front.
    pub fn in_memory(config: &ServerConfig) -> ServerResult<InMemoryParts> {
        let store = Arc::new(MemoryStore::new());
        let directory = Arc::new(MemoryDirectory::new());
        let log = Arc::new(InMemoryConsensusLog::new());

        for facility in &config.facilities {
            directory.register(
                ccl_types::FacilityId::new(facility.id.clone()),
                facility.facility_type,
            )?;
        }

        let log_id = LogId::new(config.log_id.clone());
        let publisher = Publisher::new(
            log.clone(),
            Duration::from_millis(config.submit_timeout_ms),
        );
        let recorder = Arc::new(EventRecorder::new(
            store.clone(),
            directory.clone(),
            publisher,
            log_id.clone(),
        ));
        let reader = Arc::new(LedgerReader::new(log.clone()));

        let state = AppState {
            recorder,
            reader,
            store: store.clone(),
            actors: Arc::new(HeaderActorProvider),
            log: log_id,
            page_limit: config.page_limit,
            max_walk_pages: config.max_walk_pages,
        };
        Ok(InMemoryParts {
            state,
            store,
            directory,
            log,
        })
    }
}

/// Chain-of-Custody Ledger server.
pub struct CclServer {
    config: ServerConfig,
    state: AppState,
}

impl CclServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = build_router(self.state);
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!("CCL server listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
