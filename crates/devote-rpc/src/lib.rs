//! Devote RPC - HTTP API
//!
//! This crate exposes the consensus engine's finality and scheduling views
//! plus the masternode payment winner over HTTP.

pub mod error;
pub mod handlers;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use devote_consensus::{ChainReader, Devote};
use devote_payments::MasternodePayments;
use devote_state::Storage;
use tracing::info;

use handlers::AppState;
use routes::create_router;

pub use error::RpcError;
pub use handlers::{HeaderResponse, WinnerResponse, WitnessResponse};

/// RPC server configuration
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// HTTP bind address
    pub http_addr: SocketAddr,
}

impl Default for RpcConfig {
    fn default() -> Self {
        RpcConfig {
            http_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}

/// RPC server
pub struct RpcServer<S: Storage> {
    config: RpcConfig,
    app_state: Arc<AppState<S>>,
}

impl<S: Storage + 'static> RpcServer<S> {
    /// Create a new RPC server
    pub fn new(
        config: RpcConfig,
        engine: Arc<Devote<S>>,
        chain: Arc<dyn ChainReader>,
        payments: Arc<MasternodePayments>,
    ) -> Self {
        let app_state = Arc::new(AppState {
            engine,
            chain,
            payments,
        });

        RpcServer { config, app_state }
    }

    /// Create the router
    pub fn router(&self) -> Router {
        create_router(Arc::clone(&self.app_state))
    }

    /// Run the RPC server
    pub async fn run(self) -> Result<(), std::io::Error> {
        let router = self.router();
        let addr = self.config.http_addr;

        info!("Starting RPC server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await
    }
}
