//! HTTP/WebSocket front end for the live incremental evaluation engine.
//!
//! Exposes a `GET /health` liveness check, a `GET /api/state` snapshot
//! endpoint, and a `GET /ws` endpoint that sends the client the full
//! current `NodeList`, then forwards every subsequent diff as it is
//! produced by the DAG evaluator. There is no cell-editing message surface:
//! the only way to change the cell list is to edit the watched file.

pub mod error;
pub mod protocol;
pub mod routes;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use livecell_core::CellEvaluator;
use livecell_watch::CellGrammar;

pub use error::{Error, Result};
pub use protocol::{ClientMessage, ServerMessage};
pub use routes::{create_router, AppState};

/// Server configuration: where to bind, and whether the caller wants a
/// browser opened automatically. A `Default` impl the CLI overrides from
/// its own flags, no config file format invented.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub open_browser: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            open_browser: false,
        }
    }
}

/// Watch `path`, parse it with `grammar`, drive evaluation with `eval_fn`
/// from `initial_env`, and serve the resulting diff stream over HTTP/WS
/// until the process receives Ctrl+C.
pub async fn serve<Env, G, O>(
    path: impl AsRef<Path>,
    grammar: G,
    eval_fn: Arc<dyn CellEvaluator<Env, G::Cell, O>>,
    initial_env: Env,
    config: ServerConfig,
) -> Result<()>
where
    Env: Clone + Send + Sync + 'static,
    G: CellGrammar,
    G::Cell: serde::Serialize,
    O: Clone + Send + Sync + serde::Serialize + 'static,
{
    let evaluator = livecell_watch::watch_and_eval_file(path, grammar, eval_fn, initial_env).await?;

    let state: Arc<AppState<Env, G::Cell, O>> = Arc::new(AppState::new(evaluator));
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|_| Error::InvalidAddress {
            host: config.host.clone(),
            port: config.port,
        })?;

    tracing::info!(%addr, "starting live-eval server");
    if config.open_browser {
        tracing::info!("open http://{addr} in your browser");
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received shutdown signal");
            let _ = shutdown_tx.send(());
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        })
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_binds_localhost_3000() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert!(!config.open_browser);
    }
}
