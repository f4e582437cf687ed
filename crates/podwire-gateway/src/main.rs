//! podwire gateway binary.
//!
//! - Connects to (or waits for) the remote peer over TCP
//! - Runs the tunnel: demultiplexer + dispatcher over that one stream
//! - Serves the local HTTP surface that forwards container calls to the peer

use tracing_subscriber::{fmt, EnvFilter};

use podwire_core::error::{PodwireError, Result};
use podwire_gateway::{app_state, backend, config, peer, router};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "podwire-gateway failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "podwire.yaml".to_string());
    let cfg = config::load_from_file(&path)?;
    let listen = cfg.gateway.listen_addr()?;

    let engine = backend::from_config(&cfg.backend);
    let stream = peer::establish(&cfg.peer).await?;

    let state = app_state::AppState::start(cfg, stream, engine)?;
    let app = router::build_router(state.clone());

    tracing::info!(%listen, "podwire-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| PodwireError::Internal(format!("server failed: {e}")))?;

    state.tunnel().shutdown();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, starting graceful shutdown");
}
