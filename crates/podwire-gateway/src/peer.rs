//! Stream substrate: one TCP connection between the two peers.
//!
//! The listening side accepts exactly one connection; the connecting side dials
//! once. Whatever comes back is just an ordered byte stream to the tunnel.

use tokio::net::{TcpListener, TcpStream};

use podwire_core::error::{PodwireError, Result};

use crate::config::{PeerConfig, PeerRole};

pub async fn establish(cfg: &PeerConfig) -> Result<TcpStream> {
    let stream = match cfg.role {
        PeerRole::Listen => {
            let listener = TcpListener::bind(&cfg.addr)
                .await
                .map_err(|e| PodwireError::Internal(format!("bind {} failed: {e}", cfg.addr)))?;
            tracing::info!(addr = %cfg.addr, "waiting for peer");
            let (stream, remote) = listener.accept().await?;
            tracing::info!(%remote, "got a new stream");
            stream
        }
        PeerRole::Connect => {
            let stream = TcpStream::connect(&cfg.addr).await?;
            tracing::info!(addr = %cfg.addr, "connected to peer");
            stream
        }
    };
    stream.set_nodelay(true)?;
    Ok(stream)
}
