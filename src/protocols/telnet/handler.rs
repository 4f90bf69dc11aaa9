//! Telnet connection worker.

use std::net::SocketAddr;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::protocols::pong::{self, Banner};

pub const BANNER: Banner = Banner {
    greeting: b"Welcome to test telnet server\r\n",
    reply: b"pong\r\n",
};

/// Handle a telnet connection.
///
/// Errors end the worker; the stream is dropped, closing the socket, on
/// every exit path.
pub async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let replies = pong::run(&mut stream, &BANNER, |chunk| {
        info!(
            "Received data from {}: {}",
            peer,
            String::from_utf8_lossy(chunk)
        );
    })
    .await?;

    debug!(peer = %peer, replies, "Telnet client disconnected");
    stream.shutdown().await?;
    Ok(())
}

/// Spawnable wrapper that logs the worker's outcome.
pub async fn serve_connection(stream: TcpStream, peer: SocketAddr) {
    if let Err(e) = handle_connection(stream, peer).await {
        debug!(peer = %peer, error = %e, "Connection error");
    }
}
