//! TCP listener shared by the telnet and SSH fixtures.
//!
//! Binds a reusable socket, accepts connections forever and hands each one
//! to its own task. There is no connection limit.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info};

/// Listen backlog
const BACKLOG: i32 = 1024;

/// Bind a non-blocking listener with SO_REUSEADDR set.
pub fn bind(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = socket2::Socket::new(
        match addr {
            SocketAddr::V4(_) => socket2::Domain::IPV4,
            SocketAddr::V6(_) => socket2::Domain::IPV6,
        },
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(BACKLOG)?;

    TcpListener::from_std(socket.into())
}

/// Accept connections until the process exits.
///
/// Every accepted connection is dispatched to `handler` on a fresh task and
/// the loop goes straight back to `accept`. Accept errors are logged and do
/// not stop the listener.
pub async fn serve<F, Fut>(listener: TcpListener, protocol: &'static str, handler: F)
where
    F: Fn(TcpStream, SocketAddr) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    match listener.local_addr() {
        Ok(addr) => info!(protocol, address = %addr, "Server listening"),
        Err(e) => error!(protocol, error = %e, "Failed to read local address"),
    }

    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                debug!(protocol, peer = %peer, "New connection");
                tokio::spawn(handler(stream, peer));
            }
            Err(e) => {
                error!(protocol, error = %e, "Failed to accept connection");
            }
        }
    }
}
