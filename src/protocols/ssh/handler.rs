//! SSH connection worker.
//!
//! russh drives the transport on its own task. This worker waits for the
//! handler to pass over the first session channel, then runs the pong loop
//! on it. Whatever goes wrong is reported once, as `Error: <message>`, and
//! the transport is disconnected.

use russh::server::{Auth, Handler, Msg, RunningSession, Session};
use russh::{Channel, Disconnect, MethodKind, MethodSet};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::context::SshContext;
use super::policy::{AuthResult, ChannelKind, ChannelOpen, SessionPolicy};
use crate::protocols::pong::{self, Banner};

pub const BANNER: Banner = Banner {
    greeting: b"Welcome to test SSH server!\n",
    reply: b"pong\n",
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Per-connection russh handler.
pub struct SshHandler {
    ctx: Arc<SshContext>,
    peer: SocketAddr,
    channel_tx: Option<oneshot::Sender<Channel<Msg>>>,
}

impl SshHandler {
    pub fn new(
        ctx: Arc<SshContext>,
        peer: SocketAddr,
        channel_tx: oneshot::Sender<Channel<Msg>>,
    ) -> Self {
        Self {
            ctx,
            peer,
            channel_tx: Some(channel_tx),
        }
    }

    /// Apply the channel policy; the first accepted channel goes to the worker.
    fn open_channel(&mut self, kind: ChannelKind, channel: Channel<Msg>) -> bool {
        match self.ctx.credentials.check_channel_request(kind) {
            ChannelOpen::Succeeded => {
                debug!(peer = %self.peer, kind = %kind, id = ?channel.id(), "Channel opened");
                if let Some(tx) = self.channel_tx.take() {
                    let _ = tx.send(channel);
                }
                true
            }
            ChannelOpen::Failed(reason) => {
                debug!(
                    peer = %self.peer,
                    kind = %kind,
                    reason = reason.code(),
                    "Channel open rejected"
                );
                false
            }
        }
    }
}

impl Handler for SshHandler {
    type Error = russh::Error;

    async fn auth_password(&mut self, user: &str, password: &str) -> Result<Auth, Self::Error> {
        match self.ctx.credentials.check_auth_password(user, password) {
            AuthResult::Successful => {
                debug!(peer = %self.peer, user, "Password accepted");
                Ok(Auth::Accept)
            }
            AuthResult::Failed => {
                debug!(peer = %self.peer, user, "Password rejected");
                // Keep offering `password` so the client can try again.
                Ok(Auth::Reject {
                    proceed_with_methods: Some(MethodSet::from(&[MethodKind::Password][..])),
                })
            }
        }
    }

    async fn channel_open_session(
        &mut self,
        channel: Channel<Msg>,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        Ok(self.open_channel(ChannelKind::Session, channel))
    }

    async fn channel_open_x11(
        &mut self,
        channel: Channel<Msg>,
        _originator_address: &str,
        _originator_port: u32,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        Ok(self.open_channel(ChannelKind::X11, channel))
    }

    async fn channel_open_direct_tcpip(
        &mut self,
        channel: Channel<Msg>,
        _host_to_connect: &str,
        _port_to_connect: u32,
        _originator_address: &str,
        _originator_port: u32,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        Ok(self.open_channel(ChannelKind::DirectTcpip, channel))
    }
}

/// Handle one SSH connection from transport setup to disconnect.
pub async fn handle_connection(stream: TcpStream, peer: SocketAddr, ctx: Arc<SshContext>) {
    let (channel_tx, channel_rx) = oneshot::channel();
    let handler = SshHandler::new(Arc::clone(&ctx), peer, channel_tx);

    let session =
        match russh::server::run_stream(Arc::clone(&ctx.server_config), stream, handler).await {
            Ok(session) => session,
            Err(e) => {
                warn!(peer = %peer, "Error: {}", e);
                return;
            }
        };
    let handle = session.handle();

    if let Err(e) = run_session(session, channel_rx, ctx.channel_open_timeout).await {
        warn!(peer = %peer, "Error: {}", e);
    }

    let _ = handle
        .disconnect(Disconnect::ByApplication, String::new(), String::new())
        .await;
    debug!(peer = %peer, "SSH transport closed");
}

/// Wait for a session channel, then answer pong on it until EOF.
async fn run_session(
    session: RunningSession<SshHandler>,
    channel_rx: oneshot::Receiver<Channel<Msg>>,
    wait: Duration,
) -> Result<(), BoxError> {
    let channel = match tokio::time::timeout(wait, channel_rx).await {
        Ok(Ok(channel)) => channel,
        Ok(Err(_)) => {
            // Handler dropped: the session ended before any channel opened.
            session.await?;
            return Ok(());
        }
        Err(_) => {
            debug!(?wait, "No channel opened in time");
            return Ok(());
        }
    };

    // From here on `session` is dropped unawaited: transport errors surface
    // as EOF or an I/O error on the channel, not as a separate log line.
    let mut stream = Box::pin(channel.into_stream());
    echo(&mut stream).await?;
    Ok(())
}

/// The pong loop with the SSH banner and log line.
async fn echo<S>(stream: &mut S) -> std::io::Result<usize>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    pong::run(stream, &BANNER, |chunk| {
        info!("Received: {}", String::from_utf8_lossy(chunk).trim());
    })
    .await
}
