//! pong-server: telnet and SSH test fixtures
//!
//! Two throwaway servers for exercising telnet and SSH clients:
//! - Telnet: greets, then answers every chunk with `pong\r\n`
//! - SSH: password login for one fixed user, then answers every chunk on the
//!   session channel with `pong\n`
//!
//! Configuration via CLI arguments or TOML file; the defaults are the fixed
//! fixture values (ports 2323 and 2222, `testuser` / `password`).

mod config;
mod protocols;
mod server;

use config::Config;
use protocols::ssh::SshContext;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        protocol = ?config.protocol,
        telnet = %config.telnet_listen,
        ssh = %config.ssh.listen,
        "Starting pong-server"
    );

    let telnet = async {
        if config.protocol.runs_telnet() {
            run_telnet(&config).await
        } else {
            Ok(())
        }
    };

    let ssh = async {
        if config.protocol.runs_ssh() {
            run_ssh(&config).await
        } else {
            Ok(())
        }
    };

    tokio::try_join!(telnet, ssh)?;
    Ok(())
}

/// Run the telnet fixture. Only returns on bind failure.
async fn run_telnet(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let listener = server::bind(config.telnet_listen)?;
    server::serve(listener, "telnet", protocols::telnet::serve_connection).await;
    Ok(())
}

/// Run the SSH fixture. Only returns on host key or bind failure.
async fn run_ssh(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Arc::new(SshContext::generate(&config.ssh)?);
    info!(
        user = %ctx.credentials.username,
        fingerprint = %ctx.host_key_fingerprint(),
        "Generated SSH host key"
    );

    let listener = server::bind(config.ssh.listen)?;
    server::serve(listener, "ssh", move |stream, peer| {
        protocols::ssh::handle_connection(stream, peer, Arc::clone(&ctx))
    })
    .await;
    Ok(())
}
