//! Process-wide SSH state: the accepted credentials and the host key.
//!
//! Built once at startup and shared read-only by every connection.

use rand_core::OsRng;
use russh::keys::ssh_key::{self, Algorithm, HashAlg, PrivateKey};
use russh::{MethodKind, MethodSet};
use std::sync::Arc;
use std::time::Duration;

use super::policy::Credentials;
use crate::config::SshConfig;

/// Shared state handed to every SSH worker.
#[derive(Debug)]
pub struct SshContext {
    pub credentials: Credentials,
    pub channel_open_timeout: Duration,
    pub server_config: Arc<russh::server::Config>,
}

impl SshContext {
    /// Build the context with a freshly generated in-memory Ed25519 host key.
    pub fn generate(config: &SshConfig) -> Result<Self, ssh_key::Error> {
        let host_key = PrivateKey::random(&mut OsRng, Algorithm::Ed25519)?;
        Ok(Self::with_host_key(
            Credentials::new(config.username.clone(), config.password.clone()),
            config.channel_open_timeout,
            host_key,
        ))
    }

    pub fn with_host_key(
        credentials: Credentials,
        channel_open_timeout: Duration,
        host_key: PrivateKey,
    ) -> Self {
        let server_config = russh::server::Config {
            methods: MethodSet::from(&[MethodKind::Password][..]),
            keys: vec![host_key],
            auth_rejection_time: Duration::from_secs(1),
            auth_rejection_time_initial: Some(Duration::ZERO),
            ..Default::default()
        };

        Self {
            credentials,
            channel_open_timeout,
            server_config: Arc::new(server_config),
        }
    }

    /// SHA256 fingerprint of the host key, as OpenSSH prints it.
    pub fn host_key_fingerprint(&self) -> String {
        self.server_config
            .keys
            .first()
            .map(|key| key.public_key().fingerprint(HashAlg::Sha256).to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ssh_config() -> SshConfig {
        SshConfig {
            listen: "127.0.0.1:0".parse().unwrap(),
            username: "testuser".to_string(),
            password: "password".to_string(),
            channel_open_timeout: Duration::from_secs(20),
        }
    }

    #[test]
    fn test_generate_context() {
        let ctx = SshContext::generate(&ssh_config()).unwrap();
        assert_eq!(ctx.credentials, Credentials::new("testuser", "password"));
        assert_eq!(ctx.channel_open_timeout, Duration::from_secs(20));
        assert_eq!(ctx.server_config.keys.len(), 1);
        assert!(ctx.host_key_fingerprint().starts_with("SHA256:"));
    }

    #[test]
    fn test_each_process_gets_a_new_key() {
        let a = SshContext::generate(&ssh_config()).unwrap();
        let b = SshContext::generate(&ssh_config()).unwrap();
        assert_ne!(a.host_key_fingerprint(), b.host_key_fingerprint());
    }
}
