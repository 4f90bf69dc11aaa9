//! The two decisions the SSH fixture makes itself: who may log in, and
//! which channels may be opened. Everything else is left to russh.

use std::fmt;

/// Outcome of a password check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthResult {
    Successful,
    Failed,
}

/// Reason code for a refused channel open (RFC 4254 section 5.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenFailure {
    AdministrativelyProhibited,
}

impl OpenFailure {
    /// Wire value of the reason code.
    pub fn code(self) -> u32 {
        match self {
            OpenFailure::AdministrativelyProhibited => 1,
        }
    }
}

/// Outcome of a channel open request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOpen {
    Succeeded,
    Failed(OpenFailure),
}

/// Channel types a client may ask a server to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Session,
    X11,
    DirectTcpip,
}

impl ChannelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChannelKind::Session => "session",
            ChannelKind::X11 => "x11",
            ChannelKind::DirectTcpip => "direct-tcpip",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-side callbacks consulted during an SSH session.
pub trait SessionPolicy {
    /// Decide a `password` authentication attempt.
    fn check_auth_password(&self, username: &str, password: &str) -> AuthResult;

    /// Decide whether a channel of `kind` may be opened.
    fn check_channel_request(&self, kind: ChannelKind) -> ChannelOpen;
}

/// The single username/password pair the fixture accepts.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl SessionPolicy for Credentials {
    fn check_auth_password(&self, username: &str, password: &str) -> AuthResult {
        if username == self.username && password == self.password {
            AuthResult::Successful
        } else {
            AuthResult::Failed
        }
    }

    fn check_channel_request(&self, kind: ChannelKind) -> ChannelOpen {
        match kind {
            ChannelKind::Session => ChannelOpen::Succeeded,
            _ => ChannelOpen::Failed(OpenFailure::AdministrativelyProhibited),
        }
    }
}
