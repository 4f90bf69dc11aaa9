//! SSH test fixture.
//!
//! Key exchange, encryption and channel multiplexing come from russh. The
//! fixture itself decides two things, through `policy::SessionPolicy`:
//!
//! - `password` authentication succeeds only for the configured pair
//! - only `session` channels may be opened; anything else is refused as
//!   administratively prohibited
//!
//! Once a session channel is open:
//!
//! ```text
//! Server: Welcome to test SSH server!\n
//! Client: ping
//! Server: pong\n
//! ```

pub mod context;
pub mod handler;
pub mod policy;

pub use context::SshContext;
pub use handler::handle_connection;
