//! Telnet test fixture.
//!
//! Plain TCP, no option negotiation:
//!
//! ```text
//! Server: Welcome to test telnet server\r\n
//! Client: hello\r\n
//! Server: pong\r\n
//! ```
//!
//! Any bytes count as a message. The connection ends when the client closes.

pub mod handler;

pub use handler::serve_connection;
