//! Protocol implementations.
//!
//! - `telnet`: plain TCP greeting + pong
//! - `ssh`: password-authenticated SSH session + pong
//!
//! Both share the chunk-in, fixed-reply-out loop in `pong`.

pub mod pong;
pub mod ssh;
pub mod telnet;
