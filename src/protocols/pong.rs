//! The pong loop shared by both fixtures.
//!
//! ```text
//! Server: <greeting>
//! Client: <any bytes>
//! Server: <reply>
//! ...
//! Client: EOF
//! ```
//!
//! There is no framing: every successful read, whatever it contains, gets
//! exactly one reply.

use bytes::BytesMut;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

/// Largest chunk handled per read
pub const CHUNK_SIZE: usize = 1024;

/// The fixed lines a fixture sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Banner {
    /// Sent once, before the first read.
    pub greeting: &'static [u8],
    /// Sent after every chunk received.
    pub reply: &'static [u8],
}

/// Run the pong loop until the peer closes its side.
///
/// `on_chunk` sees every chunk before the reply is written. Returns the
/// number of replies sent. I/O errors end the loop and are returned as-is.
pub async fn run<S, F>(stream: &mut S, banner: &Banner, mut on_chunk: F) -> io::Result<usize>
where
    S: AsyncRead + AsyncWrite + Unpin,
    F: FnMut(&[u8]),
{
    stream.write_all(banner.greeting).await?;
    stream.flush().await?;

    let mut buffer = BytesMut::with_capacity(CHUNK_SIZE);
    let mut replies = 0;

    loop {
        buffer.clear();

        let n = stream.read_buf(&mut buffer).await?;
        if n == 0 {
            trace!(replies, "Connection closed by peer");
            return Ok(replies);
        }

        on_chunk(&buffer[..n]);

        stream.write_all(banner.reply).await?;
        stream.flush().await?;
        replies += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    const BANNER: Banner = Banner {
        greeting: b"hello there\r\n",
        reply: b"pong\r\n",
    };

    #[tokio::test]
    async fn test_greeting_then_eof() {
        let mut mock = Builder::new().write(b"hello there\r\n").build();
        let replies = run(&mut mock, &BANNER, |_| {}).await.unwrap();
        assert_eq!(replies, 0);
    }

    #[tokio::test]
    async fn test_one_reply_per_chunk() {
        let mut mock = Builder::new()
            .write(b"hello there\r\n")
            .read(b"PING\r\n")
            .write(b"pong\r\n")
            .read(b"\x00\xff garbage")
            .write(b"pong\r\n")
            .read(b"x")
            .write(b"pong\r\n")
            .build();

        let mut seen = Vec::new();
        let replies = run(&mut mock, &BANNER, |chunk| seen.push(chunk.to_vec()))
            .await
            .unwrap();

        assert_eq!(replies, 3);
        assert_eq!(
            seen,
            vec![b"PING\r\n".to_vec(), b"\x00\xff garbage".to_vec(), b"x".to_vec()]
        );
    }

    #[tokio::test]
    async fn test_chunk_is_capped() {
        let big = vec![b'a'; CHUNK_SIZE + 10];
        let mut mock = Builder::new()
            .write(b"hello there\r\n")
            .read(&big)
            .write(b"pong\r\n")
            .write(b"pong\r\n")
            .build();

        let mut sizes = Vec::new();
        let replies = run(&mut mock, &BANNER, |chunk| sizes.push(chunk.len()))
            .await
            .unwrap();

        assert_eq!(replies, 2);
        assert_eq!(sizes, vec![CHUNK_SIZE, 10]);
    }

    #[tokio::test]
    async fn test_read_error_propagates() {
        let mut mock = Builder::new()
            .write(b"hello there\r\n")
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            .build();

        let err = run(&mut mock, &BANNER, |_| {}).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
    }
}
