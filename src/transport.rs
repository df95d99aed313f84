//! Duplex frame transport between host and runner.
//!
//! The orchestrator only ever asks a transport to receive one frame or send one frame. Frames are raw text;
//! decoding happens in [`crate::protocol`] so a malformed frame can be answered with an `ERROR` message instead
//! of tearing the channel down.
//!
//! Two implementations:
//! - [`LineTransport`]: newline-delimited frames over any async reader/writer pair (stdio, child pipes). Each
//!   frame line starts with [`FRAME_MARKER`]; the runner's stdout is shared with the test bodies, so lines
//!   without the marker are stray output and are logged, not decoded.
//! - [`ChannelTransport`]: in-process tokio channels, used by the in-process host and by tests.

use std::future::Future;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines, Stdin, Stdout};
use tokio::sync::mpsc;

/// Prefix carried by every frame line on a [`LineTransport`].
pub const FRAME_MARKER: &str = "@conductor ";

/// Errors raised by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("peer closed the channel")]
    Closed,
}

/// Receive-one / send-one frame channel.
pub trait Transport: Send {
    /// Wait for the next frame. `Ok(None)` means the peer closed the channel cleanly.
    fn recv(&mut self) -> impl Future<Output = Result<Option<String>, TransportError>> + Send;

    /// Send one frame.
    fn send(&mut self, frame: String) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Newline-delimited frames over an async reader/writer pair.
pub struct LineTransport<R, W> {
    lines: Lines<R>,
    writer: W,
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            lines: reader.lines(),
            writer,
        }
    }
}

impl LineTransport<BufReader<Stdin>, Stdout> {
    /// Frames on this process's stdin/stdout.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> Transport for LineTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn recv(&mut self) -> Result<Option<String>, TransportError> {
        while let Some(line) = self.lines.next_line().await? {
            // A `print!` without a newline ends up in front of the next frame on the same line.
            let Some(at) = line.find(FRAME_MARKER) else {
                if !line.trim().is_empty() {
                    tracing::warn!(output = %line, "ignoring unframed output from peer");
                }
                continue;
            };
            let (stray, frame) = line.split_at(at);
            if !stray.trim().is_empty() {
                tracing::warn!(output = %stray, "ignoring unframed output from peer");
            }
            let frame = &frame[FRAME_MARKER.len()..];
            if !frame.trim().is_empty() {
                return Ok(Some(frame.to_string()));
            }
        }
        Ok(None)
    }

    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        // One write per frame so output from other threads cannot land inside it.
        let mut line = String::with_capacity(FRAME_MARKER.len() + frame.len() + 1);
        line.push_str(FRAME_MARKER);
        line.push_str(&frame);
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

/// In-process frame channel backed by unbounded tokio mpsc queues.
pub struct ChannelTransport {
    rx: mpsc::UnboundedReceiver<String>,
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelTransport {
    /// Create two connected ends: frames sent on one are received on the other.
    pub fn pair() -> (ChannelTransport, ChannelTransport) {
        let (a_tx, b_rx) = mpsc::unbounded_channel();
        let (b_tx, a_rx) = mpsc::unbounded_channel();
        (
            ChannelTransport { rx: a_rx, tx: a_tx },
            ChannelTransport { rx: b_rx, tx: b_tx },
        )
    }
}

impl Transport for ChannelTransport {
    async fn recv(&mut self) -> Result<Option<String>, TransportError> {
        Ok(self.rx.recv().await)
    }

    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        self.tx.send(frame).map_err(|_| TransportError::Closed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_pair_is_connected_both_ways() {
        let (mut host, mut runner) = ChannelTransport::pair();
        host.send("ping".to_string()).await.unwrap();
        assert_eq!(runner.recv().await.unwrap().as_deref(), Some("ping"));
        runner.send("pong".to_string()).await.unwrap();
        assert_eq!(host.recv().await.unwrap().as_deref(), Some("pong"));
    }

    #[tokio::test]
    async fn channel_recv_returns_none_after_peer_drop() {
        let (host, mut runner) = ChannelTransport::pair();
        drop(host);
        assert!(runner.recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn line_transport_skips_blank_lines() {
        let input: &[u8] = b"\n@conductor {\"type\":\"BEGIN\"}\n   \n@conductor \n@conductor {\"type\":\"FINISHED\"}\n";
        let mut transport = LineTransport::new(input, Vec::new());
        assert_eq!(transport.recv().await.unwrap().as_deref(), Some(r#"{"type":"BEGIN"}"#));
        assert_eq!(transport.recv().await.unwrap().as_deref(), Some(r#"{"type":"FINISHED"}"#));
        assert!(transport.recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn line_transport_skips_unframed_output() {
        let input: &[u8] = b"debug: value is 3\n{\"type\":\"FINISHED\"}\nprogress 50%@conductor {\"type\":\"BEGIN\"}\ntrailing\n";
        let mut transport = LineTransport::new(input, Vec::new());
        assert_eq!(transport.recv().await.unwrap().as_deref(), Some(r#"{"type":"BEGIN"}"#));
        assert!(transport.recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn line_transport_marks_and_terminates_frames() {
        let input: &[u8] = b"";
        let mut transport = LineTransport::new(input, Vec::new());
        transport.send("one".to_string()).await.unwrap();
        transport.send("two".to_string()).await.unwrap();
        assert_eq!(transport.writer, b"@conductor one\n@conductor two\n");
    }

    #[tokio::test]
    async fn line_transports_talk_to_each_other() {
        let (near, far) = tokio::io::duplex(1024);
        let (near_read, near_write) = tokio::io::split(near);
        let (far_read, far_write) = tokio::io::split(far);
        let mut host = LineTransport::new(BufReader::new(near_read), near_write);
        let mut runner = LineTransport::new(BufReader::new(far_read), far_write);

        host.send(r#"{"type":"BEGIN"}"#.to_string()).await.unwrap();
        assert_eq!(runner.recv().await.unwrap().as_deref(), Some(r#"{"type":"BEGIN"}"#));
        runner.send(r#"{"type":"FINISHED"}"#.to_string()).await.unwrap();
        assert_eq!(host.recv().await.unwrap().as_deref(), Some(r#"{"type":"FINISHED"}"#));
    }
}
