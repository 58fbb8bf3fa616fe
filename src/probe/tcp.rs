// src/probe/tcp.rs
// =============================================================================
// The real prober: a bare TCP connect with a hard timeout.
//
// We only check that the port accepts connections. No bytes are sent, and
// the stream is dropped (closed) right after the handshake completes.
// =============================================================================

use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt};
use tokio::net::TcpStream;
use tracing::debug;

use super::Prober;

/// Times a plain TCP handshake to the node
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpProber;

impl Prober for TcpProber {
    fn connect<'a>(
        &'a self,
        server: &'a str,
        port: u16,
        timeout: Duration,
    ) -> BoxFuture<'a, Option<Duration>> {
        async move {
            let started = Instant::now();

            // DNS resolution happens inside connect(), so it is covered by
            // the same timeout
            match tokio::time::timeout(timeout, TcpStream::connect((server, port))).await {
                Ok(Ok(stream)) => {
                    let elapsed = started.elapsed();
                    drop(stream);
                    Some(elapsed)
                }
                Ok(Err(e)) => {
                    debug!(server, port, error = %e, "connect failed");
                    None
                }
                Err(_) => {
                    debug!(server, port, "connect timed out");
                    None
                }
            }
        }
        .boxed()
    }
}
