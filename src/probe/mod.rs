// src/probe/mod.rs
// =============================================================================
// This module measures how quickly we can open a TCP connection to each node.
//
// How it works:
// 1. Allocate one empty result slot per node, indexed by input position
// 2. Start one probe future per node, with a bound on how many run at once
// 3. Each probe reports (index, outcome); results land in their own slot
// 4. After every probe has finished or timed out, merge slots into nodes
//
// Probes finish in whatever order the network decides, but because results
// are keyed by index the output order always matches the input order.
//
// A failed probe is not an error: the node simply gets the "unreachable"
// latency, which is larger than any real measurement, so it sorts last
// inside its location bucket.
//
// Submodules:
// - tcp: the real prober built on tokio::net::TcpStream
// =============================================================================

mod tcp;

pub use tcp::TcpProber;

use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt}; // StreamExt gives us .buffer_unordered()
use tracing::debug;

use crate::node::Node;

/// Added to the probe timeout to build the "unreachable" latency
pub const UNREACHABLE_MARGIN_SECS: f64 = 1.0;

/// Something that can time a connection attempt.
///
/// The pipeline uses TcpProber; tests plug in fakes so they never touch
/// the network.
pub trait Prober: Sync {
    /// Tries to connect to (server, port) within `timeout`.
    ///
    /// Returns the time it took, or None if the attempt failed or timed out.
    fn connect<'a>(
        &'a self,
        server: &'a str,
        port: u16,
        timeout: Duration,
    ) -> BoxFuture<'a, Option<Duration>>;
}

/// The latency recorded for a node whose probe failed
pub fn unreachable_latency(timeout: Duration) -> f64 {
    timeout.as_secs_f64() + UNREACHABLE_MARGIN_SECS
}

/// True if the latency is a real measurement rather than the sentinel
pub fn is_reachable(latency_seconds: f64, timeout: Duration) -> bool {
    latency_seconds <= timeout.as_secs_f64()
}

// Probes every node and returns them with latency_seconds filled in
//
// Parameters:
//   nodes: the decoded nodes (ownership moves in and back out)
//   timeout: hard limit per probe
//   concurrency: maximum number of probes in flight
//   prober: how to actually connect
//
// Returns: the same nodes, in the same order, each with a latency
pub async fn probe_nodes<P>(
    nodes: Vec<Node>,
    timeout: Duration,
    concurrency: usize,
    prober: &P,
) -> Vec<Node>
where
    P: Prober + ?Sized,
{
    // One slot per node; a slot is only ever written by its own probe
    let mut slots: Vec<Option<Duration>> = vec![None; nodes.len()];

    let probes = nodes.iter().enumerate().map(|(index, node)| async move {
        let outcome = prober.connect(&node.server, node.port, timeout).await;
        // Anything slower than the timeout counts as a failure
        (index, outcome.filter(|elapsed| *elapsed <= timeout))
    });

    let results: Vec<(usize, Option<Duration>)> = stream::iter(probes)
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    for (index, outcome) in results {
        slots[index] = outcome;
    }

    let sentinel = unreachable_latency(timeout);
    nodes
        .into_iter()
        .zip(slots)
        .map(|(node, outcome)| {
            let latency = match outcome {
                Some(elapsed) => elapsed.as_secs_f64(),
                None => sentinel,
            };
            debug!(
                server = %node.server,
                port = node.port,
                latency,
                reachable = outcome.is_some(),
                "probe finished"
            );
            node.with_latency(latency)
        })
        .collect()
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why buffer_unordered and not join_all?
//    - join_all would open every connection at the same moment
//    - buffer_unordered(N) keeps at most N probes in flight
//    - Results come back in completion order, which is why we carry the index
//
// 2. What is BoxFuture?
//    - A heap-allocated future: Pin<Box<dyn Future + Send + 'a>>
//    - Traits cannot (easily) have async methods returning different future
//      types per implementation, so the Prober trait returns a boxed one
//
// 3. Why a trait at all?
//    - TcpProber talks to the real network
//    - Tests implement Prober with fixed delays and never open a socket
// -----------------------------------------------------------------------------
