// src/pipeline.rs
// =============================================================================
// Glues the stages together:
//
//   raw text -> extract links -> decode -> (probe) -> rank -> ranked nodes
//
// Only fetching (before) and rendering (after) live outside this module.
//
// Bad links never stop the run. Each decode failure is logged, remembered
// in `dropped`, and the next link is processed. An empty result is fine too:
// the caller renders empty documents.
// =============================================================================

use serde::Serialize;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::node::{decode_link, DecodeError, Node};
use crate::probe::{probe_nodes, Prober};
use crate::rank::rank_nodes;
use crate::subscription::{extract_links, normalize_body};

/// A link that could not be decoded, and why
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedLink {
    pub link: String,
    #[serde(serialize_with = "serialize_reason")]
    pub reason: DecodeError,
}

/// Everything a pipeline run produces
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineOutcome {
    /// Ranked nodes, best first
    pub nodes: Vec<Node>,
    /// How many candidate links were found in the body
    pub links_found: usize,
    /// Links that failed to decode, in source order
    pub dropped: Vec<DroppedLink>,
}

// Decodes every link, keeping source order
//
// Returns: (decoded nodes, links that failed)
pub fn decode_all<'a, I>(links: I, known_locations: &[String]) -> (Vec<Node>, Vec<DroppedLink>)
where
    I: IntoIterator<Item = &'a str>,
{
    let mut nodes = Vec::new();
    let mut dropped = Vec::new();

    for link in links {
        match decode_link(link, known_locations) {
            Ok(node) => nodes.push(node),
            Err(reason) => {
                warn!(link = %shorten(link), reason = %reason, "dropping link");
                dropped.push(DroppedLink {
                    link: link.to_string(),
                    reason,
                });
            }
        }
    }

    (nodes, dropped)
}

// Runs extract -> decode -> probe -> rank over a subscription body
//
// Parameters:
//   text: raw subscription body
//   config: priority list and probe settings
//   prober: used only when config.probe_enabled is true
pub async fn run_pipeline<P>(text: &str, config: &PipelineConfig, prober: &P) -> PipelineOutcome
where
    P: Prober + ?Sized,
{
    let body = normalize_body(text);
    let links = extract_links(&body);
    let links_found = links.clone().count();
    info!(links_found, "extracted links");

    let (nodes, dropped) = decode_all(links, &config.priority);
    info!(decoded = nodes.len(), dropped = dropped.len(), "decoded links");

    if nodes.is_empty() {
        warn!("no usable nodes in subscription");
    }

    let nodes = if config.probe_enabled && !nodes.is_empty() {
        info!(
            nodes = nodes.len(),
            timeout_secs = config.probe_timeout.as_secs_f64(),
            "probing nodes"
        );
        probe_nodes(nodes, config.probe_timeout, config.probe_concurrency, prober).await
    } else {
        nodes
    };

    PipelineOutcome {
        nodes: rank_nodes(nodes, &config.priority),
        links_found,
        dropped,
    }
}

// Links can be kilobytes of base64; keep log lines readable
fn shorten(link: &str) -> String {
    const MAX: usize = 80;
    match link.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &link[..cut]),
        None => link.to_string(),
    }
}

fn serialize_reason<S>(reason: &DecodeError, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::unreachable_latency;
    use base64::{engine::general_purpose, Engine as _};
    use futures::future::{BoxFuture, FutureExt};
    use std::time::Duration;

    // Every server except the ones in `dead` answers instantly
    struct FakeProber {
        dead: Vec<&'static str>,
    }

    impl Prober for FakeProber {
        fn connect<'a>(
            &'a self,
            server: &'a str,
            _port: u16,
            _timeout: Duration,
        ) -> BoxFuture<'a, Option<Duration>> {
            let alive = !self.dead.iter().any(|dead| *dead == server);
            async move { alive.then(|| Duration::from_millis(5)) }.boxed()
        }
    }

    fn vmess(ps: &str, add: &str) -> String {
        let payload = serde_json::json!({
            "ps": ps, "add": add, "port": "443",
            "id": "11111111-2222-3333-4444-555555555555", "net": "ws", "tls": "tls"
        });
        format!(
            "vmess://{}",
            general_purpose::STANDARD_NO_PAD.encode(payload.to_string())
        )
    }

    fn no_probe_config() -> PipelineConfig {
        PipelineConfig {
            probe_enabled: false,
            ..PipelineConfig::default()
        }
        .with_priority(["US", "DE"])
    }

    #[test]
    fn test_decode_failures_are_isolated() {
        let links = vec![
            "vless://id@a.example:443#ok-1",
            "vless://id@b.example:notaport",
            "vmess://%%%",
            "vless://id@c.example:443#ok-2",
            "vless://@d.example:443",
        ];

        let (nodes, dropped) = decode_all(links, &[]);

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].name, "ok-1");
        assert_eq!(nodes[1].name, "ok-2");
        assert_eq!(dropped.len(), 3);
        assert_eq!(dropped[0].link, "vless://id@b.example:notaport");
    }

    #[tokio::test]
    async fn test_pipeline_without_probing_ranks_by_bucket_only() {
        let text = format!(
            "# header\n{}\nvless://id@de-1.example:443#Berlin\nvless://id@us-1.example:443#NYC\nbroken vless://x\n{}\n",
            vmess("Tokyo", "10.0.0.1"),
            vmess("Frankfurt DE", "10.0.0.2"),
        );
        let prober = FakeProber { dead: vec![] };

        let outcome = run_pipeline(&text, &no_probe_config(), &prober).await;

        assert_eq!(outcome.links_found, 5);
        assert_eq!(outcome.dropped.len(), 1);
        let names: Vec<&str> = outcome.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["NYC", "Berlin", "Frankfurt DE", "Tokyo"]);
        assert!(outcome.nodes.iter().all(|n| n.latency_seconds.is_none()));
    }

    #[tokio::test]
    async fn test_pipeline_with_probing_puts_dead_nodes_last_in_bucket() {
        let text = "vless://id@us-dead.example:443#A\nvless://id@us-live.example:443#B\n";
        let prober = FakeProber {
            dead: vec!["us-dead.example"],
        };
        let config = PipelineConfig {
            probe_enabled: true,
            probe_timeout: Duration::from_millis(500),
            ..no_probe_config()
        };

        let outcome = run_pipeline(text, &config, &prober).await;

        let names: Vec<&str> = outcome.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(
            outcome.nodes[1].latency_seconds,
            Some(unreachable_latency(config.probe_timeout))
        );
    }

    #[tokio::test]
    async fn test_empty_body_is_not_an_error() {
        let prober = FakeProber { dead: vec![] };
        let outcome = run_pipeline("nothing here\n", &PipelineConfig::default(), &prober).await;
        assert!(outcome.nodes.is_empty());
        assert_eq!(outcome.links_found, 0);
    }

    #[test]
    fn test_shorten() {
        assert_eq!(shorten("short"), "short");
        let long = "x".repeat(200);
        assert_eq!(shorten(&long).len(), 83);
    }
}
