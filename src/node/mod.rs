// src/node/mod.rs
// =============================================================================
// The canonical Node record and the decoders that produce it.
//
// Submodules:
// - vmess: decodes vmess:// links (base64 encoded JSON object)
// - vless: decodes vless:// links (plain URI with query options)
// - location: works out which location code a node belongs to
// - error: DecodeError, the only way a decode can fail
//
// Both link formats end up as the same Node type, so everything after the
// decoder (probing, ranking, rendering) never needs to know where a node
// came from beyond the `scheme` tag.
//
// Rust concepts:
// - Enums with data: Transport carries WebSocket options only when needed
// - Result<T, E>: every decode either yields a Node or a DecodeError
// =============================================================================

mod error;
mod location;
mod vless;
mod vmess;

pub use error::DecodeError;

use serde::{Deserialize, Serialize};

/// Which link encoding a node was decoded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// vmess://<base64 JSON>
    Vmess,
    /// vless://<identity>@<server>:<port>?<options>#<name>
    Vless,
}

impl Scheme {
    /// Every scheme we know how to decode, in detection order
    pub const ALL: [Scheme; 2] = [Scheme::Vmess, Scheme::Vless];

    /// The link prefix for this scheme, including "://"
    pub fn prefix(self) -> &'static str {
        match self {
            Scheme::Vmess => "vmess://",
            Scheme::Vless => "vless://",
        }
    }

    /// The lowercase protocol name, as proxy clients spell it
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Vmess => "vmess",
            Scheme::Vless => "vless",
        }
    }

    /// Figures out the scheme of a link from its prefix
    pub fn detect(link: &str) -> Option<Scheme> {
        Scheme::ALL
            .into_iter()
            .find(|scheme| link.starts_with(scheme.prefix()))
    }
}

/// WebSocket transport settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsOptions {
    /// Request path, "/" unless the link says otherwise
    pub path: String,
    /// Value for the HTTP Host header (may be empty for vmess links)
    pub host_header: String,
}

/// Network transport used to reach the proxy.
///
/// WebSocket is the only transport with options, so they live inside the
/// variant: a TCP node simply cannot carry ws options by accident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "options", rename_all = "snake_case")]
pub enum Transport {
    Tcp,
    WebSocket(WsOptions),
    /// Any other transport name found in a link (grpc, h2, ...), kept verbatim
    Other(String),
}

impl Transport {
    /// Builds a transport from the network name used in links ("tcp", "ws", ...)
    ///
    /// `ws` is only consulted for the WebSocket case.
    pub fn from_network(network: Option<&str>, ws: impl FnOnce() -> WsOptions) -> Transport {
        match network.map(str::trim).filter(|n| !n.is_empty()) {
            None => Transport::Tcp,
            Some(n) if n.eq_ignore_ascii_case("tcp") => Transport::Tcp,
            Some(n) if n.eq_ignore_ascii_case("ws") => Transport::WebSocket(ws()),
            Some(other) => Transport::Other(other.to_string()),
        }
    }

    /// The network name proxy clients expect ("tcp", "ws", ...)
    pub fn network(&self) -> &str {
        match self {
            Transport::Tcp => "tcp",
            Transport::WebSocket(_) => "ws",
            Transport::Other(name) => name,
        }
    }

    pub fn ws_options(&self) -> Option<&WsOptions> {
        match self {
            Transport::WebSocket(opts) => Some(opts),
            _ => None,
        }
    }
}

/// One proxy endpoint, decoded from a single link.
///
/// Everything except `latency_seconds` is fixed once the decoder returns.
/// The prober fills in `latency_seconds` at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Display label (falls back to `server`)
    pub name: String,
    pub scheme: Scheme,
    /// Hostname or IP literal, never empty
    pub server: String,
    /// Always in 1..=65535
    pub port: u16,
    /// Opaque credential, usually a UUID
    pub identity: String,
    /// Whether TLS is enabled on the connection
    pub tls: bool,
    pub transport: Transport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,
    /// TLS server name, defaults to `server`
    pub server_name: String,
    /// Upper-case location code, when one could be worked out
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// vmess only: cipher, always "auto"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cipher: Option<String>,
    /// vmess only: alterId
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alter_id: Option<u16>,
    /// Seconds to open a TCP connection; None until probing runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_seconds: Option<f64>,
}

impl Node {
    /// Returns the node with its latency slot filled in
    pub fn with_latency(mut self, seconds: f64) -> Node {
        self.latency_seconds = Some(seconds);
        self
    }
}

// Decodes one link into a Node
//
// Parameters:
//   link: a single vmess:// or vless:// token
//   known_locations: location codes we try to recognise (the priority list)
//
// Returns: the Node, or a DecodeError explaining why the link was rejected.
// Nothing is logged or recorded here - the caller decides what to do.
pub fn decode_link(link: &str, known_locations: &[String]) -> Result<Node, DecodeError> {
    let mut node = match Scheme::detect(link) {
        Some(Scheme::Vmess) => vmess::decode(&link[Scheme::Vmess.prefix().len()..])?,
        Some(Scheme::Vless) => vless::decode(link)?,
        None => return Err(DecodeError::UnsupportedScheme),
    };

    // The scheme decoders only fill in a location when the link carries an
    // explicit parameter; everything else goes through the shared chain.
    if node.location.is_none() {
        node.location = location::resolve(&node, known_locations);
    }

    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known() -> Vec<String> {
        vec!["US".to_string(), "DE".to_string()]
    }

    #[test]
    fn test_detect_scheme() {
        assert_eq!(Scheme::detect("vmess://abc"), Some(Scheme::Vmess));
        assert_eq!(Scheme::detect("vless://id@h:1"), Some(Scheme::Vless));
        assert_eq!(Scheme::detect("trojan://pw@h:1"), None);
    }

    #[test]
    fn test_unsupported_scheme() {
        let result = decode_link("ss://abc@host:443", &known());
        assert_eq!(result, Err(DecodeError::UnsupportedScheme));
    }

    #[test]
    fn test_decode_is_idempotent() {
        let link = "vless://uuid-1@de1.example.net:443?security=tls&type=ws&path=%2Fws#Berlin";
        let first = decode_link(link, &known()).unwrap();
        let second = decode_link(link, &known()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.location.as_deref(), Some("DE"));
    }

    #[test]
    fn test_vmess_decode_is_idempotent() {
        use base64::{engine::general_purpose, Engine as _};

        let payload = serde_json::json!({
            "ps": "🇺🇸 Dallas",
            "add": "vm.example.net",
            "port": "443",
            "id": "uuid-2",
            "tls": "tls",
            "net": "ws",
            "path": "/vm",
            "host": "cdn.example.net",
            "aid": "0"
        });
        let link = format!(
            "vmess://{}",
            general_purpose::STANDARD.encode(payload.to_string())
        );

        let first = decode_link(&link, &known()).unwrap();
        let second = decode_link(&link, &known()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.scheme, Scheme::Vmess);
        assert_eq!(first.location.as_deref(), Some("US"));
        assert_eq!(first.transport.ws_options().map(|ws| ws.path.as_str()), Some("/vm"));
    }

    #[test]
    fn test_transport_from_network() {
        let ws = || WsOptions {
            path: "/".to_string(),
            host_header: String::new(),
        };
        assert_eq!(Transport::from_network(None, ws), Transport::Tcp);
        assert_eq!(Transport::from_network(Some("TCP"), ws), Transport::Tcp);
        assert!(matches!(
            Transport::from_network(Some("ws"), ws),
            Transport::WebSocket(_)
        ));
        assert_eq!(
            Transport::from_network(Some("grpc"), ws),
            Transport::Other("grpc".to_string())
        );
    }

    #[test]
    fn test_with_latency_sets_slot() {
        let node = decode_link("vless://id@1.2.3.4:8443", &known()).unwrap();
        assert_eq!(node.latency_seconds, None);
        let node = node.with_latency(0.25);
        assert_eq!(node.latency_seconds, Some(0.25));
    }
}
