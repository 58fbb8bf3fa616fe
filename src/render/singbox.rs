// src/render/singbox.rs
// =============================================================================
// Builds the sing-box JSON document from ranked nodes.
//
// One outbound per node, then a "urltest" outbound over all of them and a
// "direct" outbound. Optional fields are left out rather than set to null.
// =============================================================================

use std::collections::BTreeMap;

use serde::Serialize;

use super::unique_names;
use crate::node::{Node, Scheme, Transport};

const AUTO_TAG: &str = "auto";
const DIRECT_TAG: &str = "direct";
const URLTEST_URL: &str = "http://www.gstatic.com/generate_204";

// V2Ray transport types sing-box understands; "h2" is spelled "http" there
const SINGBOX_TRANSPORTS: [(&str, &str); 5] = [
    ("grpc", "grpc"),
    ("h2", "http"),
    ("http", "http"),
    ("quic", "quic"),
    ("httpupgrade", "httpupgrade"),
];

#[derive(Debug, Serialize)]
pub struct SingboxConfig {
    pub outbounds: Vec<Outbound>,
}

/// A sing-box outbound. `type` decides which other fields apply.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Outbound {
    Vmess(ProxyOutbound),
    Vless(ProxyOutbound),
    Urltest {
        tag: String,
        outbounds: Vec<String>,
        url: String,
    },
    Direct {
        tag: String,
    },
}

#[derive(Debug, Serialize)]
pub struct ProxyOutbound {
    pub tag: String,
    pub server: String,
    pub server_port: u16,
    pub uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alter_id: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport: Option<TransportOptions>,
}

#[derive(Debug, Serialize)]
pub struct TlsOptions {
    pub enabled: bool,
    pub server_name: String,
}

#[derive(Debug, Serialize)]
pub struct TransportOptions {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl TransportOptions {
    // Plain TCP has no transport block. Names sing-box would reject are
    // left out too, so the document still loads.
    fn from_transport(transport: &Transport) -> Option<TransportOptions> {
        match transport {
            Transport::Tcp => None,
            Transport::WebSocket(ws) => Some(TransportOptions {
                kind: "ws".to_string(),
                path: Some(ws.path.clone()),
                headers: if ws.host_header.is_empty() {
                    BTreeMap::new()
                } else {
                    BTreeMap::from([("Host".to_string(), ws.host_header.clone())])
                },
            }),
            Transport::Other(name) => SINGBOX_TRANSPORTS
                .iter()
                .find(|(link_name, _)| link_name.eq_ignore_ascii_case(name))
                .map(|(_, kind)| TransportOptions {
                    kind: kind.to_string(),
                    path: None,
                    headers: BTreeMap::new(),
                }),
        }
    }
}

impl Outbound {
    /// Projects one node; `tag` is the node's name after de-duplication
    fn from_node(node: &Node, tag: String) -> Self {
        let proxy = ProxyOutbound {
            tag,
            server: node.server.clone(),
            server_port: node.port,
            uuid: node.identity.clone(),
            flow: node.flow.clone(),
            security: node.cipher.clone(),
            alter_id: node.alter_id,
            tls: node.tls.then(|| TlsOptions {
                enabled: true,
                server_name: node.server_name.clone(),
            }),
            transport: TransportOptions::from_transport(&node.transport),
        };

        match node.scheme {
            Scheme::Vmess => Outbound::Vmess(proxy),
            Scheme::Vless => Outbound::Vless(proxy),
        }
    }
}

/// Builds the sing-box document; node order is preserved
pub fn build_singbox_config(nodes: &[Node]) -> SingboxConfig {
    let tags = unique_names(nodes, &[AUTO_TAG, DIRECT_TAG]);
    let mut outbounds: Vec<Outbound> = nodes
        .iter()
        .zip(tags.iter().cloned())
        .map(|(node, tag)| Outbound::from_node(node, tag))
        .collect();

    if !nodes.is_empty() {
        outbounds.push(Outbound::Urltest {
            tag: AUTO_TAG.to_string(),
            outbounds: tags,
            url: URLTEST_URL.to_string(),
        });
    }
    outbounds.push(Outbound::Direct {
        tag: DIRECT_TAG.to_string(),
    });

    SingboxConfig { outbounds }
}

/// Renders the sing-box document as pretty-printed JSON
pub fn render_singbox(nodes: &[Node]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&build_singbox_config(nodes))
}
