// src/render/clash.rs
// =============================================================================
// Builds the Clash YAML document from ranked nodes.
//
// This is a straight field-by-field projection. The only decisions made here
// are the fixed document skeleton (ports, groups, rules).
// =============================================================================

use std::collections::BTreeMap;

use serde::Serialize;

use super::unique_names;
use crate::node::Node;

const HEALTH_CHECK_URL: &str = "http://www.gstatic.com/generate_204";
const HEALTH_CHECK_INTERVAL_SECS: u32 = 300;

// Built-in Clash target, used so groups are never empty
const DIRECT: &str = "DIRECT";
const REJECT: &str = "REJECT";
const AUTO_GROUP: &str = "AUTO";
const BACKUP_GROUP: &str = "BACKUP";

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClashConfig {
    pub mixed_port: u16,
    pub allow_lan: bool,
    pub mode: String,
    pub log_level: String,
    pub proxies: Vec<ClashProxy>,
    pub proxy_groups: Vec<ProxyGroup>,
    pub rules: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ClashProxy {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub server: String,
    pub port: u16,
    pub uuid: String,
    #[serde(rename = "alterId", skip_serializing_if = "Option::is_none")]
    pub alter_id: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cipher: Option<String>,
    pub tls: bool,
    pub network: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,
    pub servername: String,
    #[serde(rename = "ws-opts", skip_serializing_if = "Option::is_none")]
    pub ws_opts: Option<ClashWsOpts>,
}

#[derive(Debug, Serialize)]
pub struct ClashWsOpts {
    pub path: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct ProxyGroup {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub proxies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
}

impl ClashProxy {
    /// Projects one node; `name` is the node's name after de-duplication
    fn from_node(node: &Node, name: String) -> Self {
        ClashProxy {
            name,
            kind: node.scheme.as_str(),
            server: node.server.clone(),
            port: node.port,
            uuid: node.identity.clone(),
            alter_id: node.alter_id,
            cipher: node.cipher.clone(),
            tls: node.tls,
            network: node.transport.network().to_string(),
            flow: node.flow.clone(),
            servername: node.server_name.clone(),
            ws_opts: node.transport.ws_options().map(|ws| ClashWsOpts {
                path: ws.path.clone(),
                headers: if ws.host_header.is_empty() {
                    BTreeMap::new()
                } else {
                    BTreeMap::from([("Host".to_string(), ws.host_header.clone())])
                },
            }),
        }
    }
}

/// Builds the Clash document; node order is preserved
pub fn build_clash_config(nodes: &[Node]) -> ClashConfig {
    let names = unique_names(nodes, &[DIRECT, REJECT, AUTO_GROUP, BACKUP_GROUP]);
    let proxies = nodes
        .iter()
        .zip(names.iter().cloned())
        .map(|(node, name)| ClashProxy::from_node(node, name))
        .collect();
    let auto_members = if names.is_empty() {
        vec![DIRECT.to_string()]
    } else {
        names.clone()
    };
    let mut backup_members = names;
    backup_members.push(DIRECT.to_string());

    ClashConfig {
        mixed_port: 7890,
        allow_lan: true,
        mode: "rule".to_string(),
        log_level: "info".to_string(),
        proxies,
        proxy_groups: vec![
            ProxyGroup {
                name: AUTO_GROUP.to_string(),
                kind: "fallback".to_string(),
                proxies: auto_members,
                url: Some(HEALTH_CHECK_URL.to_string()),
                interval: Some(HEALTH_CHECK_INTERVAL_SECS),
            },
            ProxyGroup {
                name: BACKUP_GROUP.to_string(),
                kind: "select".to_string(),
                proxies: backup_members,
                url: None,
                interval: None,
            },
        ],
        rules: vec![format!("MATCH,{AUTO_GROUP}")],
    }
}

/// Renders the Clash document as YAML text
pub fn render_clash(nodes: &[Node]) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(&build_clash_config(nodes))
}
