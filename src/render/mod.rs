// src/render/mod.rs
// =============================================================================
// Turns the ranked node list into the two config documents proxy clients
// read:
// - clash: Clash / Clash Meta YAML
// - singbox: sing-box JSON
//
// Renderers make no decisions about which nodes to include or in what
// order. They map fields, nothing more. The one exception is names: both
// clients key proxies by name, so repeated labels get a " #2", " #3" suffix.
// =============================================================================

mod clash;
mod singbox;

pub use clash::render_clash;
pub use singbox::render_singbox;

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::node::Node;

// Renders both documents and writes them to disk
//
// Parameters:
//   nodes: ranked nodes, best first
//   clash_path: where the YAML goes
//   singbox_path: where the JSON goes
pub async fn write_documents(nodes: &[Node], clash_path: &Path, singbox_path: &Path) -> Result<()> {
    let clash = render_clash(nodes).context("Failed to render Clash config")?;
    let singbox = render_singbox(nodes).context("Failed to render sing-box config")?;

    ensure_parent(clash_path).await?;
    ensure_parent(singbox_path).await?;

    tokio::fs::write(clash_path, clash)
        .await
        .with_context(|| format!("Failed to write {}", clash_path.display()))?;
    tokio::fs::write(singbox_path, singbox)
        .await
        .with_context(|| format!("Failed to write {}", singbox_path.display()))?;

    debug!(
        clash = %clash_path.display(),
        singbox = %singbox_path.display(),
        nodes = nodes.len(),
        "wrote config documents"
    );
    Ok(())
}

// Returns one name per node, in node order, with no repeats
//
// The first node with a given name keeps it. Later ones get " #2", " #3"
// and so on, skipping anything already taken or listed in `reserved`
// (the documents' own group and outbound names).
pub(crate) fn unique_names(nodes: &[Node], reserved: &[&str]) -> Vec<String> {
    let mut taken: HashSet<String> = reserved.iter().map(|r| r.to_string()).collect();
    let mut names = Vec::with_capacity(nodes.len());

    for node in nodes {
        let mut name = node.name.clone();
        let mut n = 2;
        while taken.contains(&name) {
            name = format!("{} #{}", node.name, n);
            n += 1;
        }
        taken.insert(name.clone());
        names.push(name);
    }
    names
}

// Creates the directory a file will be written into, if it has one
async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    Ok(())
}
