// src/subscription/mod.rs
// =============================================================================
// This module handles the subscription feed itself.
//
// Submodules:
// - fetch: downloads the feed (or reads it from disk)
// - extract: finds the vmess:// / vless:// links inside the body
// =============================================================================

mod extract;
mod fetch;

pub use extract::{extract_links, normalize_body};
pub use fetch::load_subscription;
