// src/subscription/extract.rs
// =============================================================================
// This module pulls candidate links out of raw subscription text.
//
// A subscription body is usually one link per line, mixed with comments,
// blank lines and the odd banner. We only care about tokens that start with
// a scheme we can decode. Whether the rest of the token makes sense is the
// decoder's problem, not ours.
//
// Some providers base64-encode the whole body. normalize_body() detects that
// case and hands back the decoded text.
//
// Rust concepts:
// - Iterators: extract_links is lazy, nothing is collected up front
// - impl Trait: we return "some iterator" without naming its type
// - Cow: borrow the input when no decoding is needed, own it otherwise
// =============================================================================

use std::borrow::Cow;

use base64::{engine::general_purpose, Engine as _};

use crate::node::Scheme;

// Extracts all vmess:// and vless:// tokens from a subscription body
//
// Parameters:
//   text: the raw subscription body (borrowed as &str)
//
// Returns: a lazy iterator over the links, in the order they appear.
// Duplicates are kept. The iterator is Clone, so it can be restarted by
// cloning it before consuming.
//
// Example input:
//   "# free nodes\nvless://id@host:443#A\n\nvmess://eyJ...\n"
//
// Example output:
//   ["vless://id@host:443#A", "vmess://eyJ..."]
pub fn extract_links(text: &str) -> impl Iterator<Item = &str> + Clone + '_ {
    // split_whitespace guarantees no token contains internal whitespace
    text.split_whitespace().filter(|token| is_candidate(token))
}

// A candidate starts with a known prefix and has something after it
fn is_candidate(token: &str) -> bool {
    Scheme::ALL
        .into_iter()
        .any(|scheme| token.len() > scheme.prefix().len() && token.starts_with(scheme.prefix()))
}

// Returns the text links should be extracted from
//
// If the body already contains links we use it as-is. Otherwise we try to
// read the whole body as base64 and use the decoded text if it contains
// links. If neither works the original text is returned and extraction will
// simply find nothing.
pub fn normalize_body(text: &str) -> Cow<'_, str> {
    if extract_links(text).next().is_some() {
        return Cow::Borrowed(text);
    }

    let mut compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Cow::Borrowed(text);
    }
    let trimmed_len = compact.trim_end_matches('=').len();
    compact.truncate(trimmed_len);
    while compact.len() % 4 != 0 {
        compact.push('=');
    }

    let decoded = general_purpose::STANDARD
        .decode(&compact)
        .or_else(|_| general_purpose::URL_SAFE.decode(&compact))
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok());

    match decoded {
        Some(decoded) if extract_links(&decoded).next().is_some() => Cow::Owned(decoded),
        _ => Cow::Borrowed(text),
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is Cow?
//    - "Clone on write": either a borrowed &str or an owned String
//    - Most bodies are plain text, so we hand back the borrow for free
//    - Only base64 bodies allocate a new String
//
// 2. Why is the iterator Clone?
//    - split_whitespace() and filter() are both Clone when their parts are
//    - Cloning an unconsumed iterator gives a fresh pass over the same text
// -----------------------------------------------------------------------------
