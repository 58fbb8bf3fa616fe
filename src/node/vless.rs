// src/node/vless.rs
// =============================================================================
// Decodes vless:// links.
//
// A vless link is an ordinary URI:
//
//   vless://<identity>@<server>:<port>?security=tls&type=ws&path=%2F#Name
//            ^^^^^^^^^^ ^^^^^^^^^^^^^  ^^^^^^^^^^^^^^^^^^^^^^^^^^^^ ^^^^
//            username   host + port    options                      label
//
// We let the `url` crate do the heavy lifting (authority, port range, query
// splitting and percent-decoding of query values).
// =============================================================================

use std::collections::HashMap;

use percent_encoding::percent_decode_str;
use url::Url;

use super::{DecodeError, Node, Scheme, Transport, WsOptions};

// Query parameters that name a location explicitly, checked in this order
const LOCATION_PARAMS: [&str; 3] = ["loc", "location", "country"];

// Decodes a full vless:// link
pub fn decode(link: &str) -> Result<Node, DecodeError> {
    // Url::parse rejects non-numeric and out-of-range ports for us
    let url = Url::parse(link).map_err(|e| DecodeError::MalformedUri(e.to_string()))?;

    let identity = percent_decode(url.username());
    if identity.is_empty() {
        return Err(DecodeError::MissingField("identity"));
    }

    let server = url
        .host_str()
        .map(|h| h.trim_start_matches('[').trim_end_matches(']').to_string())
        .filter(|h| !h.is_empty())
        .ok_or(DecodeError::MissingField("server"))?;

    let port = url
        .port()
        .filter(|p| *p != 0)
        .ok_or(DecodeError::MissingField("port"))?;

    // First value wins when a parameter is repeated
    let mut params: HashMap<String, String> = HashMap::new();
    for (key, value) in url.query_pairs() {
        params.entry(key.into_owned()).or_insert_with(|| value.into_owned());
    }
    let param = |key: &str| params.get(key).map(String::as_str).filter(|v| !v.is_empty());

    let tls = param("security").is_some_and(|s| s.eq_ignore_ascii_case("tls"));
    let transport = Transport::from_network(param("type"), || WsOptions {
        path: param("path").unwrap_or("/").to_string(),
        host_header: param("host").unwrap_or(&server).to_string(),
    });
    let server_name = param("sni")
        .or_else(|| param("host"))
        .unwrap_or(&server)
        .to_string();
    let flow = param("flow").map(str::to_string);
    let location = LOCATION_PARAMS
        .into_iter()
        .find_map(|key| param(key))
        .map(|code| code.trim().to_ascii_uppercase());

    let label = url.fragment().map(percent_decode).unwrap_or_default();
    let name = if label.trim().is_empty() {
        server.clone()
    } else {
        label.trim().to_string()
    };

    Ok(Node {
        name,
        scheme: Scheme::Vless,
        server,
        port,
        identity,
        tls,
        transport,
        flow,
        server_name,
        location,
        cipher: None,
        alter_id: None,
        latency_seconds: None,
    })
}

// Url leaves the fragment and username encoded, and labels are frequently
// emoji or other non-ASCII text. Invalid escapes are kept as-is.
fn percent_decode(input: &str) -> String {
    percent_decode_str(input).decode_utf8_lossy().into_owned()
}
