// src/node/vmess.rs
// =============================================================================
// Decodes vmess:// links.
//
// A vmess link is the prefix followed by a base64 encoded JSON object:
//
//   vmess://eyJ2IjoiMiIsInBzIjoiVVMgMSIsImFkZCI6IjEuMi4zLjQiLC4uLn0
//
// Decoded, the object looks like:
//   {"v":"2","ps":"US 1","add":"1.2.3.4","port":"443","id":"<uuid>",
//    "aid":"0","net":"ws","path":"/x","host":"h.example","tls":"tls"}
//
// Feeds are sloppy: padding is often stripped, numbers are sometimes strings
// and sometimes numbers, and some generators use the URL-safe alphabet. We
// accept all of those.
// =============================================================================

use base64::{engine::general_purpose, Engine as _};
use serde_json::{Map, Value};

use super::{DecodeError, Node, Scheme, Transport, WsOptions};

// Decodes the part of a vmess link after "vmess://"
pub fn decode(payload: &str) -> Result<Node, DecodeError> {
    let bytes = decode_base64(payload)?;

    let json: Value = serde_json::from_slice(&bytes)
        .map_err(|e| DecodeError::MalformedJson(e.to_string()))?;
    let object = json
        .as_object()
        .ok_or_else(|| DecodeError::MalformedJson("payload is not a JSON object".to_string()))?;

    // Required keys
    let label = string_field(object, "ps").ok_or(DecodeError::MissingField("ps"))?;
    let server = string_field(object, "add")
        .filter(|s| !s.is_empty())
        .ok_or(DecodeError::MissingField("add"))?;
    let port = string_field(object, "port")
        .and_then(|p| p.parse::<u16>().ok())
        .filter(|p| *p != 0)
        .ok_or(DecodeError::MissingField("port"))?;
    let identity = string_field(object, "id")
        .filter(|s| !s.is_empty())
        .ok_or(DecodeError::MissingField("id"))?;

    // Optional keys with defaults
    let tls = string_field(object, "tls").as_deref() == Some("tls");
    let transport = Transport::from_network(string_field(object, "net").as_deref(), || WsOptions {
        path: string_field(object, "path")
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "/".to_string()),
        host_header: string_field(object, "host").unwrap_or_default(),
    });
    let server_name = string_field(object, "sni")
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| server.clone());
    let alter_id = string_field(object, "aid")
        .and_then(|a| a.parse::<u16>().ok())
        .unwrap_or(0);

    Ok(Node {
        name: if label.is_empty() { server.clone() } else { label },
        scheme: Scheme::Vmess,
        server,
        port,
        identity,
        tls,
        transport,
        flow: None,
        server_name,
        location: None,
        cipher: Some("auto".to_string()),
        alter_id: Some(alter_id),
        latency_seconds: None,
    })
}

// Restores '=' padding and decodes the payload.
// Tries the standard alphabet first, then the URL-safe one.
fn decode_base64(payload: &str) -> Result<Vec<u8>, DecodeError> {
    let mut padded: String = payload.trim().trim_end_matches('=').to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }

    general_purpose::STANDARD
        .decode(&padded)
        .or_else(|_| general_purpose::URL_SAFE.decode(&padded))
        .map_err(|e| DecodeError::MalformedBase64(e.to_string()))
}

// Reads a key as a trimmed string, accepting JSON strings and numbers
fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // Builds a payload the way subscription feeds do: base64 without padding
    fn encode(value: &Value) -> String {
        general_purpose::STANDARD_NO_PAD.encode(value.to_string())
    }

    fn sample() -> Value {
        json!({
            "v": "2",
            "ps": "US 1",
            "add": "1.2.3.4",
            "port": "443",
            "id": "11111111-2222-3333-4444-555555555555",
            "aid": "0",
            "tls": "tls"
        })
    }

    #[test]
    fn test_decode_basic_fields() {
        let node = decode(&encode(&sample())).unwrap();
        assert_eq!(node.name, "US 1");
        assert_eq!(node.scheme, Scheme::Vmess);
        assert_eq!(node.server, "1.2.3.4");
        assert_eq!(node.port, 443);
        assert_eq!(node.identity, "11111111-2222-3333-4444-555555555555");
        assert!(node.tls);
        assert_eq!(node.cipher.as_deref(), Some("auto"));
        assert_eq!(node.alter_id, Some(0));
        assert_eq!(node.server_name, "1.2.3.4");
    }

    #[test]
    fn test_websocket_options() {
        let mut value = sample();
        value["net"] = json!("ws");
        value["path"] = json!("/x");
        value["host"] = json!("h.example");

        let node = decode(&encode(&value)).unwrap();
        assert_eq!(
            node.transport,
            Transport::WebSocket(WsOptions {
                path: "/x".to_string(),
                host_header: "h.example".to_string(),
            })
        );
    }

    #[test]
    fn test_no_network_means_tcp_without_options() {
        let node = decode(&encode(&sample())).unwrap();
        assert_eq!(node.transport, Transport::Tcp);
        assert!(node.transport.ws_options().is_none());
    }

    #[test]
    fn test_ws_defaults() {
        let mut value = sample();
        value["net"] = json!("ws");
        let node = decode(&encode(&value)).unwrap();
        let opts = node.transport.ws_options().unwrap();
        assert_eq!(opts.path, "/");
        assert_eq!(opts.host_header, "");
    }

    #[test]
    fn test_numeric_port_and_padding() {
        let mut value = sample();
        value["port"] = json!(8443);
        let padded = general_purpose::STANDARD.encode(value.to_string());
        let node = decode(&padded).unwrap();
        assert_eq!(node.port, 8443);
    }

    #[test]
    fn test_tls_only_for_literal_tls() {
        let mut value = sample();
        value["tls"] = json!("none");
        assert!(!decode(&encode(&value)).unwrap().tls);

        value["tls"] = json!("");
        assert!(!decode(&encode(&value)).unwrap().tls);
    }

    #[test]
    fn test_url_safe_alphabet() {
        let payload = general_purpose::URL_SAFE_NO_PAD.encode(sample().to_string());
        assert!(decode(&payload).is_ok());
    }

    #[test]
    fn test_malformed_base64() {
        let result = decode("!!!not base64!!!");
        assert!(matches!(result, Err(DecodeError::MalformedBase64(_))));
    }

    #[test]
    fn test_malformed_json() {
        let payload = general_purpose::STANDARD.encode("{not json");
        assert!(matches!(decode(&payload), Err(DecodeError::MalformedJson(_))));

        let payload = general_purpose::STANDARD.encode("[1, 2]");
        assert!(matches!(decode(&payload), Err(DecodeError::MalformedJson(_))));
    }

    #[test]
    fn test_missing_and_invalid_fields() {
        let mut value = sample();
        value.as_object_mut().unwrap().remove("id");
        assert_eq!(
            decode(&encode(&value)),
            Err(DecodeError::MissingField("id"))
        );

        let mut value = sample();
        value["port"] = json!("https");
        assert_eq!(
            decode(&encode(&value)),
            Err(DecodeError::MissingField("port"))
        );

        let mut value = sample();
        value["port"] = json!(0);
        assert_eq!(
            decode(&encode(&value)),
            Err(DecodeError::MissingField("port"))
        );
    }

    #[test]
    fn test_empty_label_falls_back_to_server() {
        let mut value = sample();
        value["ps"] = json!("");
        assert_eq!(decode(&encode(&value)).unwrap().name, "1.2.3.4");
    }
}
