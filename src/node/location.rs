// src/node/location.rs
// =============================================================================
// Works out which location (usually a country code) a node belongs to.
//
// Precedence, first hit wins:
// 1. Something the link states explicitly: a loc/location/country query
//    parameter (handled by the vless decoder), a flag emoji in the label,
//    or a label token that is exactly a known code ("DE", "us", ...)
// 2. A known code appearing anywhere in the server name
// 3. A known code appearing anywhere in the display name
//
// Matching is case-insensitive and the result is always upper-case.
// =============================================================================

use super::Node;

// Regional indicator symbols: U+1F1E6 is 'A', U+1F1FF is 'Z'
const REGIONAL_A: u32 = 0x1F1E6;
const REGIONAL_Z: u32 = 0x1F1FF;

/// Resolves tiers 1-3 for a node that has no explicit location parameter
pub fn resolve(node: &Node, known: &[String]) -> Option<String> {
    flag_code(&node.name)
        .or_else(|| exact_token(&node.name, known))
        .or_else(|| substring_match(&node.server, known))
        .or_else(|| substring_match(&node.name, known))
}

// Turns the first flag emoji (two regional indicators) into its code: 🇩🇪 -> "DE"
fn flag_code(label: &str) -> Option<String> {
    let letters: Vec<Option<char>> = label
        .chars()
        .map(|c| {
            let cp = c as u32;
            (REGIONAL_A..=REGIONAL_Z)
                .contains(&cp)
                .then(|| char::from(b'A' + (cp - REGIONAL_A) as u8))
        })
        .collect();

    letters.windows(2).find_map(|pair| match pair {
        [Some(a), Some(b)] => Some(format!("{a}{b}")),
        _ => None,
    })
}

// A label token (split on anything that isn't alphanumeric) equal to a known code
fn exact_token(label: &str, known: &[String]) -> Option<String> {
    label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .find_map(|token| known.iter().find(|code| code.eq_ignore_ascii_case(token)))
        .map(|code| code.to_ascii_uppercase())
}

// The first known code (in priority order) contained in `haystack`
fn substring_match(haystack: &str, known: &[String]) -> Option<String> {
    let haystack = haystack.to_lowercase();
    known
        .iter()
        .filter(|code| !code.is_empty())
        .find(|code| haystack.contains(&code.to_lowercase()))
        .map(|code| code.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Scheme, Transport};

    fn known() -> Vec<String> {
        ["US", "DE", "FI"].iter().map(|s| s.to_string()).collect()
    }

    fn node(name: &str, server: &str) -> Node {
        Node {
            name: name.to_string(),
            scheme: Scheme::Vless,
            server: server.to_string(),
            port: 443,
            identity: "id".to_string(),
            tls: false,
            transport: Transport::Tcp,
            flow: None,
            server_name: server.to_string(),
            location: None,
            cipher: None,
            alter_id: None,
            latency_seconds: None,
        }
    }

    #[test]
    fn test_flag_emoji_wins() {
        // server mentions "de" but the flag is explicit
        let n = node("🇫🇮 Helsinki", "de-relay.example");
        assert_eq!(resolve(&n, &known()), Some("FI".to_string()));
    }

    #[test]
    fn test_flag_not_in_known_list_still_counts() {
        let n = node("🇯🇵 Tokyo", "1.2.3.4");
        assert_eq!(resolve(&n, &known()), Some("JP".to_string()));
    }

    #[test]
    fn test_exact_token_beats_server() {
        let n = node("node-us-01", "de.example");
        assert_eq!(resolve(&n, &known()), Some("US".to_string()));
    }

    #[test]
    fn test_server_before_name() {
        let n = node("Finland fast", "de3.example.net");
        assert_eq!(resolve(&n, &known()), Some("DE".to_string()));
    }

    #[test]
    fn test_name_substring_last() {
        let n = node("Finland", "10.0.0.1");
        assert_eq!(resolve(&n, &known()), Some("FI".to_string()));
    }

    #[test]
    fn test_no_match() {
        let n = node("Tokyo", "10.0.0.1");
        assert_eq!(resolve(&n, &known()), None);
    }

    #[test]
    fn test_flag_code() {
        assert_eq!(flag_code("🇺🇸 New York"), Some("US".to_string()));
        assert_eq!(flag_code("plain"), None);
    }
}
