// src/node/error.rs
// =============================================================================
// Errors produced while decoding a single link into a Node.
//
// A DecodeError never stops the pipeline: the caller logs it, drops the
// offending link and moves on to the next one.
// =============================================================================

use thiserror::Error;

/// Why a link could not be turned into a Node.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The vmess payload is not valid base64 (even after padding is restored)
    #[error("malformed base64: {0}")]
    MalformedBase64(String),

    /// The decoded vmess payload is not a JSON object
    #[error("malformed json: {0}")]
    MalformedJson(String),

    /// The vless link is not a parseable URI
    #[error("malformed uri: {0}")]
    MalformedUri(String),

    /// A required field is absent, empty or out of range
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// The link starts with neither vmess:// nor vless://
    #[error("unsupported scheme")]
    UnsupportedScheme,
}

impl DecodeError {
    /// Short, stable name of the failure kind (used in diagnostics and JSON output)
    pub fn kind(&self) -> &'static str {
        match self {
            DecodeError::MalformedBase64(_) => "malformed-base64",
            DecodeError::MalformedJson(_) => "malformed-json",
            DecodeError::MalformedUri(_) => "malformed-uri",
            DecodeError::MissingField(_) => "missing-field",
            DecodeError::UnsupportedScheme => "unsupported-scheme",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(DecodeError::MissingField("port").kind(), "missing-field");
        assert_eq!(
            DecodeError::MalformedBase64("bad".to_string()).kind(),
            "malformed-base64"
        );
    }

    #[test]
    fn test_display_includes_reason() {
        let err = DecodeError::MissingField("identity");
        assert_eq!(err.to_string(), "missing field: identity");
    }
}
