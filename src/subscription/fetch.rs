// src/subscription/fetch.rs
// =============================================================================
// This module loads the raw subscription body.
//
// The source can be:
// - an http:// or https:// URL, downloaded with reqwest
// - a path to a local file (handy for testing and offline use)
//
// A failure here is fatal for the whole run: without a body there is nothing
// to rank. We do not retry.
//
// Rust concepts:
// - async functions: For network and file I/O
// - thiserror: To build a typed error enum with Display for free
// - #[from]: Lets the ? operator convert library errors automatically
// =============================================================================

use std::time::Duration;

use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;

/// Why the subscription body could not be loaded
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level failure (DNS, connect, timeout, TLS, ...)
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered, but not with 2xx
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },

    /// Reading a local subscription file failed
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// Loads a subscription body from a URL or a local file
//
// Parameters:
//   source: URL or file path
//   timeout: whole-request timeout for the HTTP case
//
// Returns: the body as a String
pub async fn load_subscription(source: &str, timeout: Duration) -> Result<String, FetchError> {
    if is_remote(source) {
        let client = Client::builder().timeout(timeout).build()?;
        fetch_text(&client, source).await
    } else {
        debug!(path = source, "reading subscription from file");
        tokio::fs::read_to_string(source)
            .await
            .map_err(|source_err| FetchError::Io {
                path: source.to_string(),
                source: source_err,
            })
    }
}

// Fetches content from a URL
async fn fetch_text(client: &Client, url: &str) -> Result<String, FetchError> {
    debug!(url, "downloading subscription");
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: response.status(),
        });
    }

    let body = response.text().await?;
    debug!(bytes = body.len(), "subscription downloaded");
    Ok(body)
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}
