// src/config.rs
// =============================================================================
// Pipeline configuration.
//
// Every knob the pipeline reads lives in one PipelineConfig value that is
// passed down explicitly. There are no globals, so tests can build a config
// with probing switched off and run the whole pipeline without a network.
// =============================================================================

use std::time::Duration;

/// Location codes tried first, in order, when nothing else is configured
pub const DEFAULT_PRIORITY: [&str; 7] = ["US", "DE", "FI", "AT", "SE", "NL", "CH"];

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_PROBE_TIMEOUT_SECS: f64 = 3.0;
pub const DEFAULT_PROBE_CONCURRENCY: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Whole-request timeout for downloading the subscription
    pub fetch_timeout: Duration,
    /// Preferred location codes, best first (upper-case)
    pub priority: Vec<String>,
    /// When false, nodes are ranked by location bucket only
    pub probe_enabled: bool,
    /// Hard timeout for each TCP probe
    pub probe_timeout: Duration,
    /// How many probes may be in flight at once
    pub probe_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            priority: DEFAULT_PRIORITY.iter().map(|c| c.to_string()).collect(),
            probe_enabled: true,
            probe_timeout: Duration::from_secs_f64(DEFAULT_PROBE_TIMEOUT_SECS),
            probe_concurrency: DEFAULT_PROBE_CONCURRENCY,
        }
    }
}

impl PipelineConfig {
    /// Replaces the priority list, normalizing codes to trimmed upper-case
    /// and dropping empty entries.
    pub fn with_priority<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.priority = codes
            .into_iter()
            .map(|c| c.as_ref().trim().to_ascii_uppercase())
            .filter(|c| !c.is_empty())
            .collect();
        self
    }
}
