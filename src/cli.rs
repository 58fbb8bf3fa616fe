// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Two subcommands share the same pipeline options:
// - update: fetch, rank and write clash.yaml + singbox.json
// - list:   fetch, rank and print the result (table or JSON)
//
// Rust concepts:
// - Structs: Custom data types that group related data
// - Enums: Types that can be one of several variants
// - #[command(flatten)]: Reuse one Args struct in several subcommands
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::config::{
    PipelineConfig, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_PRIORITY, DEFAULT_PROBE_CONCURRENCY,
    DEFAULT_PROBE_TIMEOUT_SECS,
};

// This struct represents our entire CLI application
#[derive(Parser, Debug)]
#[command(
    name = "proxy-ranker",
    version = "0.1.0",
    about = "Turn a vmess/vless subscription into ranked Clash and sing-box configs",
    long_about = "proxy-ranker downloads a subscription feed, decodes every vmess:// and vless:// link, \
                  measures TCP latency to each node and orders them by preferred location, then \
                  writes Clash and sing-box configuration files."
)]
pub struct Cli {
    /// Log debug details (dropped links, probe results) to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a subscription and write clash.yaml and singbox.json
    ///
    /// Example: proxy-ranker update https://example.com/sub.txt --output-dir ./out
    Update {
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Directory the config files are written to
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// File name of the Clash config
        #[arg(long, default_value = "clash.yaml")]
        clash_file: String,

        /// File name of the sing-box config
        #[arg(long, default_value = "singbox.json")]
        singbox_file: String,
    },

    /// Fetch a subscription and print the ranked nodes
    ///
    /// Example: proxy-ranker list ./sub.txt --no-probe
    List {
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Output results in JSON format instead of a table
        #[arg(long)]
        json: bool,
    },
}

/// Options shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Subscription URL (http/https) or path to a local file
    pub source: String,

    /// Preferred location codes, best first (comma separated)
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_PRIORITY.map(String::from))]
    pub countries: Vec<String>,

    /// Timeout for downloading the subscription, in seconds
    #[arg(long, default_value_t = DEFAULT_FETCH_TIMEOUT_SECS)]
    pub fetch_timeout: u64,

    /// Timeout for each TCP probe, in seconds (fractions allowed)
    #[arg(long, default_value_t = DEFAULT_PROBE_TIMEOUT_SECS)]
    pub probe_timeout: f64,

    /// Skip latency probing and rank by location only
    #[arg(long)]
    pub no_probe: bool,

    /// Maximum number of probes running at once
    #[arg(long, default_value_t = DEFAULT_PROBE_CONCURRENCY)]
    pub concurrency: usize,
}

impl PipelineArgs {
    /// Builds the pipeline configuration from the parsed flags
    pub fn to_config(&self) -> PipelineConfig {
        PipelineConfig {
            fetch_timeout: Duration::from_secs(self.fetch_timeout),
            probe_enabled: !self.no_probe,
            // Negative or NaN input falls back to the default
            probe_timeout: Duration::try_from_secs_f64(self.probe_timeout)
                .unwrap_or_else(|_| Duration::from_secs_f64(DEFAULT_PROBE_TIMEOUT_SECS)),
            probe_concurrency: self.concurrency.max(1),
            ..PipelineConfig::default()
        }
        .with_priority(&self.countries)
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What does #[command(flatten)] do?
//    - It inlines the fields of another Args struct into this subcommand
//    - Both `update` and `list` get --countries, --no-probe, etc.
//    - We only define (and document) those flags once
//
// 2. What is value_delimiter?
//    - --countries US,DE,FI becomes vec!["US", "DE", "FI"]
//
// 3. Why convert to PipelineConfig?
//    - The CLI deals in strings and numbers a human can type
//    - The pipeline wants Durations and normalized codes
//    - Keeping the two apart means the pipeline never depends on clap
// -----------------------------------------------------------------------------
