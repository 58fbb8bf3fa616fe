// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (tracing) for diagnostics on stderr
// 3. Load the subscription and run the pipeline
// 4. Write the config files or print the ranked nodes
// 5. Exit with proper code (0 = success, 2 = error)
//
// An empty subscription, or one where every link is broken, is NOT an error:
// we still write (empty) config files so unattended runs behave the same
// every time.
//
// Rust concepts used:
// - async/await: Probing needs many network connections at once
// - Result<T, E>: For error handling (T = success type, E = error type)
// - match: Pattern matching to handle different subcommands
// =============================================================================

// Module declarations - tells Rust about our other source files
mod cli;          // src/cli.rs - command-line parsing
mod config;       // src/config.rs - pipeline settings
mod node;         // src/node/ - Node model and link decoders
mod pipeline;     // src/pipeline.rs - extract -> decode -> probe -> rank
mod probe;        // src/probe/ - TCP latency probing
mod rank;         // src/rank.rs - location/latency ordering
mod render;       // src/render/ - Clash and sing-box output
mod subscription; // src/subscription/ - fetching and link extraction

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser; // Parser trait enables the parse() method
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, PipelineArgs};
use pipeline::PipelineOutcome;
use probe::TcpProber;

// The #[tokio::main] attribute transforms our async main into a real main function
#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain: "Failed to load ...: HTTP 404"
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Update {
            pipeline,
            output_dir,
            clash_file,
            singbox_file,
        } => {
            let outcome = load_and_rank(&pipeline).await?;

            let clash_path = output_dir.join(clash_file);
            let singbox_path = output_dir.join(singbox_file);
            render::write_documents(&outcome.nodes, &clash_path, &singbox_path).await?;

            print_summary(&outcome);
            println!("✅ Wrote {}", clash_path.display());
            println!("✅ Wrote {}", singbox_path.display());
            Ok(0)
        }
        Commands::List { pipeline, json } => {
            let probe_timeout = pipeline.to_config().probe_timeout;
            let outcome = load_and_rank(&pipeline).await?;

            if json {
                let json_output = serde_json::to_string_pretty(&outcome)?;
                println!("{}", json_output);
            } else {
                print_table(&outcome, probe_timeout);
                print_summary(&outcome);
            }
            Ok(0)
        }
    }
}

// Sends tracing output to stderr so stdout stays clean for --json
//
// RUST_LOG wins if set; otherwise "info", or "debug" with --verbose
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// Fetches the subscription and runs the whole pipeline over it
async fn load_and_rank(args: &PipelineArgs) -> Result<PipelineOutcome> {
    let config = args.to_config();

    eprintln!("🔍 Loading subscription: {}", args.source);
    let body = subscription::load_subscription(&args.source, config.fetch_timeout)
        .await
        .with_context(|| format!("Failed to load subscription from {}", args.source))?;

    if config.probe_enabled {
        eprintln!(
            "🌐 Probing nodes (timeout {:.1}s, up to {} at once)...",
            config.probe_timeout.as_secs_f64(),
            config.probe_concurrency
        );
    }

    Ok(pipeline::run_pipeline(&body, &config, &TcpProber).await)
}

// Prints ranked nodes as a human-readable table
fn print_table(outcome: &PipelineOutcome, probe_timeout: Duration) {
    println!(
        "{:<4} {:<40} {:<6} {:<6} {:<28} {:<10}",
        "#", "NAME", "TYPE", "LOC", "SERVER", "LATENCY"
    );
    println!("{}", "=".repeat(98));

    for (index, node) in outcome.nodes.iter().enumerate() {
        let latency = match node.latency_seconds {
            None => "-".to_string(),
            Some(secs) if probe::is_reachable(secs, probe_timeout) => {
                format!("{:.0} ms", secs * 1000.0)
            }
            Some(_) => "❌ down".to_string(),
        };
        let server = format!("{}:{}", node.server, node.port);

        println!(
            "{:<4} {:<40} {:<6} {:<6} {:<28} {:<10}",
            index + 1,
            truncate(&node.name, 38),
            node.scheme.as_str(),
            node.location.as_deref().unwrap_or("-"),
            truncate(&server, 28),
            latency
        );
    }

    println!();
}

fn print_summary(outcome: &PipelineOutcome) {
    let probed = outcome
        .nodes
        .iter()
        .filter(|n| n.latency_seconds.is_some())
        .count();

    println!("📊 Summary:");
    println!("   🔗 Links found: {}", outcome.links_found);
    println!("   ✅ Nodes: {}", outcome.nodes.len());
    if probed > 0 {
        println!("   ⏱️  Probed: {}", probed);
    }
    println!("   ❌ Dropped: {}", outcome.dropped.len());

    for dropped in &outcome.dropped {
        println!("      {} ({})", truncate(&dropped.link, 60), dropped.reason);
    }
}

// Shortens a string to at most `max` characters (not bytes - names are often emoji)
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 6), "abc...");
        assert_eq!(truncate("🇺🇸🇺🇸🇺🇸🇺🇸", 5), "🇺🇸...");
    }
}
