// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sidekick - adapter plugin runtime for browser chat sites.
//!
//! This is the binary entry point for the Sidekick runtime.

mod check;
mod runtime;
mod simulate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sidekick_config::SidekickConfig;
use sidekick_core::SidekickError;

/// Sidekick - adapter plugin runtime for browser chat sites.
#[derive(Parser, Debug)]
#[command(name = "sidekick", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate configuration and report diagnostics.
    Check,
    /// List built-in site adapters.
    Catalog {
        /// Filter by name, description, or host.
        query: Option<String>,
    },
    /// Print the resolved adapter config as JSON.
    Resolve {
        adapter: String,
        #[arg(long)]
        variant: Option<String>,
    },
    /// Run one tool completion through the runtime against a recorded page.
    Simulate {
        /// Hostname of the page the user is on.
        #[arg(long)]
        host: String,
        /// Tool result text to insert.
        #[arg(long)]
        result: String,
        /// Insert even when auto insert is off.
        #[arg(long)]
        skip_check: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => sidekick_config::load_and_validate_path(path),
        None => sidekick_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            sidekick_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.runtime.log_level);

    let outcome = match cli.command {
        Some(Commands::Check) => {
            let results = check::run_checks(&config).await;
            if check::print_results(&results) > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Commands::Catalog { query }) => {
            print_catalog(query.as_deref().unwrap_or_default());
            Ok(())
        }
        Some(Commands::Resolve { adapter, variant }) => {
            resolve_adapter(&config, &adapter, variant.as_deref()).await
        }
        Some(Commands::Simulate {
            host,
            result,
            skip_check,
        }) => simulate_completion(&config, &host, &result, skip_check).await,
        None => {
            println!("sidekick: use --help for available commands");
            Ok(())
        }
    };

    if let Err(err) = outcome {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn print_catalog(query: &str) {
    let entries = sidekick_plugin::search_catalog(query);
    if entries.is_empty() {
        println!("No site adapters match {query:?}.");
        return;
    }
    for entry in entries {
        println!(
            "  {:<12} {:<32} {}",
            entry.name(),
            entry.config.host_patterns.join(", "),
            entry.capabilities
        );
        if !entry.config.description.is_empty() {
            println!("  {:<12} {}", "", entry.config.description);
        }
    }
}

async fn resolve_adapter(
    config: &SidekickConfig,
    adapter: &str,
    variant: Option<&str>,
) -> Result<(), SidekickError> {
    if sidekick_plugin::catalog_entry(adapter).is_none() {
        tracing::warn!(adapter, "not a built-in site; showing generic defaults");
    }
    let bus = sidekick_bus::EventBus::new();
    let resolver =
        sidekick_config::AdapterConfigResolver::new(runtime::remote_source(config), &bus)
            .with_retry(config.retry.policy());
    let resolved = resolver.get_adapter_config(adapter, variant).await;
    print_json(&resolved)
}

async fn simulate_completion(
    config: &SidekickConfig,
    host: &str,
    result: &str,
    skip_check: bool,
) -> Result<(), SidekickError> {
    let report = simulate::run_simulation(config, host, result, skip_check).await?;
    print_json(&report)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), SidekickError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| SidekickError::Internal(format!("cannot serialize output: {e}")))?;
    println!("{json}");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
///
/// Logs go to stderr so JSON output on stdout stays parseable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sidekick={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_loads_config_defaults() {
        let config =
            sidekick_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.runtime.log_level, "info");
    }

    #[test]
    fn cli_parses_simulate_flags() {
        let cli = Cli::try_parse_from([
            "sidekick",
            "simulate",
            "--host",
            "chatgpt.com",
            "--result",
            "hello",
            "--skip-check",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Simulate {
                host, skip_check, ..
            }) => {
                assert_eq!(host, "chatgpt.com");
                assert!(skip_check);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_accepts_global_config_after_subcommand() {
        let cli =
            Cli::try_parse_from(["sidekick", "resolve", "gemini", "--config", "x.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
    }
}
