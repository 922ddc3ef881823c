// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use gearscope_runtime::cli;
use gearscope_runtime::cli::lookup_cmd::LookupArgs;
use gearscope_runtime::config::RoutingStrategy;

#[derive(Parser)]
#[command(
    name = "gearscope",
    about = "Gearscope — find a vehicle's gearbox OEM number from its VIN or frame",
    version,
    after_help = "Configuration is read from GEARSCOPE_* environment variables; run 'gearscope doctor' to see it."
)]
struct Cli {
    /// Debug-level logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a VIN (or frame number) to gearbox model, code and OEM
    Lookup {
        /// VIN or frame number
        value: String,
        /// Treat VALUE as a frame number instead of a VIN
        #[arg(long)]
        frame: bool,
        /// Routing: auto, provider-a or provider-b
        #[arg(long)]
        strategy: Option<RoutingStrategy>,
        /// Show the browser window
        #[arg(long)]
        headed: bool,
        /// Attach a base64 screenshot to PARSE_FAILED evidence
        #[arg(long)]
        capture_failures: bool,
    },
    /// Render one page and print its final URL and visible text
    Fetch {
        /// Absolute URL to render
        url: String,
        /// Print the full snapshot (HTML included) as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check Chromium availability and print the effective configuration
    Doctor,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn init_tracing(verbose: bool, json: bool) {
    let default = if verbose { "gearscope_runtime=debug" } else { "gearscope_runtime=info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    let result = match cli.command {
        Commands::Lookup {
            value,
            frame,
            strategy,
            headed,
            capture_failures,
        } => {
            let args = LookupArgs {
                frame,
                strategy,
                headed,
                capture_failures,
            };
            cli::lookup_cmd::run(&value, &args).await
        }
        Commands::Fetch { url, json } => cli::fetch_cmd::run(&url, json).await,
        Commands::Doctor => cli::doctor::run().await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "gearscope", &mut std::io::stdout());
            Ok(())
        }
    };

    // 0=success, 1=error
    if let Err(e) = &result {
        eprintln!("  Error: {e:#}");
        std::process::exit(1);
    }

    result
}
