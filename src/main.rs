// ABOUTME: Entry point for the sitesmith CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands, DnsCommand};
use sitesmith::config::{self, Config};
use sitesmith::error::{Error, Result};
use sitesmith::output::{Output, OutputMode};
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbose flag
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let result = run(cli).await;

    if let Err(e) = result {
        // The provision command reports its own failures through Output
        if !matches!(e, Error::Provision(_)) {
            eprintln!("Error: {e}");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let cwd = env::current_dir()?;

    match cli.command {
        Commands::Init { domain, force } => {
            config::init_config(&cwd, domain.as_deref(), force)?;
            println!("Created {}", cwd.join(config::CONFIG_FILENAME).display());
            Ok(())
        }
        Commands::Provision {
            request,
            json,
            quiet,
        } => {
            let config = load_config(cli.config.as_deref(), &cwd)?;
            let output = Output::new(OutputMode::from_flags(json, quiet));
            commands::provision(config, &request, output).await
        }
        Commands::Dns { command } => {
            let config = load_config(cli.config.as_deref(), &cwd)?;
            match command {
                DnsCommand::Plan {
                    subdomain,
                    target,
                    json,
                } => {
                    let output = Output::new(OutputMode::from_flags(json, false));
                    commands::dns_plan(config, subdomain.as_deref(), target.as_deref(), output)
                        .await
                }
                DnsCommand::Sync => {
                    commands::dns_sync(config, Output::new(OutputMode::Normal)).await
                }
            }
        }
        Commands::Sites { json } => {
            let config = load_config(cli.config.as_deref(), &cwd)?;
            commands::list_sites(config, Output::new(OutputMode::from_flags(json, false))).await
        }
    }
}

fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<Config> {
    match explicit {
        Some(path) => Config::load(path),
        None => Config::discover(cwd),
    }
}
