// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sitesmith")]
#[command(about = "Provision a database, repository, deployment and subdomain for a site")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (default: discovered in the current directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new sitesmith.yml configuration file
    Init {
        /// Parent domain sites are provisioned under
        #[arg(short, long)]
        domain: Option<String>,

        /// Overwrite existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Provision a site from a request file
    Provision {
        /// Request YAML describing the site
        request: PathBuf,

        /// Emit JSON lines instead of human-readable output
        #[arg(long, conflicts_with = "quiet")]
        json: bool,

        /// Print only the final site URL
        #[arg(short, long)]
        quiet: bool,
    },

    /// Inspect or repair the domain's DNS records
    Dns {
        #[command(subcommand)]
        command: DnsCommand,
    },

    /// List provisioned sites
    Sites {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum DnsCommand {
    /// Show the record set that would be pushed, without pushing it
    Plan {
        /// Include a record for this subdomain as if it were being provisioned
        #[arg(short, long)]
        subdomain: Option<String>,

        /// Point the planned subdomain at this target instead of the template's
        #[arg(short, long, requires = "subdomain")]
        target: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Push the full record set rebuilt from the site registry
    Sync,
}
