// ABOUTME: Command module aggregator for the sitesmith CLI.
// ABOUTME: Re-exports provision, dns, and sites command handlers.

mod dns;
mod provision;
mod sites;

pub use dns::{dns_plan, dns_sync};
pub use provision::provision;
pub use sites::list_sites;
