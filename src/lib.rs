// ABOUTME: Library root for sitesmith - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod deployment;
pub mod diagnostics;
pub mod dns;
pub mod error;
pub mod output;
pub mod poll;
pub mod providers;
pub mod provision;
pub mod registry;
pub mod request;
pub mod site;
pub mod steps;
pub mod types;
