// ABOUTME: Type-safe identifiers and validated naming types.
// ABOUTME: Uses phantom types to prevent ID confusion at compile time.

mod domain_name;
mod id;
mod subdomain;

pub use domain_name::{DomainName, DomainNameError};
pub use id::{DatabaseId, DeploymentId, JobId, ProjectId, RepositoryId, SiteId};
pub use subdomain::{Subdomain, SubdomainError};
