// ABOUTME: Config scaffolding for new installations.
// ABOUTME: Creates sitesmith.yml template files.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::DomainName;

use super::CONFIG_FILENAME;

pub fn init_config(dir: &Path, domain: Option<&str>, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let domain = match domain {
        Some(d) => DomainName::parse(d).map_err(|e| Error::InvalidConfig(e.to_string()))?,
        None => DomainName::parse("example.com").map_err(|e| Error::InvalidConfig(e.to_string()))?,
    };

    std::fs::write(&config_path, generate_template_yaml(&domain))?;

    Ok(())
}

fn generate_template_yaml(domain: &DomainName) -> String {
    format!(
        r#"domain: {domain}

dns:
  api_user: my-registrar-user
  api_key: {{ env: NAMECHEAP_API_KEY }}
  # client_ip: 203.0.113.10
  default_records:
    - "@ A 76.76.21.21 1800"
    - "www CNAME cname.vercel-dns.com 1800"
  subdomain_record:
    type: CNAME
    address: cname.vercel-dns.com
    ttl: 300

repository:
  owner: my-org
  organization: true
  token: {{ env: GITHUB_TOKEN }}

deployment:
  token: {{ env: VERCEL_TOKEN }}
  # team_id: team_123

database:
  access_token: {{ env: SUPABASE_ACCESS_TOKEN }}
  organization_id: my-org-id
  db_password: {{ env: SUPABASE_DB_PASSWORD }}

template:
  path: template

# notifications:
#   webhook_url: https://hooks.example.com/sites
"#
    )
}
