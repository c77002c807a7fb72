// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Handles compact and detailed DNS record entries.

use nonempty::NonEmpty;
use serde::Deserialize;

use crate::dns::{DEFAULT_TTL, DnsRecord, RecordType};

pub fn deserialize_default_records<'de, D>(deserializer: D) -> Result<NonEmpty<DnsRecord>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<RecordEntry> = Vec::deserialize(deserializer)?;
    let records = values
        .into_iter()
        .map(RecordEntry::into_record)
        .collect::<Result<Vec<_>, _>>()
        .map_err(serde::de::Error::custom)?;

    NonEmpty::from_vec(records)
        .ok_or_else(|| serde::de::Error::custom("at least one default record is required"))
}

/// Either `"www CNAME cname.vercel-dns.com 1800"` or a mapping.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordEntry {
    Compact(String),
    Detailed(RecordSpec),
}

#[derive(Debug, Deserialize)]
struct RecordSpec {
    host: String,
    #[serde(rename = "type")]
    record_type: RecordType,
    address: String,
    #[serde(default = "default_ttl")]
    ttl: u32,
}

fn default_ttl() -> u32 {
    DEFAULT_TTL
}

impl RecordEntry {
    fn into_record(self) -> Result<DnsRecord, String> {
        match self {
            RecordEntry::Compact(s) => DnsRecord::parse(&s).map_err(|e| e.to_string()),
            RecordEntry::Detailed(spec) => Ok(DnsRecord::new(
                &spec.host,
                spec.record_type,
                spec.address,
                spec.ttl,
            )),
        }
    }
}
