// ABOUTME: DNS host records and the duplicate-free record set for one domain.
// ABOUTME: A later record with the same host name replaces, never duplicates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::types::DomainName;

/// TTL used when a record does not specify one.
pub const DEFAULT_TTL: u32 = 1800;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("unsupported record type: {0}")]
    UnknownType(String),

    #[error("invalid record '{0}': expected '<host> <type> <address> [ttl]'")]
    Malformed(String),

    #[error("invalid TTL: {0}")]
    InvalidTtl(String),
}

/// Record types accepted by the registrar host API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    A,
    Aaaa,
    Cname,
    Txt,
    Mx,
    Alias,
    Url,
    Url301,
    Frame,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Txt => "TXT",
            RecordType::Mx => "MX",
            RecordType::Alias => "ALIAS",
            RecordType::Url => "URL",
            RecordType::Url301 => "URL301",
            RecordType::Frame => "FRAME",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            "CNAME" => Ok(RecordType::Cname),
            "TXT" => Ok(RecordType::Txt),
            "MX" => Ok(RecordType::Mx),
            "ALIAS" => Ok(RecordType::Alias),
            "URL" => Ok(RecordType::Url),
            "URL301" => Ok(RecordType::Url301),
            "FRAME" => Ok(RecordType::Frame),
            other => Err(RecordError::UnknownType(other.to_string())),
        }
    }
}

/// One host entry: `host_name` is relative to the domain (`@`, `www`, `acme`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    pub host_name: String,
    pub record_type: RecordType,
    pub address: String,
    pub ttl: u32,
    /// MX priority as the registrar reported it; unset for other types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mx_pref: Option<u16>,
}

impl DnsRecord {
    pub fn new(
        host_name: impl AsRef<str>,
        record_type: RecordType,
        address: impl Into<String>,
        ttl: u32,
    ) -> Self {
        Self {
            host_name: normalize_host(host_name.as_ref()),
            record_type,
            address: address.into(),
            ttl,
            mx_pref: None,
        }
    }

    pub fn with_mx_pref(mut self, pref: u16) -> Self {
        self.mx_pref = Some(pref);
        self
    }

    /// Parse the compact form `"<host> <type> <address> [ttl]"`.
    pub fn parse(spec: &str) -> Result<Self, RecordError> {
        let parts: Vec<&str> = spec.split_whitespace().collect();
        let (host, kind, address, ttl) = match parts.as_slice() {
            [host, kind, address] => (*host, *kind, *address, DEFAULT_TTL),
            [host, kind, address, ttl] => {
                let ttl = ttl
                    .parse::<u32>()
                    .map_err(|_| RecordError::InvalidTtl((*ttl).to_string()))?;
                (*host, *kind, *address, ttl)
            }
            _ => return Err(RecordError::Malformed(spec.to_string())),
        };

        Ok(Self::new(host, kind.parse()?, address, ttl))
    }

    /// True when both records name the same host (case-insensitive).
    pub fn same_host(&self, other: &str) -> bool {
        self.host_name.eq_ignore_ascii_case(other.trim())
    }
}

impl fmt::Display for DnsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.host_name, self.record_type, self.address, self.ttl
        )
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim();
    if host.is_empty() {
        "@".to_string()
    } else {
        host.to_ascii_lowercase()
    }
}

/// What `DnsRecordSet::upsert` did with the incoming record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    /// Carries the record that was replaced.
    Replaced(DnsRecord),
}

/// The complete desired host set for a domain.
///
/// Host names are unique: the only ways to add records are `upsert`, which
/// replaces in place, and `supplement`, which skips known hosts. Order is
/// insertion order, so the indexed wire form is stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsRecordSet {
    domain: DomainName,
    records: Vec<DnsRecord>,
}

impl DnsRecordSet {
    pub fn new(domain: DomainName) -> Self {
        Self {
            domain,
            records: Vec::new(),
        }
    }

    pub fn domain(&self) -> &DomainName {
        &self.domain
    }

    pub fn upsert(&mut self, record: DnsRecord) -> Upsert {
        match self
            .records
            .iter_mut()
            .find(|existing| existing.same_host(&record.host_name))
        {
            Some(existing) => Upsert::Replaced(std::mem::replace(existing, record)),
            None => {
                self.records.push(record);
                Upsert::Inserted
            }
        }
    }

    /// Append only if no record for the host exists. Returns whether it was added.
    pub fn supplement(&mut self, record: DnsRecord) -> bool {
        if self.contains(&record.host_name) {
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn get(&self, host_name: &str) -> Option<&DnsRecord> {
        self.records.iter().find(|r| r.same_host(host_name))
    }

    pub fn contains(&self, host_name: &str) -> bool {
        self.get(host_name).is_some()
    }

    pub fn records(&self) -> &[DnsRecord] {
        &self.records
    }

    pub fn host_names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.host_name.as_str())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a DnsRecordSet {
    type Item = &'a DnsRecord;
    type IntoIter = std::slice::Iter<'a, DnsRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain() -> DomainName {
        DomainName::parse("example.com").unwrap()
    }

    #[test]
    fn record_type_parses_case_insensitively() {
        assert_eq!("cname".parse::<RecordType>().unwrap(), RecordType::Cname);
        assert_eq!("Url301".parse::<RecordType>().unwrap(), RecordType::Url301);
        assert!("SRV".parse::<RecordType>().is_err());
    }

    #[test]
    fn parse_compact_record() {
        let record = DnsRecord::parse("WWW CNAME cname.vercel-dns.com 300").unwrap();
        assert_eq!(record.host_name, "www");
        assert_eq!(record.record_type, RecordType::Cname);
        assert_eq!(record.address, "cname.vercel-dns.com");
        assert_eq!(record.ttl, 300);

        let record = DnsRecord::parse("@ A 76.76.21.21").unwrap();
        assert_eq!(record.ttl, DEFAULT_TTL);

        assert!(matches!(
            DnsRecord::parse("@ A"),
            Err(RecordError::Malformed(_))
        ));
        assert!(matches!(
            DnsRecord::parse("@ A 1.2.3.4 soon"),
            Err(RecordError::InvalidTtl(_))
        ));
    }

    #[test]
    fn empty_host_normalizes_to_apex() {
        let record = DnsRecord::new("", RecordType::A, "1.2.3.4", 60);
        assert_eq!(record.host_name, "@");
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut set = DnsRecordSet::new(domain());
        set.upsert(DnsRecord::new("@", RecordType::A, "1.1.1.1", 60));
        set.upsert(DnsRecord::new("acme", RecordType::Cname, "old.target", 60));
        set.upsert(DnsRecord::new("www", RecordType::Cname, "web.target", 60));

        let outcome = set.upsert(DnsRecord::new("ACME", RecordType::Cname, "new.target", 300));

        assert!(matches!(outcome, Upsert::Replaced(ref old) if old.address == "old.target"));
        assert_eq!(set.len(), 3);
        assert_eq!(set.records()[1].address, "new.target");
        assert_eq!(set.host_names().collect::<Vec<_>>(), vec!["@", "acme", "www"]);
    }

    #[test]
    fn supplement_never_overrides() {
        let mut set = DnsRecordSet::new(domain());
        set.upsert(DnsRecord::new("www", RecordType::Cname, "ours", 60));

        assert!(!set.supplement(DnsRecord::new("www", RecordType::A, "theirs", 60)));
        assert!(set.supplement(DnsRecord::new("mail", RecordType::Mx, "mx.host", 60)));
        assert_eq!(set.get("www").unwrap().address, "ours");
        assert_eq!(set.len(), 2);
    }
}
