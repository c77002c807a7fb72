// ABOUTME: Registrar XML API encoding: indexed host parameters and response parsing.
// ABOUTME: A record set is sent as HostName{n}/RecordType{n}/Address{n}/TTL{n}, 1-based.

use serde::Deserialize;

use super::record::{DEFAULT_TTL, DnsRecord, DnsRecordSet, RecordType};

/// Preference sent for MX records that carry no priority of their own.
const DEFAULT_MX_PREF: u16 = 10;

/// Encode the full record set as `setHosts` parameters.
pub fn host_params(set: &DnsRecordSet) -> Vec<(String, String)> {
    let mut params = Vec::with_capacity(set.len() * 4 + 1);
    let mut has_mx = false;

    for (i, record) in set.records().iter().enumerate() {
        let idx = i + 1;
        params.push((format!("HostName{idx}"), record.host_name.clone()));
        params.push((
            format!("RecordType{idx}"),
            record.record_type.as_str().to_string(),
        ));
        params.push((format!("Address{idx}"), record.address.clone()));
        params.push((format!("TTL{idx}"), record.ttl.to_string()));

        if record.record_type == RecordType::Mx {
            let pref = record.mx_pref.unwrap_or(DEFAULT_MX_PREF);
            params.push((format!("MXPref{idx}"), pref.to_string()));
            has_mx = true;
        }
    }

    if has_mx {
        params.push(("EmailType".to_string(), "MX".to_string()));
    }

    params
}

/// One `<Error Number="...">text</Error>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiErrorEntry {
    pub code: String,
    pub description: String,
}

/// The parts of an API response the client acts on.
#[derive(Debug, Clone, Default)]
pub struct ApiResponse {
    pub ok: bool,
    pub errors: Vec<ApiErrorEntry>,
    /// Records from a `getHosts` result; empty for other commands.
    pub hosts: Vec<DnsRecord>,
    /// `IsSuccess` from a `setHosts` result, when present.
    pub set_hosts_success: Option<bool>,
}

impl ApiResponse {
    /// First reported error, or a synthetic one when the status is not OK
    /// but no error entries were sent.
    pub fn first_error(&self) -> Option<ApiErrorEntry> {
        if self.ok && self.errors.is_empty() {
            return None;
        }
        Some(self.errors.first().cloned().unwrap_or(ApiErrorEntry {
            code: "unknown".to_string(),
            description: "request failed without an error description".to_string(),
        }))
    }
}

pub fn parse_response(xml: &str) -> Result<ApiResponse, quick_xml::DeError> {
    let parsed: ApiResponseXml = quick_xml::de::from_str(xml)?;

    let errors = parsed
        .errors
        .map(|e| e.error)
        .unwrap_or_default()
        .into_iter()
        .map(|e| ApiErrorEntry {
            code: e.number,
            description: e.text.trim().to_string(),
        })
        .collect();

    let (hosts, set_hosts_success) = match parsed.command_response {
        Some(command) => (
            command
                .get_hosts
                .map(|result| result.hosts)
                .unwrap_or_default()
                .into_iter()
                .filter_map(HostXml::into_record)
                .collect(),
            command
                .set_hosts
                .map(|result| result.is_success.eq_ignore_ascii_case("true")),
        ),
        None => (Vec::new(), None),
    };

    Ok(ApiResponse {
        ok: parsed.status.eq_ignore_ascii_case("OK"),
        errors,
        hosts,
        set_hosts_success,
    })
}

#[derive(Debug, Deserialize)]
struct ApiResponseXml {
    #[serde(rename = "@Status")]
    status: String,
    #[serde(rename = "Errors", default)]
    errors: Option<ErrorsXml>,
    #[serde(rename = "CommandResponse", default)]
    command_response: Option<CommandResponseXml>,
}

#[derive(Debug, Deserialize)]
struct ErrorsXml {
    #[serde(rename = "Error", default)]
    error: Vec<ErrorXml>,
}

#[derive(Debug, Deserialize)]
struct ErrorXml {
    #[serde(rename = "@Number", default)]
    number: String,
    #[serde(rename = "$text", default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct CommandResponseXml {
    #[serde(rename = "DomainDNSGetHostsResult", default)]
    get_hosts: Option<GetHostsXml>,
    #[serde(rename = "DomainDNSSetHostsResult", default)]
    set_hosts: Option<SetHostsXml>,
}

#[derive(Debug, Deserialize)]
struct GetHostsXml {
    #[serde(rename = "host", alias = "Host", default)]
    hosts: Vec<HostXml>,
}

#[derive(Debug, Deserialize)]
struct SetHostsXml {
    #[serde(rename = "@IsSuccess", default)]
    is_success: String,
}

#[derive(Debug, Deserialize)]
struct HostXml {
    #[serde(rename = "@Name")]
    name: String,
    #[serde(rename = "@Type")]
    record_type: String,
    #[serde(rename = "@Address")]
    address: String,
    #[serde(rename = "@TTL", default)]
    ttl: Option<String>,
    #[serde(rename = "@MXPref", default)]
    mx_pref: Option<String>,
}

impl HostXml {
    fn into_record(self) -> Option<DnsRecord> {
        let record_type = match self.record_type.parse::<RecordType>() {
            Ok(t) => t,
            Err(e) => {
                tracing::debug!(host = %self.name, "skipping live record: {e}");
                return None;
            }
        };
        let ttl = self
            .ttl
            .and_then(|t| t.trim().parse().ok())
            .unwrap_or(DEFAULT_TTL);
        let record = DnsRecord::new(&self.name, record_type, self.address, ttl);
        let pref = self.mx_pref.and_then(|p| p.trim().parse().ok());
        Some(match pref {
            Some(pref) if record_type == RecordType::Mx => record.with_mx_pref(pref),
            _ => record,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DomainName;

    #[test]
    fn host_params_are_one_based_and_complete() {
        let mut set = DnsRecordSet::new(DomainName::parse("example.com").unwrap());
        set.upsert(DnsRecord::new("@", RecordType::A, "76.76.21.21", 1800));
        set.upsert(DnsRecord::new("mail", RecordType::Mx, "mx.example.net", 1800));

        let params = host_params(&set);
        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("HostName1"), Some("@"));
        assert_eq!(get("RecordType1"), Some("A"));
        assert_eq!(get("Address1"), Some("76.76.21.21"));
        assert_eq!(get("TTL1"), Some("1800"));
        assert_eq!(get("HostName2"), Some("mail"));
        assert_eq!(get("MXPref2"), Some("10"));
        assert_eq!(get("EmailType"), Some("MX"));
        assert_eq!(get("HostName0"), None);
        assert_eq!(get("HostName3"), None);
    }

    #[test]
    fn parses_get_hosts_result() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
            <ApiResponse Status="OK" xmlns="http://api.namecheap.com/xml.response">
              <Errors />
              <RequestedCommand>namecheap.domains.dns.getHosts</RequestedCommand>
              <CommandResponse Type="namecheap.domains.dns.getHosts">
                <DomainDNSGetHostsResult Domain="example.com" IsUsingOurDNS="true">
                  <host HostId="1" Name="@" Type="A" Address="76.76.21.21" MXPref="10" TTL="1800" />
                  <host HostId="2" Name="www" Type="CNAME" Address="cname.vercel-dns.com." MXPref="10" TTL="1800" />
                  <host HostId="3" Name="_dmarc" Type="CAA" Address="0 issue letsencrypt.org" MXPref="10" TTL="1800" />
                </DomainDNSGetHostsResult>
              </CommandResponse>
            </ApiResponse>"#;

        let response = parse_response(xml).unwrap();
        assert!(response.ok);
        assert!(response.first_error().is_none());
        assert_eq!(response.hosts.len(), 2);
        assert_eq!(response.hosts[1].host_name, "www");
        assert_eq!(response.hosts[1].record_type, RecordType::Cname);
    }

    #[test]
    fn live_mx_priority_survives_a_round_trip() {
        let xml = r#"<ApiResponse Status="OK">
              <CommandResponse Type="namecheap.domains.dns.getHosts">
                <DomainDNSGetHostsResult Domain="example.com">
                  <host Name="@" Type="A" Address="76.76.21.21" MXPref="10" TTL="1800" />
                  <host Name="mail" Type="MX" Address="mx1.example.net" MXPref="5" TTL="3600" />
                  <host Name="backup" Type="MX" Address="mx2.example.net" MXPref="20" TTL="3600" />
                </DomainDNSGetHostsResult>
              </CommandResponse>
            </ApiResponse>"#;

        let hosts = parse_response(xml).unwrap().hosts;
        assert_eq!(hosts[0].mx_pref, None);
        assert_eq!(hosts[1].mx_pref, Some(5));
        assert_eq!(hosts[2].mx_pref, Some(20));

        let mut set = DnsRecordSet::new(DomainName::parse("example.com").unwrap());
        for host in hosts {
            set.upsert(host);
        }
        let params = host_params(&set);
        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("MXPref1"), None);
        assert_eq!(get("MXPref2"), Some("5"));
        assert_eq!(get("MXPref3"), Some("20"));
    }

    #[test]
    fn parses_error_entries() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
            <ApiResponse Status="ERROR">
              <Errors>
                <Error Number="2019166">Domain not found</Error>
              </Errors>
            </ApiResponse>"#;

        let response = parse_response(xml).unwrap();
        assert!(!response.ok);
        assert_eq!(
            response.first_error(),
            Some(ApiErrorEntry {
                code: "2019166".to_string(),
                description: "Domain not found".to_string(),
            })
        );
    }

    #[test]
    fn parses_set_hosts_result() {
        let xml = r#"<ApiResponse Status="OK">
              <Errors />
              <CommandResponse Type="namecheap.domains.dns.setHosts">
                <DomainDNSSetHostsResult Domain="example.com" IsSuccess="true" />
              </CommandResponse>
            </ApiResponse>"#;

        let response = parse_response(xml).unwrap();
        assert_eq!(response.set_hosts_success, Some(true));
    }
}
