//! Generic, provider-agnostic record model exchanged with external-dns.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("unsupported record type '{0}'")]
    UnsupportedRecordType(String),
}

/// Record types the zone API accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    A,
    Aaaa,
    Caa,
    Cname,
    Dname,
    Loc,
    Mx,
    Naptr,
    Ns,
    Ptr,
    Rp,
    Srv,
    Sshfp,
    Tlsa,
    Txt,
}

impl RecordType {
    pub const ALL: [RecordType; 15] = [
        RecordType::A,
        RecordType::Aaaa,
        RecordType::Caa,
        RecordType::Cname,
        RecordType::Dname,
        RecordType::Loc,
        RecordType::Mx,
        RecordType::Naptr,
        RecordType::Ns,
        RecordType::Ptr,
        RecordType::Rp,
        RecordType::Srv,
        RecordType::Sshfp,
        RecordType::Tlsa,
        RecordType::Txt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Caa => "CAA",
            RecordType::Cname => "CNAME",
            RecordType::Dname => "DNAME",
            RecordType::Loc => "LOC",
            RecordType::Mx => "MX",
            RecordType::Naptr => "NAPTR",
            RecordType::Ns => "NS",
            RecordType::Ptr => "PTR",
            RecordType::Rp => "RP",
            RecordType::Srv => "SRV",
            RecordType::Sshfp => "SSHFP",
            RecordType::Tlsa => "TLSA",
            RecordType::Txt => "TXT",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| EndpointError::UnsupportedRecordType(s.to_string()))
    }
}

/// Record TTL in seconds; zero means "not configured".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ttl(pub i64);

impl Ttl {
    pub fn is_configured(&self) -> bool {
        self.0 > 0
    }

    /// The TTL as the zone API expects it, if one was set.
    pub fn seconds(&self) -> Option<u32> {
        if self.is_configured() {
            u32::try_from(self.0).ok()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSpecificProperty {
    pub name: String,
    pub value: String,
}

/// One desired DNS record set: a name, a type and its targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub dns_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub targets: Vec<String>,
    pub record_type: RecordType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub set_identifier: String,
    #[serde(rename = "recordTTL", default, skip_serializing_if = "is_unconfigured")]
    pub record_ttl: Ttl,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub provider_specific: Vec<ProviderSpecificProperty>,
}

impl Endpoint {
    pub fn new(dns_name: impl Into<String>, record_type: RecordType, targets: Vec<String>) -> Self {
        Self {
            dns_name: dns_name.into(),
            targets,
            record_type,
            set_identifier: String::new(),
            record_ttl: Ttl::default(),
            labels: BTreeMap::new(),
            provider_specific: Vec::new(),
        }
    }

    pub fn with_ttl(mut self, ttl: i64) -> Self {
        self.record_ttl = Ttl(ttl);
        self
    }
}

/// One reconciliation pass worth of changes, as computed by the planner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Changes {
    #[serde(default, deserialize_with = "null_as_default")]
    pub create: Vec<Endpoint>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub update_old: Vec<Endpoint>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub update_new: Vec<Endpoint>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub delete: Vec<Endpoint>,
}

impl Changes {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty()
            && self.update_old.is_empty()
            && self.update_new.is_empty()
            && self.delete.is_empty()
    }
}

/// Domains this provider claims, reported to the orchestrator on negotiation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainFilter {
    #[serde(default, deserialize_with = "null_as_default")]
    pub include: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl DomainFilter {
    pub fn new(include: Vec<String>) -> Self {
        Self {
            include,
            exclude: Vec::new(),
        }
    }
}

fn is_unconfigured(ttl: &Ttl) -> bool {
    !ttl.is_configured()
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
