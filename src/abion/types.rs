use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Records of a zone keyed by local name ("@", "www") and then record type ("A", "TXT").
pub type ZoneRecords = BTreeMap<String, BTreeMap<String, Vec<Record>>>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Metadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub status: u16,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    #[serde(rename = "type")]
    pub zone_type: String, // "zone"
    pub id: String, // "abion.test"
    #[serde(default)]
    pub attributes: Attributes,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Attributes {
    #[serde(default)]
    pub records: ZoneRecords,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    pub data: String, // "172.16.0.1" or "target.abion.test."
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

impl Record {
    pub fn new(data: impl Into<String>, ttl: Option<u32>) -> Self {
        Self {
            ttl,
            data: data.into(),
            comments: None,
        }
    }
}

// Body of a zone PATCH (JSON merge patch)
#[derive(Debug, Serialize, Deserialize)]
pub struct ZoneRequest {
    pub data: Zone,
}

impl ZoneRequest {
    pub fn patch(zone_id: &str, records: ZoneRecords) -> Self {
        Self {
            data: Zone {
                zone_type: "zone".into(),
                id: zone_id.to_string(),
                attributes: Attributes { records },
            },
        }
    }
}

/// One page of the zone listing.
#[derive(Debug, Clone, Default)]
pub struct ZonePage {
    pub zone_ids: Vec<String>,
    pub total: usize,
}

/// Current content of one zone.
#[derive(Debug, Clone, Default)]
pub struct ZoneSnapshot {
    pub id: String,
    pub records: ZoneRecords,
}

impl From<Zone> for ZoneSnapshot {
    fn from(zone: Zone) -> Self {
        Self {
            id: zone.id,
            records: zone.attributes.records,
        }
    }
}
