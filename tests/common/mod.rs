//! Shared test infrastructure: an in-memory zone store.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use abion_dns_webhook::abion::types::{Record, ZonePage, ZoneRecords, ZoneSnapshot};
use abion_dns_webhook::abion::{ApiError, ZoneStore};
use abion_dns_webhook::endpoint::{DomainFilter, Endpoint, RecordType};
use abion_dns_webhook::provider::AbionProvider;

/// Zone store double that applies patches with merge-patch semantics and
/// records every call it receives.
pub struct FakeStore {
    zones: Mutex<BTreeMap<String, ZoneRecords>>,
    page_size: usize,
    fail_listing: bool,
    failing_fetch: HashSet<String>,
    failing_patch: HashSet<String>,
    patches: Mutex<Vec<(String, ZoneRecords)>>,
    fetches: Mutex<Vec<String>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self {
            zones: Mutex::new(BTreeMap::new()),
            page_size: 1,
            fail_listing: false,
            failing_fetch: HashSet::new(),
            failing_patch: HashSet::new(),
            patches: Mutex::new(Vec::new()),
            fetches: Mutex::new(Vec::new()),
        }
    }

    pub fn with_zone(self, zone_id: &str, entries: &[(&str, &str, &[&str])]) -> Self {
        let mut records = ZoneRecords::new();
        for (name, rtype, values) in entries {
            records
                .entry(name.to_string())
                .or_default()
                .insert(rtype.to_string(), values.iter().map(|v| rec(v)).collect());
        }
        self.zones.lock().unwrap().insert(zone_id.to_string(), records);
        self
    }

    pub fn with_records(self, zone_id: &str, name: &str, rtype: &str, records: Vec<Record>) -> Self {
        self.zones
            .lock()
            .unwrap()
            .entry(zone_id.to_string())
            .or_default()
            .entry(name.to_string())
            .or_default()
            .insert(rtype.to_string(), records);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn failing_fetch(mut self, zone_id: &str) -> Self {
        self.failing_fetch.insert(zone_id.to_string());
        self
    }

    pub fn failing_patch(mut self, zone_id: &str) -> Self {
        self.failing_patch.insert(zone_id.to_string());
        self
    }

    pub fn patches(&self) -> Vec<(String, ZoneRecords)> {
        self.patches.lock().unwrap().clone()
    }

    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }

    pub fn group(&self, zone_id: &str, name: &str, rtype: &str) -> Option<Vec<Record>> {
        self.zones
            .lock()
            .unwrap()
            .get(zone_id)
            .and_then(|z| z.get(name))
            .and_then(|types| types.get(rtype))
            .cloned()
    }
}

fn unavailable() -> ApiError {
    ApiError::Api {
        status: 503,
        message: "Service Unavailable".into(),
    }
}

#[async_trait]
impl ZoneStore for FakeStore {
    async fn list_zones(&self, offset: usize) -> Result<ZonePage, ApiError> {
        if self.fail_listing {
            return Err(unavailable());
        }
        let zones = self.zones.lock().unwrap();
        Ok(ZonePage {
            zone_ids: zones.keys().skip(offset).take(self.page_size).cloned().collect(),
            total: zones.len(),
        })
    }

    async fn get_zone(&self, zone_id: &str) -> Result<ZoneSnapshot, ApiError> {
        self.fetches.lock().unwrap().push(zone_id.to_string());
        if self.failing_fetch.contains(zone_id) {
            return Err(unavailable());
        }
        let zones = self.zones.lock().unwrap();
        let records = zones.get(zone_id).cloned().ok_or(ApiError::Api {
            status: 404,
            message: "Not Found".into(),
        })?;
        Ok(ZoneSnapshot {
            id: zone_id.to_string(),
            records,
        })
    }

    async fn patch_zone(&self, zone_id: &str, records: ZoneRecords) -> Result<(), ApiError> {
        if self.failing_patch.contains(zone_id) {
            return Err(unavailable());
        }
        self.patches
            .lock()
            .unwrap()
            .push((zone_id.to_string(), records.clone()));

        let mut zones = self.zones.lock().unwrap();
        let zone = zones.entry(zone_id.to_string()).or_default();
        for (name, types) in records {
            let stored = zone.entry(name).or_default();
            for (rtype, group) in types {
                stored.insert(rtype, group);
            }
        }
        Ok(())
    }
}

pub fn provider(store: &Arc<FakeStore>, dry_run: bool) -> AbionProvider {
    let store: Arc<dyn ZoneStore> = store.clone();
    AbionProvider::new(store, dry_run, DomainFilter::new(vec!["abion.test".into()]))
}

pub fn ep(name: &str, record_type: RecordType, targets: &[&str]) -> Endpoint {
    Endpoint::new(name, record_type, targets.iter().map(|t| t.to_string()).collect())
}

pub fn rec(data: &str) -> Record {
    Record::new(data, None)
}
