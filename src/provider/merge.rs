//! Computes zone patches from the current zone content and a batch of endpoints.
//!
//! The zone API replaces a whole (local name, record type) group whenever that
//! key is present in a patch, so every function here returns the *complete*
//! record list a group must hold afterwards, never just the delta. All of it
//! is pure: fetching and submitting is left to the caller.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::abion::types::{Record, ZoneRecords};
use crate::endpoint::{Endpoint, RecordType};
use crate::provider::naming::{normalize_target, to_local};

/// Patch payload for one zone, keyed like [`ZoneRecords`].
pub type ZonePatch = ZoneRecords;

/// The unit the zone API replaces atomically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub name: String,
    pub record_type: RecordType,
}

/// Buckets a zone's endpoints by local name and record type.
pub fn group_endpoints(zone_id: &str, endpoints: Vec<Endpoint>) -> BTreeMap<GroupKey, Vec<Endpoint>> {
    let mut groups: BTreeMap<GroupKey, Vec<Endpoint>> = BTreeMap::new();
    for ep in endpoints {
        let key = GroupKey {
            name: to_local(&ep.dns_name, zone_id),
            record_type: ep.record_type,
        };
        groups.entry(key).or_default().push(ep);
    }
    groups
}

/// Records currently stored for `key`, if the group exists.
pub fn current_group<'a>(current: &'a ZoneRecords, key: &GroupKey) -> Option<&'a [Record]> {
    current
        .get(&key.name)
        .and_then(|types| types.get(key.record_type.as_str()))
        .map(Vec::as_slice)
}

/// New records first, then every existing record of the group.
///
/// A new value already stored in the group is not emitted again; the stored
/// record is kept as is, TTL and comments included.
pub fn merge_create(record_type: RecordType, current: &[Record], creates: &[Endpoint]) -> Vec<Record> {
    let stored: HashSet<String> = current
        .iter()
        .map(|r| normalize_target(record_type, &r.data))
        .collect();

    let mut records: Vec<Record> = desired_records(creates)
        .into_iter()
        .filter(|r| !stored.contains(&r.data))
        .collect();
    records.extend(current.iter().cloned());
    records
}

/// New records first, then every existing record that is not being replaced,
/// i.e. does not match an old target.
pub fn merge_update(
    record_type: RecordType,
    current: &[Record],
    new: &[Endpoint],
    old: &[Endpoint],
) -> Vec<Record> {
    let mut records = desired_records(new);
    let superseded = normalized_targets(old);

    for record in current {
        if superseded.contains(&normalize_target(record_type, &record.data)) {
            debug!(record = ?record, "dropping record replaced by the update");
            continue;
        }
        records.push(record.clone());
    }
    records
}

/// Existing records minus those matching any delete target.
pub fn merge_delete(record_type: RecordType, current: &[Record], deletes: &[Endpoint]) -> Vec<Record> {
    let doomed = normalized_targets(deletes);
    current
        .iter()
        .filter(|r| !doomed.contains(&normalize_target(record_type, &r.data)))
        .cloned()
        .collect()
}

pub fn plan_creates(zone_id: &str, current: &ZoneRecords, creates: Vec<Endpoint>) -> ZonePatch {
    let mut patch = ZonePatch::new();
    for (key, endpoints) in group_endpoints(zone_id, creates) {
        let existing = current_group(current, &key).unwrap_or_default();
        let records = merge_create(key.record_type, existing, &endpoints);
        insert(&mut patch, key, records);
    }
    patch
}

/// Old endpoints are matched against the group of the new endpoint they
/// belong to; an old endpoint without a new counterpart in the same group
/// contributes nothing.
pub fn plan_updates(
    zone_id: &str,
    current: &ZoneRecords,
    new: Vec<Endpoint>,
    old: Vec<Endpoint>,
) -> ZonePatch {
    let mut old_groups = group_endpoints(zone_id, old);
    let mut patch = ZonePatch::new();

    for (key, endpoints) in group_endpoints(zone_id, new) {
        let previous = old_groups.remove(&key).unwrap_or_default();
        let existing = current_group(current, &key).unwrap_or_default();
        let records = merge_update(key.record_type, existing, &endpoints, &previous);
        insert(&mut patch, key, records);
    }
    patch
}

pub fn plan_deletes(zone_id: &str, current: &ZoneRecords, deletes: Vec<Endpoint>) -> ZonePatch {
    let mut patch = ZonePatch::new();
    for (key, endpoints) in group_endpoints(zone_id, deletes) {
        let Some(existing) = current_group(current, &key) else {
            debug!(zone = zone_id, name = %key.name, record_type = %key.record_type, "nothing to delete");
            continue;
        };
        let records = merge_delete(key.record_type, existing, &endpoints);
        insert(&mut patch, key, records);
    }
    patch
}

fn desired_records(endpoints: &[Endpoint]) -> Vec<Record> {
    endpoints
        .iter()
        .flat_map(|ep| {
            let ttl = ep.record_ttl.seconds();
            ep.targets
                .iter()
                .map(move |t| Record::new(normalize_target(ep.record_type, t), ttl))
        })
        .collect()
}

fn normalized_targets(endpoints: &[Endpoint]) -> HashSet<String> {
    endpoints
        .iter()
        .flat_map(|ep| ep.targets.iter().map(|t| normalize_target(ep.record_type, t)))
        .collect()
}

fn insert(patch: &mut ZonePatch, key: GroupKey, records: Vec<Record>) {
    patch
        .entry(key.name)
        .or_default()
        .insert(key.record_type.to_string(), records);
}
