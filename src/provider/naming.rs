//! Translation between fully-qualified names and zone-local names, and
//! per-type formatting of record values.

use crate::endpoint::RecordType;

/// Local name of the zone apex.
pub const APEX: &str = "@";

/// `abion.test` -> `@`, `www.abion.test` -> `www` for zone `abion.test`.
///
/// The caller guarantees `dns_name` is the zone itself or lies below it.
pub fn to_local(dns_name: &str, zone_id: &str) -> String {
    if dns_name == zone_id {
        return APEX.to_string();
    }
    dns_name
        .strip_suffix(zone_id)
        .and_then(|rest| rest.strip_suffix('.'))
        .unwrap_or(dns_name)
        .to_string()
}

/// Inverse of [`to_local`].
pub fn to_global(local_name: &str, zone_id: &str) -> String {
    if local_name == APEX {
        zone_id.to_string()
    } else {
        format!("{local_name}.{zone_id}")
    }
}

/// Canonical form of a target before it is compared or submitted.
///
/// CNAME targets are stored fully qualified with a trailing dot; every other
/// type is passed through as is.
pub fn normalize_target(record_type: RecordType, target: &str) -> String {
    match record_type {
        RecordType::Cname if !target.ends_with('.') => format!("{target}."),
        _ => target.to_string(),
    }
}
