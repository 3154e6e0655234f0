//! Zone enumeration and zone ownership lookup.

use tracing::{debug, warn};

use crate::abion::{ApiError, ZoneStore};

/// Walks the paginated zone listing and collects every zone id in order.
pub async fn list_zone_ids(store: &dyn ZoneStore) -> Result<Vec<String>, ApiError> {
    let mut zone_ids = Vec::new();
    let mut offset = 0;

    loop {
        let page = store.list_zones(offset).await?;
        let fetched = page.zone_ids.len();
        zone_ids.extend(page.zone_ids);
        offset += fetched;

        if offset >= page.total {
            break;
        }
        if fetched == 0 {
            warn!(offset, total = page.total, "zone listing returned an empty page before its total");
            break;
        }
    }

    debug!(zones = zone_ids.len(), "listed zones");
    Ok(zone_ids)
}

/// Maps a fully-qualified name to the most specific zone that owns it.
#[derive(Debug, Clone, Default)]
pub struct ZoneResolver {
    // longest first, so the first match is the most specific zone
    zones: Vec<String>,
}

impl ZoneResolver {
    pub fn new(zone_ids: impl IntoIterator<Item = String>) -> Self {
        let mut zones: Vec<String> = zone_ids
            .into_iter()
            .map(|z| z.to_ascii_lowercase())
            .collect();
        zones.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        zones.dedup();
        Self { zones }
    }

    pub async fn load(store: &dyn ZoneStore) -> Result<Self, ApiError> {
        Ok(Self::new(list_zone_ids(store).await?))
    }

    /// Names compare case-insensitively; zone ids are held lowercased.
    pub fn resolve(&self, dns_name: &str) -> Option<&str> {
        let dns_name = dns_name.to_ascii_lowercase();
        self.zones
            .iter()
            .find(|zone| is_within(&dns_name, zone))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

fn is_within(dns_name: &str, zone: &str) -> bool {
    dns_name == zone
        || dns_name
            .strip_suffix(zone)
            .is_some_and(|rest| rest.ends_with('.'))
}
