//! Reconciles external-dns change sets against Abion zones.

pub mod merge;
pub mod naming;
pub mod zones;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::abion::types::{ZoneRecords, ZoneSnapshot};
use crate::abion::{ApiError, ZoneStore};
use crate::endpoint::{Changes, DomainFilter, Endpoint, RecordType};
use merge::ZonePatch;
use zones::ZoneResolver;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("unable to list zones: {0}")]
    ZoneListing(#[source] ApiError),

    #[error("unable to get zone {zone}: {source}")]
    ZoneFetch { zone: String, source: ApiError },

    #[error("error updating zone {zone}: {source}")]
    Submission { zone: String, source: ApiError },
}

/// Endpoints bucketed by the id of the zone that owns them.
type ZoneBuckets = BTreeMap<String, Vec<Endpoint>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Create,
    Update,
    Delete,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Create => "create",
            Stage::Update => "update",
            Stage::Delete => "delete",
        })
    }
}

pub struct AbionProvider {
    store: Arc<dyn ZoneStore>,
    dry_run: bool,
    domain_filter: DomainFilter,
}

impl AbionProvider {
    pub fn new(store: Arc<dyn ZoneStore>, dry_run: bool, domain_filter: DomainFilter) -> Self {
        Self {
            store,
            dry_run,
            domain_filter,
        }
    }

    pub fn domain_filter(&self) -> &DomainFilter {
        &self.domain_filter
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Every record of every accessible zone, as generic endpoints.
    ///
    /// Each stored record becomes its own endpoint carrying the record's TTL.
    pub async fn records(&self) -> Result<Vec<Endpoint>, ProviderError> {
        let zone_ids = zones::list_zone_ids(self.store.as_ref())
            .await
            .map_err(ProviderError::ZoneListing)?;

        let mut endpoints = Vec::new();
        for zone_id in zone_ids {
            let zone = self.fetch_zone(&zone_id).await?;
            endpoints.extend(zone_endpoints(&zone));
        }

        debug!(endpoints = ?endpoints, "records");
        Ok(endpoints)
    }

    /// Endpoints are already in the shape the zone API accepts.
    pub fn adjust_endpoints(&self, endpoints: Vec<Endpoint>) -> Vec<Endpoint> {
        endpoints
    }

    /// Applies creates, then updates, then deletes, one patch per zone and stage.
    ///
    /// Zones are processed one at a time. A failure in the create stage aborts
    /// the pass; in the update and delete stages a zone that cannot be fetched
    /// is skipped. A failed patch aborts the pass, but zones patched before it
    /// stay patched.
    pub async fn apply_changes(&self, changes: Changes) -> Result<(), ProviderError> {
        let resolver = ZoneResolver::load(self.store.as_ref())
            .await
            .map_err(ProviderError::ZoneListing)?;

        let Changes {
            create,
            update_old,
            update_new,
            delete,
        } = changes;

        let creates = partition(&resolver, create);
        let mut updates_old = partition(&resolver, update_old);
        let updates_new = partition(&resolver, update_new);
        let deletes = partition(&resolver, delete);

        for (zone_id, endpoints) in creates {
            let zone = self.fetch_zone(&zone_id).await?;
            let patch = merge::plan_creates(&zone_id, &zone.records, endpoints);
            self.submit(Stage::Create, &zone_id, patch).await?;
        }

        for (zone_id, endpoints) in updates_new {
            let old = updates_old.remove(&zone_id).unwrap_or_default();
            let Some(zone) = self.fetch_zone_or_skip(Stage::Update, &zone_id).await else {
                continue;
            };
            let patch = merge::plan_updates(&zone_id, &zone.records, endpoints, old);
            self.submit(Stage::Update, &zone_id, patch).await?;
        }

        for (zone_id, endpoints) in deletes {
            let Some(zone) = self.fetch_zone_or_skip(Stage::Delete, &zone_id).await else {
                continue;
            };
            let patch = merge::plan_deletes(&zone_id, &zone.records, endpoints);
            self.submit(Stage::Delete, &zone_id, patch).await?;
        }

        Ok(())
    }

    async fn fetch_zone(&self, zone_id: &str) -> Result<ZoneSnapshot, ProviderError> {
        self.store
            .get_zone(zone_id)
            .await
            .map_err(|source| ProviderError::ZoneFetch {
                zone: zone_id.to_string(),
                source,
            })
    }

    async fn fetch_zone_or_skip(&self, stage: Stage, zone_id: &str) -> Option<ZoneSnapshot> {
        match self.store.get_zone(zone_id).await {
            Ok(zone) => Some(zone),
            Err(err) => {
                warn!(zone = zone_id, %stage, "unable to get zone, skipping: {err}");
                None
            }
        }
    }

    async fn submit(&self, stage: Stage, zone_id: &str, patch: ZonePatch) -> Result<(), ProviderError> {
        if patch.is_empty() {
            debug!(zone = zone_id, %stage, "no groups affected");
            return Ok(());
        }

        debug!(zone = zone_id, %stage, records = ?patch, "{stage} records");

        if self.dry_run {
            info!(zone = zone_id, %stage, groups = group_count(&patch), "dry run, zone not patched");
            return Ok(());
        }

        self.store
            .patch_zone(zone_id, patch)
            .await
            .map_err(|source| ProviderError::Submission {
                zone: zone_id.to_string(),
                source,
            })?;

        info!(zone = zone_id, %stage, "zone patched");
        Ok(())
    }
}

fn partition(resolver: &ZoneResolver, endpoints: Vec<Endpoint>) -> ZoneBuckets {
    let mut buckets = ZoneBuckets::new();
    for mut ep in endpoints {
        ep.dns_name.make_ascii_lowercase();
        match resolver.resolve(&ep.dns_name) {
            Some(zone_id) => buckets.entry(zone_id.to_string()).or_default().push(ep),
            None => debug!(
                dns_name = %ep.dns_name,
                "skipping record because no hosted zone matching record DNS name was detected"
            ),
        }
    }
    buckets
}

fn zone_endpoints(zone: &ZoneSnapshot) -> Vec<Endpoint> {
    let mut endpoints = Vec::new();
    for (name, types) in &zone.records {
        for (record_type, records) in types {
            let Ok(parsed) = record_type.parse::<RecordType>() else {
                debug!(zone = %zone.id, %name, %record_type, "skipping unsupported record type");
                continue;
            };
            let dns_name = naming::to_global(name, &zone.id);
            for record in records {
                let ttl = record.ttl.map(i64::from).unwrap_or_default();
                endpoints.push(
                    Endpoint::new(dns_name.clone(), parsed, vec![record.data.clone()]).with_ttl(ttl),
                );
            }
        }
    }
    endpoints
}

fn group_count(patch: &ZoneRecords) -> usize {
    patch.values().map(|types| types.len()).sum()
}
