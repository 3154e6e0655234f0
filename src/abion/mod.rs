//! Client side of the Abion zone API.

pub mod client;
pub mod types;

use async_trait::async_trait;

use types::{ZonePage, ZoneRecords, ZoneSnapshot};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("error sending request: {0}")]
    Http(#[from] reqwest::Error),

    #[error("zone API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("error decoding response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid API url: {0}")]
    InvalidUrl(String),
}

/// The remote, zone-scoped record store the reconciler talks to.
#[async_trait]
pub trait ZoneStore: Send + Sync {
    /// Lists zone ids starting at `offset`, together with the total zone count.
    async fn list_zones(&self, offset: usize) -> Result<ZonePage, ApiError>;

    async fn get_zone(&self, zone_id: &str) -> Result<ZoneSnapshot, ApiError>;

    /// Merge-patches the zone: every (name, type) key present in `records`
    /// replaces the stored group wholesale.
    async fn patch_zone(&self, zone_id: &str, records: ZoneRecords) -> Result<(), ApiError>;
}
