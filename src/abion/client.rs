use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, header};
use serde::de::DeserializeOwned;
use tracing::{error, warn};

use crate::abion::types::*;
use crate::abion::{ApiError, ZoneStore};

pub const DEFAULT_BASE_URL: &str = "https://api.abion.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const API_KEY_HEADER: &str = "X-API-KEY";

#[derive(Clone)]
pub struct AbionClient {
    http: Client,
    base_url: String, // e.g. "https://api.abion.com"
    api_key: String,
}

impl AbionClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base_url = base_url.into();
        reqwest::Url::parse(&base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;

        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn auth_header(&self, req: RequestBuilder) -> RequestBuilder {
        req.header(API_KEY_HEADER, &self.api_key)
            .header(header::ACCEPT, "application/json")
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn execute(&self, req: RequestBuilder) -> Result<Response, ApiError> {
        let res = self.auth_header(req).send().await?;
        if res.status() != StatusCode::OK {
            return Err(parse_error(res).await);
        }
        Ok(res)
    }

    async fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<ApiResponse<T>, ApiError> {
        let res = self.execute(req).await?;
        let body = res.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl ZoneStore for AbionClient {
    async fn list_zones(&self, offset: usize) -> Result<ZonePage, ApiError> {
        let req = self.http.get(self.url("zones")).query(&[("page[offset]", offset)]);
        let res: ApiResponse<Vec<Zone>> = self.fetch(req).await.inspect_err(|e| {
            error!("could not get zones: {e}");
        })?;

        let zone_ids: Vec<String> = res.data.unwrap_or_default().into_iter().map(|z| z.id).collect();
        // without pagination metadata this page is the last one
        let total = res
            .meta
            .and_then(|m| m.pagination)
            .map(|p| p.total)
            .unwrap_or(offset + zone_ids.len());

        Ok(ZonePage { zone_ids, total })
    }

    async fn get_zone(&self, zone_id: &str) -> Result<ZoneSnapshot, ApiError> {
        let req = self.http.get(self.url(&format!("zones/{zone_id}")));
        let res: ApiResponse<Zone> = self.fetch(req).await?;
        res.data
            .map(ZoneSnapshot::from)
            .ok_or_else(|| ApiError::Api {
                status: StatusCode::OK.as_u16(),
                message: format!("response for zone {zone_id} carried no data"),
            })
    }

    async fn patch_zone(&self, zone_id: &str, records: ZoneRecords) -> Result<(), ApiError> {
        let body = ZoneRequest::patch(zone_id, records);
        let req = self
            .http
            .patch(self.url(&format!("zones/{zone_id}")))
            .json(&body);
        self.execute(req).await?;
        Ok(())
    }
}

async fn parse_error(res: Response) -> ApiError {
    let status = res.status();
    let body = match res.bytes().await {
        Ok(body) => body,
        Err(e) => return ApiError::Http(e),
    };

    match serde_json::from_slice::<ApiResponse<serde_json::Value>>(&body) {
        Ok(ApiResponse {
            error: Some(err), ..
        }) => ApiError::Api {
            status: err.status,
            message: err.message,
        },
        _ => {
            warn!(%status, "zone API error body could not be parsed");
            ApiError::Api {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("unknown error").to_string(),
            }
        }
    }
}
