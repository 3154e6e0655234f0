use axum::{Extension, Json, extract::rejection::JsonRejection, http::StatusCode};
use tracing::{debug, info};

use super::WebhookJson;
use crate::SharedState;
use crate::endpoint::{Changes, DomainFilter, Endpoint};
use crate::error::AppError;

// GET /
pub async fn negotiate(Extension(state): Extension<SharedState>) -> WebhookJson<DomainFilter> {
    WebhookJson(state.provider.domain_filter().clone())
}

// GET /records
pub async fn records(
    Extension(state): Extension<SharedState>,
) -> Result<WebhookJson<Vec<Endpoint>>, AppError> {
    let endpoints = state.provider.records().await?;
    Ok(WebhookJson(endpoints))
}

// POST /records
pub async fn apply_changes(
    Extension(state): Extension<SharedState>,
    payload: Result<Json<Changes>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(changes) = payload?;
    if changes.is_empty() {
        debug!("empty change set");
        return Ok(StatusCode::NO_CONTENT);
    }

    info!(
        create = changes.create.len(),
        update = changes.update_new.len(),
        delete = changes.delete.len(),
        dry_run = state.provider.dry_run(),
        "applying changes"
    );
    state.provider.apply_changes(changes).await?;
    Ok(StatusCode::NO_CONTENT)
}

// POST /adjustendpoints
pub async fn adjust_endpoints(
    Extension(state): Extension<SharedState>,
    payload: Result<Json<Vec<Endpoint>>, JsonRejection>,
) -> Result<WebhookJson<Vec<Endpoint>>, AppError> {
    let Json(endpoints) = payload?;
    Ok(WebhookJson(state.provider.adjust_endpoints(endpoints)))
}

// GET /healthz
pub async fn healthz() -> &'static str {
    "ok"
}
