//! external-dns webhook protocol over HTTP.

pub mod handlers;

use axum::{
    Extension, Json, Router,
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;

use crate::SharedState;

/// Media type external-dns negotiates with webhook providers.
pub const MEDIA_TYPE: &str = "application/external.dns.webhook+json;version=1";

pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(handlers::negotiate))
        .route(
            "/records",
            get(handlers::records).post(handlers::apply_changes),
        )
        .route("/adjustendpoints", post(handlers::adjust_endpoints))
        .route("/healthz", get(handlers::healthz))
        .layer(Extension(state))
}

/// JSON body sent with the webhook media type.
#[derive(Debug)]
pub struct WebhookJson<T>(pub T);

impl<T: Serialize> IntoResponse for WebhookJson<T> {
    fn into_response(self) -> Response {
        (
            [(header::CONTENT_TYPE, HeaderValue::from_static(MEDIA_TYPE))],
            Json(self.0),
        )
            .into_response()
    }
}
