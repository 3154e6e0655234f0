//! Crate entrypoint wiring together configuration, the Abion zone API, the
//! reconciler and the external-dns webhook surface.

pub mod abion;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod provider;
pub mod webhook;

use config::AppConfig;
use provider::AbionProvider;

use std::sync::Arc;

/// Complete application dependencies shared across handlers.
pub struct AppState {
    pub config: AppConfig,
    pub provider: AbionProvider,
}

/// Arc-wrapped version of `AppState` passed into Axum extensions.
pub type SharedState = Arc<AppState>;
