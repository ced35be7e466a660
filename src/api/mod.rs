mod handlers;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use handlers::{CreateRequest, CreateResponse, PreviewRequest, PreviewResponse};

use crate::materialize::DEFAULT_CALL_TIMEOUT;
use crate::models::HierarchyConfig;
use crate::tracker::TrackerClient;

/// Shared state for the HTTP API.
#[derive(Clone)]
pub struct AppState {
    /// `None` when no Jira credentials are configured; preview still works.
    pub tracker: Option<Arc<dyn TrackerClient>>,
    /// Used for any request that does not carry its own config.
    pub defaults: HierarchyConfig,
    pub call_timeout: Duration,
}

impl AppState {
    pub fn new(tracker: Option<Arc<dyn TrackerClient>>, defaults: HierarchyConfig) -> Self {
        Self {
            tracker,
            defaults,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }
}

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/preview", post(handlers::preview))
        .route("/issues", post(handlers::create_issues))
        .route("/projects/{key}/parents", get(handlers::list_parent_candidates))
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
