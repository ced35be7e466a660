use std::collections::HashSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::AppState;
use crate::error::Error;
use crate::gherkin::DEFAULT_ROOT_LABEL;
use crate::models::{HierarchyConfig, MaterializeReport, PlanNode, Shape};
use crate::plan::render_tree;
use crate::service::{self, CreateOptions};
use crate::tracker::IssueSummary;

// ============================================================
// Error Handling
// ============================================================

/// Map a run error to a status. Input problems are the caller's to fix and
/// are returned as-is; tracker failures are logged and reported as a bad
/// gateway.
fn run_error(e: Error) -> (StatusCode, String) {
    let status = match &e {
        Error::Parse(_)
        | Error::MissingParentKey(_)
        | Error::MissingProject
        | Error::InvalidProjectKey(_) => StatusCode::BAD_REQUEST,
        Error::Resolve(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Tracker(_) => StatusCode::BAD_GATEWAY,
        Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!("Request failed: {}", e);
    } else {
        tracing::warn!("Rejected request: {}", e);
    }
    (status, e.to_string())
}

fn tracker_unavailable() -> (StatusCode, String) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        "Jira credentials are not configured".to_string(),
    )
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Preview
// ============================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct PreviewRequest {
    pub document: String,
    #[serde(default)]
    pub config: Option<HierarchyConfig>,
    /// Name of the root epic in the deep shape. Defaults to "Feature Files".
    #[serde(default)]
    pub root_label: Option<String>,
    /// Nodes to mark selected in the preview; empty keeps every node selected.
    #[serde(default)]
    pub selected_ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub nodes: Vec<PlanNode>,
    /// ASCII rendering of `nodes`.
    pub tree: String,
}

pub async fn preview(
    State(state): State<AppState>,
    Json(req): Json<PreviewRequest>,
) -> Result<Json<PreviewResponse>, (StatusCode, String)> {
    let config = req.config.unwrap_or(state.defaults);
    let root_label = req
        .root_label
        .unwrap_or_else(|| DEFAULT_ROOT_LABEL.to_string());

    let mut nodes =
        service::preview_plan(&req.document, &config, &root_label).map_err(run_error)?;
    let selected: HashSet<String> = req.selected_ids.into_iter().collect();
    service::apply_preview_selection(&mut nodes, &selected);
    let tree = render_tree(&nodes);
    Ok(Json(PreviewResponse { nodes, tree }))
}

// ============================================================
// Create
// ============================================================

/// Either a previously previewed `plan` (preferred, passed through as-is) or
/// a `document` to plan afresh.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRequest {
    #[serde(default)]
    pub plan: Option<Vec<PlanNode>>,
    #[serde(default)]
    pub document: Option<String>,
    #[serde(default)]
    pub root_label: Option<String>,
    #[serde(default)]
    pub selected_ids: Vec<String>,
    #[serde(default)]
    pub config: Option<HierarchyConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateResponse {
    /// The run itself completed; individual nodes may still have failed.
    pub success: bool,
    pub summary: String,
    pub report: MaterializeReport,
}

pub async fn create_issues(
    State(state): State<AppState>,
    Json(req): Json<CreateRequest>,
) -> Result<Json<CreateResponse>, (StatusCode, String)> {
    let tracker = state.tracker.clone().ok_or_else(tracker_unavailable)?;
    let config = req.config.unwrap_or_else(|| state.defaults.clone());

    let plan = match (req.plan, req.document) {
        (Some(plan), _) => plan,
        (None, Some(document)) => {
            let root_label = req
                .root_label
                .unwrap_or_else(|| DEFAULT_ROOT_LABEL.to_string());
            service::preview_plan(&document, &config, &root_label).map_err(run_error)?
        }
        (None, None) => {
            return Err((
                StatusCode::BAD_REQUEST,
                "Either plan or document is required".to_string(),
            ))
        }
    };

    let selected: HashSet<String> = req.selected_ids.into_iter().collect();
    let options = CreateOptions {
        call_timeout: state.call_timeout,
        cancel: CancellationToken::new(),
    };
    let report = service::create_from_plan(tracker.as_ref(), &plan, &selected, &config, options)
        .await
        .map_err(run_error)?;

    Ok(Json(CreateResponse {
        success: true,
        summary: report.to_string(),
        report,
    }))
}

// ============================================================
// Parent lookup
// ============================================================

#[derive(Debug, Deserialize)]
pub struct ParentQuery {
    #[serde(default)]
    pub shape: Option<Shape>,
}

pub async fn list_parent_candidates(
    State(state): State<AppState>,
    Path(project_key): Path<String>,
    Query(query): Query<ParentQuery>,
) -> Result<Json<Vec<IssueSummary>>, (StatusCode, String)> {
    let tracker = state.tracker.clone().ok_or_else(tracker_unavailable)?;
    let shape = query.shape.unwrap_or(state.defaults.shape);

    service::find_parent_candidates(tracker.as_ref(), &project_key, shape)
        .await
        .map(Json)
        .map_err(run_error)
}
