//! Entry points shared by the CLI and the HTTP API.

use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::gherkin;
use crate::materialize::{Materializer, DEFAULT_CALL_TIMEOUT};
use crate::models::{HierarchyConfig, MaterializeReport, PlanNode, Role, Shape};
use crate::plan;
use crate::tracker::{resolve_types, IssueSummary, SearchOptions, TrackerClient};

/// Type names that usually sit at the top of a Jira hierarchy.
const HIGH_LEVEL_TYPE_HINTS: [&str; 4] = ["Initiative", "Epic", "Theme", "Program"];

static PROJECT_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("valid project key regex"));

/// Knobs for a creation run.
#[derive(Debug, Clone)]
pub struct CreateOptions {
    pub call_timeout: Duration,
    pub cancel: CancellationToken,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
            cancel: CancellationToken::new(),
        }
    }
}

/// Parse a document and plan its issues. No network access.
pub fn preview_plan(
    document: &str,
    config: &HierarchyConfig,
    root_label: &str,
) -> Result<Vec<PlanNode>> {
    let features = gherkin::parse(document)?;
    Ok(plan::plan(&features, config, root_label))
}

/// Create the selected part of a plan.
///
/// `selected_ids` wins when non-empty; otherwise each node's own `selected`
/// flag decides. Issue types are resolved for the roles that will actually be
/// created before anything is sent, so a missing type fails the whole run up
/// front. Per-node failures end up in the report, never in the `Err` branch.
pub async fn create_from_plan<T: TrackerClient + ?Sized>(
    tracker: &T,
    plan: &[PlanNode],
    selected_ids: &HashSet<String>,
    config: &HierarchyConfig,
    options: CreateOptions,
) -> Result<MaterializeReport> {
    if config.project_key.trim().is_empty() {
        return Err(Error::MissingProject);
    }
    if config.shape == Shape::Flat && config.parent_key().is_none() {
        return Err(Error::MissingParentKey(Shape::Flat.as_str()));
    }

    let nodes = if selected_ids.is_empty() {
        let flagged: HashSet<String> = plan
            .iter()
            .filter(|n| n.selected)
            .map(|n| n.id.clone())
            .collect();
        if flagged.len() < plan.len() {
            warn_selection_problems(plan, &flagged);
        }
        plan::selected_nodes(plan)
    } else {
        warn_selection_problems(plan, selected_ids);
        plan::filter(plan, selected_ids)
    };

    let roles: HashSet<Role> = nodes.iter().map(|n| n.role).collect();
    let types = resolve_types(tracker, config, roles).await?;

    let report = Materializer::new(tracker, config, &types)
        .with_timeout(options.call_timeout)
        .with_cancellation(options.cancel)
        .run(&nodes)
        .await;
    Ok(report)
}

/// Mark `selected_ids` in a previewed plan so its tree shows what a create run
/// would attempt. An empty set leaves the plan fully selected.
pub fn apply_preview_selection(plan: &mut [PlanNode], selected_ids: &HashSet<String>) {
    if selected_ids.is_empty() {
        return;
    }
    warn_selection_problems(plan, selected_ids);
    plan::apply_selection(plan, selected_ids);
}

fn warn_selection_problems(plan: &[PlanNode], selected_ids: &HashSet<String>) {
    let unknown = plan::unknown_ids(plan, selected_ids);
    if !unknown.is_empty() {
        tracing::warn!(ids = ?unknown, "selected ids not in plan");
    }
    for orphan in plan::orphaned_selections(plan, selected_ids) {
        tracing::warn!(
            node = %orphan.id,
            parent = orphan.parent_id().unwrap_or_default(),
            skipped_below = ?plan::descendants(plan, &orphan.id),
            "selected node's parent is not selected; it and everything below it will be skipped"
        );
    }
}

/// Parse, plan, and create in one go, for callers without a preview step.
pub async fn create_from_document<T: TrackerClient + ?Sized>(
    tracker: &T,
    document: &str,
    root_label: &str,
    selected_ids: &HashSet<String>,
    config: &HierarchyConfig,
    options: CreateOptions,
) -> Result<MaterializeReport> {
    let plan = preview_plan(document, config, root_label)?;
    create_from_plan(tracker, &plan, selected_ids, config, options).await
}

/// Existing issues a tree could be rooted under.
///
/// `project_key` must look like a Jira project key; anything else is rejected
/// before it reaches JQL.
///
/// Searches for issues of the shape's parent role (Initiative or Epic). When
/// that search fails, typically because the type does not exist, falls back
/// to any project type whose name looks high-level.
pub async fn find_parent_candidates<T: TrackerClient + ?Sized>(
    tracker: &T,
    project_key: &str,
    shape: Shape,
) -> Result<Vec<IssueSummary>> {
    if !PROJECT_KEY.is_match(project_key) {
        return Err(Error::InvalidProjectKey(project_key.to_string()));
    }

    let options = SearchOptions::default();
    let jql = format!(
        "project = \"{}\" AND issuetype = \"{}\" ORDER BY created DESC",
        project_key,
        shape.parent_role().label()
    );

    match tracker.search_issues(&jql, &options).await {
        Ok(issues) => Ok(issues),
        Err(e) => {
            tracing::warn!(error = %e, "parent search failed, falling back to high-level types");
            let types = tracker.get_project_issue_types(project_key).await?;
            let high_level: Vec<String> = types
                .into_iter()
                .filter(|t| HIGH_LEVEL_TYPE_HINTS.iter().any(|hint| t.name.contains(hint)))
                .map(|t| format!("issuetype = \"{}\"", t.name))
                .collect();
            if high_level.is_empty() {
                return Ok(Vec::new());
            }

            let jql = format!(
                "project = \"{}\" AND ({}) ORDER BY created DESC",
                project_key,
                high_level.join(" OR ")
            );
            Ok(tracker.search_issues(&jql, &options).await?)
        }
    }
}
