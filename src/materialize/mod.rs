//! Creating a plan's issues in the tracker.
//!
//! Nodes are created strictly one at a time in plan order: a child needs the
//! key its parent got back from the tracker. A failed node never stops the run;
//! it only takes its own subtree down with it.

mod markup;

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::Utc;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

pub use markup::*;

use crate::models::{
    CreatedIssue, HierarchyConfig, LinkOutcome, MaterializeReport, NodeError, NodeErrorKind,
    ParentRef, PlanNode, Role, Shape,
};
use crate::tracker::{CreateIssuePayload, ParentLink, ResolvedTypes, TrackerClient, TrackerError};

/// Default per-call timeout for tracker requests.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// A node that made it into the tracker during this run.
#[derive(Debug, Clone)]
struct CreatedNode {
    key: String,
    role: Role,
    display_name: String,
}

/// Walks a plan and creates each node under its already-created parent.
pub struct Materializer<'a, T: TrackerClient + ?Sized> {
    tracker: &'a T,
    config: &'a HierarchyConfig,
    types: &'a ResolvedTypes,
    call_timeout: Duration,
    cancel: CancellationToken,
}

impl<'a, T: TrackerClient + ?Sized> Materializer<'a, T> {
    pub fn new(tracker: &'a T, config: &'a HierarchyConfig, types: &'a ResolvedTypes) -> Self {
        Self {
            tracker,
            config,
            types,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Checked once before each node; nodes not yet attempted when the token
    /// fires are reported as cancelled.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Create every node of `plan`, in order.
    ///
    /// Parents must precede their children. Nodes whose planned parent is
    /// absent from `plan` or was not created are skipped, which cascades to
    /// their own descendants.
    pub async fn run(&self, plan: &[PlanNode]) -> MaterializeReport {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("materialize", %run_id, project = %self.config.project_key);
        self.run_inner(run_id, plan).instrument(span).await
    }

    async fn run_inner(&self, run_id: Uuid, plan: &[PlanNode]) -> MaterializeReport {
        let started_at = Utc::now();
        let mut created_nodes: HashMap<&str, CreatedNode> = HashMap::new();
        let mut created = Vec::new();
        let mut errors = Vec::new();
        let mut links = Vec::new();
        let mut cancelled = false;

        tracing::info!(nodes = plan.len(), "creating issues");

        for (index, node) in plan.iter().enumerate() {
            if self.cancel.is_cancelled() {
                tracing::warn!(remaining = plan.len() - index, "run cancelled");
                errors.extend(plan[index..].iter().map(|n| node_error(n, NodeErrorKind::Cancelled)));
                cancelled = true;
                break;
            }

            let parent = match &node.parent {
                Some(ParentRef::Node(parent_id)) => match created_nodes.get(parent_id.as_str()) {
                    Some(parent) => Some(parent.clone()),
                    None => {
                        tracing::warn!(node = %node.id, parent = %parent_id, "skipping node, parent was not created");
                        errors.push(node_error(
                            node,
                            NodeErrorKind::SkippedDueToMissingParent {
                                parent_id: parent_id.clone(),
                            },
                        ));
                        continue;
                    }
                },
                _ => None,
            };

            let payload = match self.build_payload(node, parent.as_ref()) {
                Ok(payload) => payload,
                Err(message) => {
                    tracing::error!(node = %node.id, "{}", message);
                    errors.push(node_error(node, NodeErrorKind::Create { status: None, message }));
                    continue;
                }
            };
            tracing::debug!(node = %node.id, payload = ?payload, "create payload");

            let issue = match self.call(self.tracker.create_issue(&payload)).await {
                Ok(issue) => issue,
                Err(e) => {
                    tracing::error!(node = %node.id, name = %node.display_name, error = %e, "failed to create issue");
                    errors.push(node_error(node, self.create_error_kind(&e)));
                    continue;
                }
            };

            tracing::info!(node = %node.id, key = %issue.key, role = %node.role, "created issue");
            let this = CreatedNode {
                key: issue.key.clone(),
                role: node.role,
                display_name: node.display_name.clone(),
            };
            created.push(CreatedIssue {
                key: issue.key.clone(),
                role: node.role,
                display_name: node.display_name.clone(),
                node_id: node.id.clone(),
                parent_key: payload.parent.as_ref().map(|p| p.key().to_string()),
                url: self.tracker.issue_url(&issue.key),
            });

            if let Some(kind) = self.update_feature_name(node, &issue.key, parent.as_ref()).await {
                errors.push(node_error(node, kind));
            }
            if let Some(outcome) = self.link_to_feature(node, &issue.key, parent.as_ref()).await {
                links.push(outcome);
            }

            created_nodes.insert(node.id.as_str(), this);
        }

        let report = MaterializeReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            planned: plan.len(),
            created,
            errors,
            links,
            cancelled,
        };
        tracing::info!("{}", report);
        report
    }

    fn build_payload(
        &self,
        node: &PlanNode,
        parent: Option<&CreatedNode>,
    ) -> Result<CreateIssuePayload, String> {
        let issue_type = self
            .types
            .get(node.role)
            .ok_or_else(|| format!("no issue type resolved for role {}", node.role))?;

        let parent_link = match (&node.parent, parent) {
            (Some(ParentRef::Node(_)), Some(parent)) => {
                Some(self.parent_link(parent.key.clone(), parent.role == Role::Epic))
            }
            (Some(ParentRef::External(key)), _) => {
                Some(self.parent_link(key.clone(), self.config.shape == Shape::Flat))
            }
            _ => None,
        };

        let description = node
            .content
            .as_deref()
            .map(|content| format_description(content, self.config.description_format));

        let mut custom_fields = BTreeMap::new();
        if let (Some(field), Some(text)) = (self.config.fields.content_field(node.role), &description) {
            custom_fields.insert(field.to_string(), Value::String(text.clone()));
        }
        if node.role == Role::Epic {
            if let Some(field) = &self.config.fields.epic_name {
                custom_fields.insert(field.clone(), Value::String(node.display_name.clone()));
            }
        }

        Ok(CreateIssuePayload {
            project_key: self.config.project_key.clone(),
            issue_type_id: issue_type.id.clone(),
            summary: node.display_name.clone(),
            description,
            parent: parent_link,
            custom_fields,
        })
    }

    /// Epic children go through the Epic Link field when one is configured.
    fn parent_link(&self, key: String, parent_is_epic: bool) -> ParentLink {
        match (&self.config.fields.epic_link, parent_is_epic) {
            (Some(field), true) => ParentLink::Field {
                field: field.clone(),
                key,
            },
            _ => ParentLink::Parent { key },
        }
    }

    /// Copy the enclosing feature's name onto a story, if configured.
    async fn update_feature_name(
        &self,
        node: &PlanNode,
        key: &str,
        parent: Option<&CreatedNode>,
    ) -> Option<NodeErrorKind> {
        let field = self.config.fields.feature_name.as_ref()?;
        if node.role != Role::Story {
            return None;
        }
        let feature_name = match parent {
            Some(parent) if parent.role == Role::Feature => &parent.display_name,
            _ => &node.display_name,
        };

        let mut fields = Map::new();
        fields.insert(field.clone(), Value::String(feature_name.clone()));
        match self.call(self.tracker.update_issue(key, &fields)).await {
            Ok(()) => None,
            Err(e) => {
                tracing::error!(%key, field = %field, error = %e, "failed to set feature name");
                Some(NodeErrorKind::Update {
                    status: e.status(),
                    message: e.to_string(),
                })
            }
        }
    }

    /// Best-effort "relates" link from a story back to its feature.
    async fn link_to_feature(
        &self,
        node: &PlanNode,
        key: &str,
        parent: Option<&CreatedNode>,
    ) -> Option<LinkOutcome> {
        let link_type = self.config.relates_link_type.as_deref()?;
        let feature = parent.filter(|p| node.role == Role::Story && p.role == Role::Feature)?;

        let error = match self
            .call(self.tracker.link_issues(key, &feature.key, link_type))
            .await
        {
            Ok(()) => {
                tracing::info!(from = %key, to = %feature.key, link_type, "linked issues");
                None
            }
            Err(e) => {
                tracing::warn!(from = %key, to = %feature.key, link_type, error = %e, "could not link issues");
                Some(e.to_string())
            }
        };
        Some(LinkOutcome {
            inward_key: key.to_string(),
            outward_key: feature.key.clone(),
            link_type: link_type.to_string(),
            error,
        })
    }

    /// Run one tracker call under the per-call timeout.
    async fn call<F, R>(&self, fut: F) -> Result<R, TrackerError>
    where
        F: std::future::Future<Output = Result<R, TrackerError>>,
    {
        tokio::time::timeout(self.call_timeout, fut)
            .await
            .unwrap_or(Err(TrackerError::Timeout(self.call_timeout)))
    }

    fn create_error_kind(&self, error: &TrackerError) -> NodeErrorKind {
        match error {
            TrackerError::Timeout(after) => NodeErrorKind::Timeout {
                seconds: after.as_secs(),
            },
            other => NodeErrorKind::Create {
                status: other.status(),
                message: other.to_string(),
            },
        }
    }
}

fn node_error(node: &PlanNode, kind: NodeErrorKind) -> NodeError {
    NodeError {
        node_id: node.id.clone(),
        display_name: node.display_name.clone(),
        kind,
    }
}
