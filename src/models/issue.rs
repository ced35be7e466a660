use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;

/// An issue the materializer created. Never modified after it is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedIssue {
    pub key: String,
    pub role: Role,
    pub display_name: String,
    /// The plan node this issue was created from.
    pub node_id: String,
    pub parent_key: Option<String>,
    pub url: String,
}

/// A plan node that did not end up (fully) created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeError {
    pub node_id: String,
    pub display_name: String,
    #[serde(flatten)]
    pub kind: NodeErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeErrorKind {
    /// The create call was rejected or failed in transport.
    Create { status: Option<u16>, message: String },
    /// The issue exists but a follow-up field update failed.
    Update { status: Option<u16>, message: String },
    /// The create call did not answer in time.
    Timeout { seconds: u64 },
    /// Never attempted: the planned parent was not created.
    SkippedDueToMissingParent { parent_id: String },
    /// Never attempted: the run was cancelled first.
    Cancelled,
}

impl NodeError {
    /// True for nodes that were never attempted.
    pub fn is_skip(&self) -> bool {
        matches!(
            self.kind,
            NodeErrorKind::SkippedDueToMissingParent { .. } | NodeErrorKind::Cancelled
        )
    }

    /// True when the node's issue was not created at all.
    pub fn blocks_children(&self) -> bool {
        !matches!(self.kind, NodeErrorKind::Update { .. })
    }
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \"{}\": ", self.node_id, self.display_name)?;
        match &self.kind {
            NodeErrorKind::Create { status, message } => match status {
                Some(code) => write!(f, "create failed ({}): {}", code, message),
                None => write!(f, "create failed: {}", message),
            },
            NodeErrorKind::Update { status, message } => match status {
                Some(code) => write!(f, "created, field update failed ({}): {}", code, message),
                None => write!(f, "created, field update failed: {}", message),
            },
            NodeErrorKind::Timeout { seconds } => {
                write!(f, "create timed out after {}s", seconds)
            }
            NodeErrorKind::SkippedDueToMissingParent { parent_id } => {
                write!(f, "skipped, parent {} was not created", parent_id)
            }
            NodeErrorKind::Cancelled => f.write_str("skipped, run cancelled"),
        }
    }
}

/// Outcome of a best-effort "relates" link. Logged, never escalated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkOutcome {
    pub inward_key: String,
    pub outward_key: String,
    pub link_type: String,
    pub error: Option<String>,
}

/// Everything one materialization run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterializeReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Number of nodes handed to the materializer.
    pub planned: usize,
    pub created: Vec<CreatedIssue>,
    pub errors: Vec<NodeError>,
    pub links: Vec<LinkOutcome>,
    pub cancelled: bool,
}

impl MaterializeReport {
    /// Nodes whose create call was attempted and failed.
    pub fn failed(&self) -> impl Iterator<Item = &NodeError> {
        self.errors
            .iter()
            .filter(|e| !e.is_skip() && e.blocks_children())
    }

    /// Created issues whose follow-up field update failed.
    pub fn incomplete(&self) -> impl Iterator<Item = &NodeError> {
        self.errors.iter().filter(|e| !e.blocks_children())
    }

    /// Nodes that were never attempted.
    pub fn skipped(&self) -> impl Iterator<Item = &NodeError> {
        self.errors.iter().filter(|e| e.is_skip())
    }

    pub fn is_complete(&self) -> bool {
        self.errors.is_empty() && !self.cancelled
    }
}

impl fmt::Display for MaterializeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created {} of {} planned issues",
            self.created.len(),
            self.planned
        )?;
        let failed = self.failed().count();
        if failed > 0 {
            write!(f, "; {} failed", failed)?;
        }
        let orphaned = self
            .errors
            .iter()
            .filter(|e| matches!(e.kind, NodeErrorKind::SkippedDueToMissingParent { .. }))
            .count();
        if orphaned > 0 {
            write!(
                f,
                "; {} skipped because their parent was not created",
                orphaned
            )?;
        }
        let incomplete = self.incomplete().count();
        if incomplete > 0 {
            write!(f, "; {} created with field update errors", incomplete)?;
        }
        if self.cancelled {
            f.write_str("; cancelled")?;
        }
        Ok(())
    }
}
