use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The abstract hierarchy level of a planned issue, independent of the issue
/// type names a Jira project actually uses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Pre-existing issue above the planned tree. Never created.
    Initiative,
    Epic,
    Feature,
    Story,
    Subtask,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initiative => "initiative",
            Self::Epic => "epic",
            Self::Feature => "feature",
            Self::Story => "story",
            Self::Subtask => "subtask",
        }
    }

    /// Human-facing label, matching Jira's default type names.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Initiative => "Initiative",
            Self::Epic => "Epic",
            Self::Feature => "Feature",
            Self::Story => "Story",
            Self::Subtask => "Sub-task",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which tree topology a run produces.
///
/// - `Deep`: Initiative (existing) → Epic → Feature → Story
/// - `Flat`: Epic (existing) → Story → Sub-task
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    #[default]
    #[serde(alias = "level3")]
    Deep,
    #[serde(alias = "level2")]
    Flat,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deep => "deep",
            Self::Flat => "flat",
        }
    }

    /// Role of the externally supplied parent issue, if one is given.
    pub fn parent_role(&self) -> Role {
        match self {
            Self::Deep => Role::Initiative,
            Self::Flat => Role::Epic,
        }
    }
}

impl FromStr for Shape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "deep" | "level3" => Ok(Self::Deep),
            "flat" | "level2" => Ok(Self::Flat),
            other => Err(format!(
                "unknown shape '{}', expected deep (level3) or flat (level2)",
                other
            )),
        }
    }
}

/// Where a planned node hangs in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ParentRef {
    /// Another node earlier in the same plan.
    Node(String),
    /// An issue that already exists in the tracker.
    External(String),
}

impl ParentRef {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Node(id) | Self::External(id) => id,
        }
    }
}

/// One issue-to-be in a preview.
///
/// Ids are `item-N` where N is the node's 1-based position in a pre-order walk
/// of the parsed document, so a selection made against one preview stays valid
/// for any plan regenerated from the same document and configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanNode {
    pub id: String,
    pub role: Role,
    pub display_name: String,
    pub content: Option<String>,
    pub parent: Option<ParentRef>,
    #[serde(default = "default_true")]
    pub selected: bool,
}

fn default_true() -> bool {
    true
}

impl PlanNode {
    pub fn parent_id(&self) -> Option<&str> {
        self.parent.as_ref().map(ParentRef::as_str)
    }

    /// The id of the planned parent, ignoring external parents.
    pub fn parent_node_id(&self) -> Option<&str> {
        match &self.parent {
            Some(ParentRef::Node(id)) => Some(id),
            _ => None,
        }
    }
}
