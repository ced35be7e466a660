use serde::{Deserialize, Serialize};

use super::{Role, Shape};

/// Caller-supplied settings for planning and creating one issue tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyConfig {
    /// Jira project key, e.g. `PROJ`.
    #[serde(default)]
    pub project_key: String,
    #[serde(default)]
    pub shape: Shape,
    /// Existing issue the whole tree is rooted under: an Initiative for the
    /// deep shape, an Epic for the flat shape.
    #[serde(default)]
    pub parent_key: Option<String>,
    #[serde(default)]
    pub issue_types: IssueTypeNames,
    #[serde(default)]
    pub fields: FieldMapping,
    /// Link type used to relate each story back to its feature (deep shape only).
    /// `None` disables the link.
    #[serde(default = "default_relates_link")]
    pub relates_link_type: Option<String>,
    #[serde(default)]
    pub description_format: DescriptionFormat,
}

fn default_relates_link() -> Option<String> {
    Some("Relates".to_string())
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl HierarchyConfig {
    pub fn new(project_key: impl Into<String>) -> Self {
        Self {
            project_key: project_key.into(),
            shape: Shape::default(),
            parent_key: None,
            issue_types: IssueTypeNames::default(),
            fields: FieldMapping::default(),
            relates_link_type: default_relates_link(),
            description_format: DescriptionFormat::default(),
        }
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_parent_key(mut self, parent_key: impl Into<String>) -> Self {
        self.parent_key = Some(parent_key.into());
        self
    }

    /// Parent key with blank strings treated as absent.
    pub fn parent_key(&self) -> Option<&str> {
        self.parent_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// Configured issue type name (or id) for each creatable role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueTypeNames {
    pub epic: String,
    pub feature: String,
    pub story: String,
    pub subtask: String,
}

impl Default for IssueTypeNames {
    fn default() -> Self {
        Self {
            epic: "Epic".to_string(),
            feature: "Feature".to_string(),
            story: "Story".to_string(),
            subtask: "Sub-task".to_string(),
        }
    }
}

impl IssueTypeNames {
    pub fn for_role(&self, role: Role) -> &str {
        match role {
            Role::Epic => &self.epic,
            Role::Feature => &self.feature,
            Role::Story => &self.story,
            Role::Subtask => &self.subtask,
            Role::Initiative => "Initiative",
        }
    }
}

/// Which Jira fields receive content and linkage.
///
/// Content fields named `description` are not duplicated, since the
/// description is always set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
    pub feature_content: String,
    pub story_content: String,
    pub subtask_content: String,
    /// Custom field for the Epic Name, e.g. `customfield_10011`.
    pub epic_name: Option<String>,
    /// Custom field linking an issue to its epic, used instead of `parent`
    /// when set.
    pub epic_link: Option<String>,
    /// Custom field on stories that receives the enclosing feature's name.
    pub feature_name: Option<String>,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            feature_content: DESCRIPTION.to_string(),
            story_content: DESCRIPTION.to_string(),
            subtask_content: DESCRIPTION.to_string(),
            epic_name: None,
            epic_link: None,
            feature_name: None,
        }
    }
}

pub const DESCRIPTION: &str = "description";

impl FieldMapping {
    /// Extra custom field that duplicates the description for a role, if any.
    pub fn content_field(&self, role: Role) -> Option<&str> {
        let field = match role {
            Role::Feature => &self.feature_content,
            Role::Story => &self.story_content,
            Role::Subtask => &self.subtask_content,
            Role::Epic | Role::Initiative => return None,
        };
        let field = field.trim();
        (!field.is_empty() && field != DESCRIPTION).then_some(field)
    }
}

/// How node content is rendered into Jira wiki markup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionFormat {
    /// Gherkin keywords bolded in place.
    #[default]
    Markup,
    /// Content wrapped verbatim in a `{code:language=gherkin}` block.
    CodeBlock,
}
