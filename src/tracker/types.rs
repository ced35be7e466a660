//! Wire types exchanged with the issue tracker.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// An issue type configured for a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueType {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subtask: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Identity of an issue the tracker just created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRef {
    pub id: String,
    pub key: String,
}

/// How a new issue is attached to its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "via", rename_all = "snake_case")]
pub enum ParentLink {
    /// The standard `parent` field.
    Parent { key: String },
    /// A custom field such as the classic Epic Link.
    Field { field: String, key: String },
}

impl ParentLink {
    pub fn key(&self) -> &str {
        match self {
            Self::Parent { key } | Self::Field { key, .. } => key,
        }
    }
}

/// Everything needed to create one issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateIssuePayload {
    pub project_key: String,
    pub issue_type_id: String,
    pub summary: String,
    pub description: Option<String>,
    pub parent: Option<ParentLink>,
    /// Extra fields keyed by field id, e.g. `customfield_10011`.
    #[serde(default)]
    pub custom_fields: BTreeMap<String, Value>,
}

impl CreateIssuePayload {
    /// The `fields` object of a Jira create request.
    pub fn fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("project".into(), json!({ "key": self.project_key }));
        fields.insert("issuetype".into(), json!({ "id": self.issue_type_id }));
        fields.insert("summary".into(), Value::String(self.summary.clone()));
        if let Some(description) = &self.description {
            fields.insert("description".into(), Value::String(description.clone()));
        }
        match &self.parent {
            Some(ParentLink::Parent { key }) => {
                fields.insert("parent".into(), json!({ "key": key }));
            }
            Some(ParentLink::Field { field, key }) => {
                fields.insert(field.clone(), Value::String(key.clone()));
            }
            None => {}
        }
        for (field, value) in &self.custom_fields {
            fields.insert(field.clone(), value.clone());
        }
        fields
    }
}

/// Options for an issue search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub max_results: u32,
    pub fields: Vec<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_results: 100,
            fields: vec!["key".into(), "summary".into(), "issuetype".into()],
        }
    }
}

/// A search hit, flattened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSummary {
    pub id: String,
    pub key: String,
    pub summary: String,
    pub issue_type: String,
}

/// The authenticated user, for connection checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerUser {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    pub display_name: String,
    #[serde(default)]
    pub email_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerProject {
    pub id: String,
    pub key: String,
    pub name: String,
}

/// A field definition, used to find Epic Name / Epic Link custom fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerField {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub custom: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_with_parent() {
        let payload = CreateIssuePayload {
            project_key: "PROJ".into(),
            issue_type_id: "10001".into(),
            summary: "Login".into(),
            description: Some("Feature: Login".into()),
            parent: Some(ParentLink::Parent { key: "PROJ-1".into() }),
            custom_fields: BTreeMap::from([("customfield_10577".into(), json!("Feature: Login"))]),
        };

        let fields = Value::Object(payload.fields());
        assert_eq!(fields["project"]["key"], "PROJ");
        assert_eq!(fields["issuetype"]["id"], "10001");
        assert_eq!(fields["parent"]["key"], "PROJ-1");
        assert_eq!(fields["customfield_10577"], "Feature: Login");
    }

    #[test]
    fn test_fields_with_epic_link() {
        let payload = CreateIssuePayload {
            project_key: "PROJ".into(),
            issue_type_id: "10001".into(),
            summary: "Login".into(),
            description: None,
            parent: Some(ParentLink::Field {
                field: "customfield_10010".into(),
                key: "PROJ-1".into(),
            }),
            custom_fields: BTreeMap::new(),
        };

        let fields = payload.fields();
        assert!(!fields.contains_key("parent"));
        assert!(!fields.contains_key("description"));
        assert_eq!(fields["customfield_10010"], "PROJ-1");
    }
}
