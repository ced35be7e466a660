//! Mapping abstract roles onto a project's configured issue types.

use std::collections::{BTreeSet, HashMap};

use crate::error::{Error, ResolveError};
use crate::models::{HierarchyConfig, Role};

use super::{IssueType, TrackerClient, TrackerField};

/// Substrings tried, in order, when no type matches the configured name.
fn role_keywords(role: Role) -> &'static [&'static str] {
    match role {
        Role::Initiative => &["initiative"],
        Role::Epic => &["epic"],
        Role::Feature => &["feature", "story"],
        Role::Story => &["story", "task"],
        Role::Subtask => &["sub-task", "subtask"],
    }
}

/// Pick the issue type for `role`.
///
/// Order: exact (case-insensitive) name or id match on `configured`, then the
/// role's substring heuristics, then, for sub-tasks only, any type flagged as
/// a sub-task. Heuristics for other roles ignore sub-task types.
pub fn resolve_role<'a>(
    role: Role,
    configured: &str,
    types: &'a [IssueType],
) -> Result<&'a IssueType, ResolveError> {
    let configured = configured.trim();
    let exact = types
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(configured) || t.id == configured);
    if let Some(found) = exact {
        return Ok(found);
    }

    let candidates = || {
        types
            .iter()
            .filter(move |t| role == Role::Subtask || !t.subtask)
    };
    for keyword in role_keywords(role) {
        if let Some(found) = candidates().find(|t| t.name.to_lowercase().contains(keyword)) {
            return Ok(found);
        }
    }

    if role == Role::Subtask {
        if let Some(found) = types.iter().find(|t| t.subtask) {
            return Ok(found);
        }
    }

    Err(ResolveError::TypeNotFound {
        role,
        configured: configured.to_string(),
        available: types.iter().map(|t| t.name.clone()).collect(),
    })
}

/// Issue types chosen for the roles of one run.
#[derive(Debug, Clone, Default)]
pub struct ResolvedTypes {
    types: HashMap<Role, IssueType>,
}

impl ResolvedTypes {
    pub fn get(&self, role: Role) -> Option<&IssueType> {
        self.types.get(&role)
    }

    pub fn insert(&mut self, role: Role, issue_type: IssueType) {
        self.types.insert(role, issue_type);
    }
}

/// Fetch the project's issue types once and resolve each requested role.
///
/// Fails on the first role without a match, before anything is created.
pub async fn resolve_types<T, I>(
    tracker: &T,
    config: &HierarchyConfig,
    roles: I,
) -> Result<ResolvedTypes, Error>
where
    T: TrackerClient + ?Sized,
    I: IntoIterator<Item = Role>,
{
    let roles: BTreeSet<Role> = roles.into_iter().collect();
    let mut resolved = ResolvedTypes::default();
    if roles.is_empty() {
        return Ok(resolved);
    }

    let available = tracker.get_project_issue_types(&config.project_key).await?;
    tracing::debug!(
        project = %config.project_key,
        types = ?available.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
        "fetched project issue types"
    );

    for role in roles {
        let issue_type = resolve_role(role, config.issue_types.for_role(role), &available)?;
        tracing::info!(role = %role, issue_type = %issue_type.name, id = %issue_type.id, "resolved issue type");
        resolved.insert(role, issue_type.clone());
    }
    Ok(resolved)
}

/// Custom fields that look like Epic Name / Epic Link fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpicFieldCandidates {
    pub epic_name: Vec<TrackerField>,
    pub epic_link: Vec<TrackerField>,
}

/// Find fields whose names mention both "epic" and "name" (or "link").
pub fn epic_field_candidates(fields: &[TrackerField]) -> EpicFieldCandidates {
    let mentions = |field: &TrackerField, word: &str| {
        let name = field.name.to_lowercase();
        name.contains("epic") && name.contains(word)
    };
    EpicFieldCandidates {
        epic_name: fields.iter().filter(|f| mentions(f, "name")).cloned().collect(),
        epic_link: fields.iter().filter(|f| mentions(f, "link")).cloned().collect(),
    }
}
