use std::collections::HashSet;

use crate::models::PlanNode;

/// Keep only the nodes whose id is in `selected_ids`, in plan order.
///
/// An empty set selects everything. Children of dropped nodes are kept; the
/// materializer skips them when it finds their parent missing.
pub fn filter(plan: &[PlanNode], selected_ids: &HashSet<String>) -> Vec<PlanNode> {
    if selected_ids.is_empty() {
        return plan.to_vec();
    }
    plan.iter()
        .filter(|node| selected_ids.contains(&node.id))
        .cloned()
        .collect()
}

/// Set every node's `selected` flag from `selected_ids`.
pub fn apply_selection(plan: &mut [PlanNode], selected_ids: &HashSet<String>) {
    for node in plan.iter_mut() {
        node.selected = selected_ids.contains(&node.id);
    }
}

/// Nodes whose `selected` flag is set.
pub fn selected_nodes(plan: &[PlanNode]) -> Vec<PlanNode> {
    plan.iter().filter(|node| node.selected).cloned().collect()
}

/// Ids in `selected_ids` that do not appear in the plan.
pub fn unknown_ids<'a>(plan: &[PlanNode], selected_ids: &'a HashSet<String>) -> Vec<&'a str> {
    let known: HashSet<&str> = plan.iter().map(|n| n.id.as_str()).collect();
    let mut unknown: Vec<&str> = selected_ids
        .iter()
        .map(String::as_str)
        .filter(|id| !known.contains(id))
        .collect();
    unknown.sort_unstable();
    unknown
}

/// Selected nodes whose planned parent is not part of the selection.
///
/// These can never be created, since their parent will not exist; callers
/// surface them as warnings before creation starts.
pub fn orphaned_selections<'a>(
    plan: &'a [PlanNode],
    selected_ids: &HashSet<String>,
) -> Vec<&'a PlanNode> {
    if selected_ids.is_empty() {
        return Vec::new();
    }
    plan.iter()
        .filter(|node| selected_ids.contains(&node.id))
        .filter(|node| {
            node.parent_node_id()
                .is_some_and(|parent| !selected_ids.contains(parent))
        })
        .collect()
}

/// Ids of every node below `id` in the plan, in plan order.
pub fn descendants(plan: &[PlanNode], id: &str) -> Vec<String> {
    let mut below: HashSet<&str> = HashSet::from([id]);
    let mut out = Vec::new();
    for node in plan {
        if node.parent_node_id().is_some_and(|p| below.contains(p)) {
            below.insert(&node.id);
            out.push(node.id.clone());
        }
    }
    out
}
