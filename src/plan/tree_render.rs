//! ASCII tree rendering for plan previews.

use std::collections::{HashMap, HashSet};

use crate::models::{ParentRef, PlanNode};

const SELECTED: char = '●';
const UNSELECTED: char = '○';

fn selection_symbol(node: &PlanNode) -> char {
    if node.selected {
        SELECTED
    } else {
        UNSELECTED
    }
}

fn node_label(node: &PlanNode) -> String {
    format!(
        "{} {}: {} [{}]",
        selection_symbol(node),
        node.role.label(),
        node.display_name,
        node.id
    )
}

/// Render a plan as ASCII art with selection symbols.
///
/// Example output:
/// ```text
/// PROJ-7 (existing)
/// └── ● Epic: Checkout [item-1]
///     ├── ● Feature: Login [item-2]
///     │   └── ○ Story: Valid password [item-3]
///     └── ● Feature: Logout [item-4]
/// ```
pub fn render_tree(plan: &[PlanNode]) -> String {
    let ids: HashSet<&str> = plan.iter().map(|n| n.id.as_str()).collect();
    let mut children: HashMap<&str, Vec<&PlanNode>> = HashMap::new();
    let mut top_level: Vec<&PlanNode> = Vec::new();

    for node in plan {
        match &node.parent {
            Some(ParentRef::Node(parent)) if ids.contains(parent.as_str()) => {
                children.entry(parent.as_str()).or_default().push(node);
            }
            _ => top_level.push(node),
        }
    }

    let mut output = String::new();
    let mut current_external: Option<&str> = None;
    for (i, node) in top_level.iter().enumerate() {
        match &node.parent {
            Some(ParentRef::External(key)) => {
                if current_external != Some(key.as_str()) {
                    output.push_str(key);
                    output.push_str(" (existing)\n");
                    current_external = Some(key.as_str());
                }
                let is_last = top_level
                    .get(i + 1)
                    .is_none_or(|next| next.parent.as_ref() != node.parent.as_ref());
                render_node(&mut output, node, &children, "", is_last, false);
            }
            _ => {
                current_external = None;
                render_node(&mut output, node, &children, "", true, true);
            }
        }
    }
    output
}

/// Recursively render a node and its children.
fn render_node(
    output: &mut String,
    node: &PlanNode,
    children: &HashMap<&str, Vec<&PlanNode>>,
    prefix: &str,
    is_last: bool,
    is_root: bool,
) {
    if is_root {
        output.push_str(&node_label(node));
        output.push('\n');
    } else {
        let branch = if is_last { "└── " } else { "├── " };
        output.push_str(prefix);
        output.push_str(branch);
        output.push_str(&node_label(node));
        output.push('\n');
    }

    let child_prefix = if is_root {
        String::new()
    } else {
        let continuation = if is_last { "    " } else { "│   " };
        format!("{}{}", prefix, continuation)
    };

    if let Some(kids) = children.get(node.id.as_str()) {
        for (i, child) in kids.iter().enumerate() {
            let child_is_last = i == kids.len() - 1;
            render_node(output, child, children, &child_prefix, child_is_last, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn make_node(id: &str, role: Role, name: &str, parent: Option<ParentRef>) -> PlanNode {
        PlanNode {
            id: id.to_string(),
            role,
            display_name: name.to_string(),
            content: None,
            parent,
            selected: true,
        }
    }

    fn child_of(id: &str) -> Option<ParentRef> {
        Some(ParentRef::Node(id.to_string()))
    }

    #[test]
    fn test_single_root() {
        let plan = vec![make_node("item-1", Role::Epic, "Checkout", None)];
        assert_eq!(render_tree(&plan), "● Epic: Checkout [item-1]\n");
    }

    #[test]
    fn test_nested_children() {
        let mut plan = vec![
            make_node("item-1", Role::Epic, "Checkout", None),
            make_node("item-2", Role::Feature, "Login", child_of("item-1")),
            make_node("item-3", Role::Story, "Valid password", child_of("item-2")),
            make_node("item-4", Role::Feature, "Logout", child_of("item-1")),
        ];
        plan[2].selected = false;

        let expected = "● Epic: Checkout [item-1]\n\
├── ● Feature: Login [item-2]\n\
│   └── ○ Story: Valid password [item-3]\n\
└── ● Feature: Logout [item-4]\n";
        assert_eq!(render_tree(&plan), expected);
    }

    #[test]
    fn test_external_parent_header() {
        let external = Some(ParentRef::External("PROJ-7".to_string()));
        let plan = vec![
            make_node("item-1", Role::Story, "Login", external.clone()),
            make_node("item-2", Role::Subtask, "Valid password", child_of("item-1")),
            make_node("item-3", Role::Story, "Logout", external),
        ];

        let expected = "PROJ-7 (existing)\n\
├── ● Story: Login [item-1]\n\
│   └── ● Sub-task: Valid password [item-2]\n\
└── ● Story: Logout [item-3]\n";
        assert_eq!(render_tree(&plan), expected);
    }
}
