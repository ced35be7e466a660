//! Hierarchy planning: parsed features in, an ordered preview of issues out.
//!
//! Planning never touches the network, so the same plan can be shown to the
//! user, edited (only its `selected` flags), and then handed to the
//! materializer unchanged.

mod select;
mod tree_render;

pub use select::*;
pub use tree_render::render_tree;

use crate::models::{Feature, HierarchyConfig, ParentRef, PlanNode, Role, Shape};

/// Prefix of every plan node id.
pub const NODE_ID_PREFIX: &str = "item-";

/// Id of the node at `index` (0-based) in pre-order.
pub fn node_id(index: usize) -> String {
    format!("{}{}", NODE_ID_PREFIX, index + 1)
}

/// Build the plan for `features` under the configured shape.
///
/// Deep: one root epic named `root_label`, a feature node per feature, a story
/// per scenario. Flat: a story per feature under the external parent, a
/// sub-task per scenario. Ids follow the pre-order position of each node, so
/// the output depends only on the inputs.
pub fn plan(features: &[Feature], config: &HierarchyConfig, root_label: &str) -> Vec<PlanNode> {
    let external_parent = config
        .parent_key()
        .map(|key| ParentRef::External(key.to_string()));

    let (feature_role, scenario_role) = match config.shape {
        Shape::Deep => (Role::Feature, Role::Story),
        Shape::Flat => (Role::Story, Role::Subtask),
    };

    let capacity = features.iter().map(Feature::node_count).sum::<usize>() + 1;
    let mut nodes: Vec<PlanNode> = Vec::with_capacity(capacity);

    let feature_parent = match config.shape {
        Shape::Deep => {
            let root_id = node_id(nodes.len());
            nodes.push(PlanNode {
                id: root_id.clone(),
                role: Role::Epic,
                display_name: root_label.to_string(),
                content: None,
                parent: external_parent,
                selected: true,
            });
            Some(ParentRef::Node(root_id))
        }
        Shape::Flat => external_parent,
    };

    for feature in features {
        let feature_id = node_id(nodes.len());
        nodes.push(PlanNode {
            id: feature_id.clone(),
            role: feature_role,
            display_name: feature.name.clone(),
            content: Some(feature.raw_content.clone()),
            parent: feature_parent.clone(),
            selected: true,
        });

        for scenario in &feature.scenarios {
            nodes.push(PlanNode {
                id: node_id(nodes.len()),
                role: scenario_role,
                display_name: scenario.name.clone(),
                content: Some(scenario.raw_content.clone()),
                parent: Some(ParentRef::Node(feature_id.clone())),
                selected: true,
            });
        }
    }

    tracing::debug!(nodes = nodes.len(), shape = config.shape.as_str(), "planned hierarchy");
    nodes
}
