use crate::tree::NodeIndex;
use protoscribe_fetch::{DesignNode, canonical_id};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TRANSITION_KIND: &str = "Instant";

/// A prototype link as discovered, before its destination has been validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEdge {
    pub from_id: String,
    pub from_name: String,
    pub to_id: String,
    pub kind: String,
}

/// Everything one pass over the tree produces.
#[derive(Debug, Clone, Default)]
pub struct Traversal {
    pub index: NodeIndex,
    /// Pre-order document order; later grouping relies on it.
    pub edges: Vec<RawEdge>,
}

/// Walk the tree depth-first in pre-order, recording every node and every transition.
///
/// Uses an explicit stack so deep documents cannot overflow, pushing children in reverse so
/// they pop in declared order.
pub fn traverse(root: &DesignNode) -> Traversal {
    let mut traversal = Traversal::default();
    let mut stack: Vec<(&DesignNode, Option<&str>)> = vec![(root, None)];

    while let Some((node, parent)) = stack.pop() {
        let id = node.canonical_id();
        traversal
            .index
            .insert(id, &node.name, parent, node.node_type.is_frame_like());

        if let Some(target) = node.transition_node_id.as_deref().filter(|t| !t.is_empty()) {
            traversal.edges.push(RawEdge {
                from_id: id.to_string(),
                from_name: node.name.clone(),
                to_id: canonical_id(target).to_string(),
                kind: node
                    .transition_type
                    .clone()
                    .unwrap_or_else(|| DEFAULT_TRANSITION_KIND.to_string()),
            });
        }

        stack.extend(node.children.iter().rev().map(|child| (child, Some(id))));
    }

    traversal
}
