// In-memory view of a fetched design subtree and the indices built over it

use crate::traverse::{Traversal, traverse};
use protoscribe_fetch::{DesignNode, FigmaClient, canonical_id};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A top-level screen of the fetched subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenFrame {
    pub screen_name: String,
    pub url: String,
    pub node_id: String,
}

/// Name, parent and frame lookups keyed by canonical node id.
#[derive(Debug, Clone, Default)]
pub struct NodeIndex {
    names: HashMap<String, String>,
    parents: HashMap<String, Option<String>>,
    frames: HashSet<String>,
}

impl NodeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a node. A later record for the same canonical id overwrites the earlier one.
    pub fn insert(&mut self, id: &str, name: &str, parent: Option<&str>, frame_like: bool) {
        self.names.insert(id.to_string(), name.to_string());
        self.parents
            .insert(id.to_string(), parent.map(str::to_string));
        if frame_like {
            self.frames.insert(id.to_string());
        }
    }

    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.parents.get(id).and_then(|p| p.as_deref())
    }

    pub fn is_frame(&self, id: &str) -> bool {
        self.frames.contains(id)
    }

    pub fn frame_ids(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().map(String::as_str)
    }

    /// Every id that has a recorded parent slot (including roots with none).
    pub fn parented_ids(&self) -> impl Iterator<Item = &str> {
        self.parents.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Nearest frame-like node on the parent chain, starting with `id` itself.
    ///
    /// Returns `id` unchanged when the chain ends, breaks, or loops without reaching a frame.
    pub fn ancestor_frame<'a>(&'a self, id: &'a str) -> &'a str {
        let mut visited = HashSet::new();
        let mut current = id;

        loop {
            if self.frames.contains(current) {
                return current;
            }
            if !visited.insert(current) {
                break;
            }
            match self.parent_of(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }

        id
    }
}

/// Owns the root node returned by the design service.
#[derive(Debug, Clone)]
pub struct PrototypeTree {
    root: DesignNode,
}

impl PrototypeTree {
    pub fn new(root: DesignNode) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &DesignNode {
        &self.root
    }

    /// Find a node by canonical id, in document order.
    pub fn find(&self, id: &str) -> Option<&DesignNode> {
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            if node.canonical_id() == canonical_id(id) {
                return Some(node);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    /// Frame-like direct children of the root; these are the screens of the prototype.
    pub fn screens(&self, file_key: &str) -> Vec<ScreenFrame> {
        self.root
            .children
            .iter()
            .filter(|child| child.node_type.is_frame_like())
            .map(|child| ScreenFrame {
                screen_name: child.name.clone(),
                url: FigmaClient::design_link(file_key, &child.id),
                node_id: child.id.clone(),
            })
            .collect()
    }

    pub fn traverse(&self) -> Traversal {
        traverse(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protoscribe_fetch::NodeType;

    fn sample_tree() -> PrototypeTree {
        PrototypeTree::new(
            DesignNode::new("0:1", NodeType::Other, "Page")
                .with_child(
                    DesignNode::new("1:1", NodeType::Frame, "Home")
                        .with_child(DesignNode::new("1:2", NodeType::Other, "Buy")),
                )
                .with_child(DesignNode::new("2:1", NodeType::Section, "Checkout"))
                .with_child(DesignNode::new("3:1", NodeType::Other, "Sticky note")),
        )
    }

    #[test]
    fn test_screens_lists_top_level_frames() {
        let screens = sample_tree().screens("FILE");
        let names: Vec<&str> = screens.iter().map(|s| s.screen_name.as_str()).collect();
        assert_eq!(names, vec!["Home", "Checkout"]);
        assert_eq!(
            screens[0].url,
            "https://www.figma.com/file/FILE/?type=design&node-id=1:1"
        );
    }

    #[test]
    fn test_find_by_canonical_id() {
        let tree = sample_tree();
        assert_eq!(tree.find("1:2").map(|n| n.name.as_str()), Some("Buy"));
        assert_eq!(tree.find("1:2;77:1").map(|n| n.name.as_str()), Some("Buy"));
        assert!(tree.find("9:9").is_none());
    }

    #[test]
    fn test_ancestor_frame_walks_up() {
        let mut index = NodeIndex::new();
        index.insert("1:1", "Home", None, true);
        index.insert("1:2", "Card", Some("1:1"), false);
        index.insert("1:3", "Buy", Some("1:2"), false);

        assert_eq!(index.ancestor_frame("1:3"), "1:1");
        assert_eq!(index.ancestor_frame("1:1"), "1:1");
    }

    #[test]
    fn test_ancestor_frame_without_frame_returns_input() {
        let mut index = NodeIndex::new();
        index.insert("1:1", "Group", None, false);
        index.insert("1:2", "Buy", Some("1:1"), false);

        assert_eq!(index.ancestor_frame("1:2"), "1:2");
        assert_eq!(index.ancestor_frame("unknown"), "unknown");
    }

    #[test]
    fn test_ancestor_frame_terminates_on_cycle() {
        let mut index = NodeIndex::new();
        index.insert("a", "A", Some("b"), false);
        index.insert("b", "B", Some("c"), false);
        index.insert("c", "C", Some("a"), false);

        assert_eq!(index.ancestor_frame("a"), "a");
        assert_eq!(index.ancestor_frame("c"), "c");
    }
}
