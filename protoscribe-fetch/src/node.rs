use serde::{Deserialize, Serialize};

/// Figma node kinds the pipeline cares about. Everything else folds into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    Frame,
    Section,
    #[default]
    #[serde(other)]
    Other,
}

impl NodeType {
    /// Frames and sections are the screens a transition may land on.
    pub fn is_frame_like(self) -> bool {
        matches!(self, NodeType::Frame | NodeType::Section)
    }
}

/// One node of a design document as returned by the Figma nodes endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignNode {
    pub id: String,
    #[serde(rename = "type", default)]
    pub node_type: NodeType,
    #[serde(default = "unnamed")]
    pub name: String,
    #[serde(
        rename = "transitionNodeID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub transition_node_id: Option<String>,
    #[serde(
        rename = "transitionType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub transition_type: Option<String>,
    #[serde(default)]
    pub children: Vec<DesignNode>,
}

fn unnamed() -> String {
    "Unnamed".to_string()
}

impl DesignNode {
    pub fn new(id: impl Into<String>, node_type: NodeType, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type,
            name: name.into(),
            transition_node_id: None,
            transition_type: None,
            children: Vec::new(),
        }
    }

    pub fn with_transition(mut self, target: impl Into<String>) -> Self {
        self.transition_node_id = Some(target.into());
        self
    }

    pub fn with_transition_type(mut self, kind: impl Into<String>) -> Self {
        self.transition_type = Some(kind.into());
        self
    }

    pub fn with_child(mut self, child: DesignNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn canonical_id(&self) -> &str {
        canonical_id(&self.id)
    }
}

/// Strip the instance suffix Figma appends after `;` so ids can be used as map keys.
pub fn canonical_id(raw: &str) -> &str {
    match raw.split_once(';') {
        Some((head, _)) => head,
        None => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_id_strips_suffix() {
        assert_eq!(canonical_id("12:34;56:78"), "12:34");
        assert_eq!(canonical_id("12:34;56:78;9:1"), "12:34");
        assert_eq!(canonical_id("12:34"), "12:34");
    }

    #[test]
    fn test_deserialize_figma_node() {
        let json = r#"{
            "id": "1:2",
            "type": "FRAME",
            "name": "Login",
            "children": [
                {"id": "1:3", "type": "INSTANCE", "name": "Button",
                 "transitionNodeID": "1:9", "transitionType": "SMART_ANIMATE"},
                {"id": "1:4", "type": "TEXT"}
            ]
        }"#;
        let node: DesignNode = serde_json::from_str(json).unwrap();

        assert_eq!(node.node_type, NodeType::Frame);
        assert_eq!(node.children.len(), 2);
        assert_eq!(node.children[0].node_type, NodeType::Other);
        assert_eq!(node.children[0].transition_node_id.as_deref(), Some("1:9"));
        assert_eq!(node.children[0].transition_type.as_deref(), Some("SMART_ANIMATE"));
        assert_eq!(node.children[1].name, "Unnamed");
        assert!(node.children[1].children.is_empty());
    }

    #[test]
    fn test_section_is_frame_like() {
        assert!(NodeType::Section.is_frame_like());
        assert!(NodeType::Frame.is_frame_like());
        assert!(!NodeType::Other.is_frame_like());
    }
}
