use crate::resolve::EnrichedEdge;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// One clickable element of a screen and where it leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementInteraction {
    pub from_name: String,
    pub to_name: String,
    pub from_url: String,
    pub to_url: String,
    pub animation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameEntry {
    pub elements: Vec<ElementInteraction>,
}

/// Screen image URL -> the interactions that start on that screen, in discovery order.
pub type FrameRegistry = IndexMap<String, FrameEntry>;

/// Group transitions by the image of the screen they start on.
///
/// Transitions whose screen image could not be resolved have nowhere to live and are skipped.
pub fn build_registry(edges: &[EnrichedEdge]) -> FrameRegistry {
    let mut registry = FrameRegistry::new();

    if edges.is_empty() {
        warn!("No prototype interactions to preprocess");
        return registry;
    }

    for edge in edges {
        if edge.from_frame_url.is_empty() {
            continue;
        }
        registry
            .entry(edge.from_frame_url.clone())
            .or_default()
            .elements
            .push(ElementInteraction {
                from_name: edge.from_name.clone(),
                to_name: edge.to_name.clone(),
                from_url: edge.from_url.clone(),
                to_url: edge.to_url.clone(),
                animation: edge.kind.clone(),
            });
    }

    info!("Processed {} unique frames", registry.len());
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(from_frame: &str, from: &str, to: &str) -> EnrichedEdge {
        EnrichedEdge {
            from_id: format!("id-{from}"),
            from_name: from.to_string(),
            to_id: format!("id-{to}"),
            to_name: to.to_string(),
            kind: "Instant".to_string(),
            from_url: format!("https://img/{from}.png"),
            to_url: format!("https://img/{to}.png"),
            from_frame_url: from_frame.to_string(),
            to_frame_url: String::new(),
        }
    }

    #[test]
    fn test_registry_keeps_discovery_order() {
        let edges = vec![
            edge("https://img/b.png", "b1", "x"),
            edge("https://img/a.png", "a1", "y"),
            edge("https://img/b.png", "b2", "z"),
        ];
        let registry = build_registry(&edges);

        let keys: Vec<&str> = registry.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["https://img/b.png", "https://img/a.png"]);
        assert_eq!(registry["https://img/b.png"].elements.len(), 2);
        assert_eq!(registry["https://img/b.png"].elements[1].from_name, "b2");
    }

    #[test]
    fn test_registry_skips_missing_frame_url() {
        let registry = build_registry(&[edge("", "orphan", "x")]);
        assert!(registry.is_empty());
    }
}
