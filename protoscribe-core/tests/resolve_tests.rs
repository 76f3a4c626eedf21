// Tests for traversal, transition resolution and extraction

use async_trait::async_trait;
use protoscribe_core::extract::extract_from_tree;
use protoscribe_core::resolve::{ImageSource, resolve_transitions};
use protoscribe_core::traverse::traverse;
use protoscribe_core::tree::PrototypeTree;
use protoscribe_fetch::{DesignNode, FetchError, NodeType};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Records every lookup and renders only the ids it was told about.
struct RecordingImages {
    known: HashSet<String>,
    key_suffix: &'static str,
    fail: bool,
    calls: Mutex<Vec<Vec<String>>>,
}

impl RecordingImages {
    fn knowing(ids: &[&str]) -> Self {
        Self {
            known: ids.iter().map(|id| id.to_string()).collect(),
            key_suffix: "",
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::knowing(&[])
        }
    }

    fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageSource for RecordingImages {
    async fn images(&self, node_ids: &[String]) -> Result<HashMap<String, String>, FetchError> {
        self.calls.lock().unwrap().push(node_ids.to_vec());
        if self.fail {
            return Err(FetchError::Other("render service down".to_string()));
        }
        Ok(node_ids
            .iter()
            .filter(|id| self.known.contains(id.as_str()))
            .map(|id| (format!("{}{}", id, self.key_suffix), img(id)))
            .collect())
    }
}

fn img(id: &str) -> String {
    format!("https://img.test/{}.png", id.replace(':', "-"))
}

/// Page
/// ├── Home (FRAME 1:1)
/// │   └── Card (1:5)
/// │       └── Buy (1:2;5:6) -> 2:1;9:9
/// └── Detail (FRAME 2:1)
///     └── Back (2:2) -> 1:1
fn two_screen_prototype() -> DesignNode {
    DesignNode::new("0:1", NodeType::Other, "Page")
        .with_child(
            DesignNode::new("1:1", NodeType::Frame, "Home").with_child(
                DesignNode::new("1:5", NodeType::Other, "Card").with_child(
                    DesignNode::new("1:2;5:6", NodeType::Other, "Buy")
                        .with_transition("2:1;9:9")
                        .with_transition_type("Dissolve"),
                ),
            ),
        )
        .with_child(
            DesignNode::new("2:1", NodeType::Frame, "Detail")
                .with_child(DesignNode::new("2:2", NodeType::Other, "Back").with_transition("1:1")),
        )
}

// ============================================================================
// Traversal Tests
// ============================================================================

#[test]
fn test_index_is_complete() {
    let traversal = traverse(&two_screen_prototype());
    for id in traversal.index.parented_ids() {
        assert!(traversal.index.name_of(id).is_some(), "no name for {}", id);
    }
    for id in traversal.index.frame_ids() {
        assert!(traversal.index.name_of(id).is_some());
    }
    assert_eq!(traversal.index.len(), 6);
}

#[test]
fn test_suffixed_ids_canonicalize() {
    let traversal = traverse(&two_screen_prototype());
    assert_eq!(traversal.index.name_of("1:2"), Some("Buy"));
    assert_eq!(traversal.edges[0].from_id, "1:2");
    assert_eq!(traversal.edges[0].to_id, "2:1");
    assert_eq!(traversal.edges[0].kind, "Dissolve");
    assert_eq!(traversal.edges[1].kind, "Instant");
}

// ============================================================================
// Resolution Tests
// ============================================================================

#[tokio::test]
async fn test_transition_to_non_frame_is_filtered() {
    let root = DesignNode::new("0:1", NodeType::Other, "Page")
        .with_child(
            DesignNode::new("1:1", NodeType::Frame, "A")
                .with_child(
                    DesignNode::new("1:2", NodeType::Other, "Button").with_transition("1:3"),
                ),
        )
        .with_child(DesignNode::new("1:3", NodeType::Other, "C"));

    let traversal = traverse(&root);
    assert_eq!(traversal.edges.len(), 1);

    let source = RecordingImages::knowing(&["1:1", "1:2", "1:3"]);
    let edges = resolve_transitions(traversal.edges, &traversal.index, &source).await;

    assert!(edges.is_empty());
    assert!(source.calls().is_empty());
}

#[tokio::test]
async fn test_resolves_element_and_frame_images() {
    let traversal = traverse(&two_screen_prototype());
    let source = RecordingImages::knowing(&["1:1", "1:2", "2:1", "2:2"]);
    let edges = resolve_transitions(traversal.edges, &traversal.index, &source).await;

    assert_eq!(edges.len(), 2);
    let buy = &edges[0];
    assert_eq!(buy.from_name, "Buy");
    assert_eq!(buy.to_name, "Detail");
    assert_eq!(buy.from_url, img("1:2"));
    assert_eq!(buy.to_url, img("2:1"));
    assert_eq!(buy.from_frame_url, img("1:1"));
    assert_eq!(buy.to_frame_url, img("2:1"));

    let back = &edges[1];
    assert_eq!(back.to_name, "Home");
    assert_eq!(back.from_frame_url, img("2:1"));

    let calls = source.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], vec!["1:1", "1:2", "2:1", "2:2"]);
    assert_eq!(calls[1], vec!["1:1", "2:1"]);
}

#[tokio::test]
async fn test_frame_image_falls_back_to_element_image() {
    let traversal = traverse(&two_screen_prototype());
    // 1:1 unknown: the Back edge's destination and the Buy edge's source frame both miss.
    let source = RecordingImages::knowing(&["1:2", "2:1", "2:2"]);
    let edges = resolve_transitions(traversal.edges, &traversal.index, &source).await;

    assert_eq!(edges[0].from_frame_url, edges[0].from_url);
    assert_eq!(edges[1].to_url, "");
    assert_eq!(edges[1].to_frame_url, "");
}

#[tokio::test]
async fn test_suffixed_response_keys_are_canonicalized() {
    let traversal = traverse(&two_screen_prototype());
    let source = RecordingImages {
        key_suffix: ";42:7",
        ..RecordingImages::knowing(&["1:1", "1:2", "2:1", "2:2"])
    };
    let edges = resolve_transitions(traversal.edges, &traversal.index, &source).await;

    assert_eq!(edges[0].from_url, img("1:2"));
    assert_eq!(edges[0].from_frame_url, img("1:1"));
}

#[tokio::test]
async fn test_render_failure_degrades_to_empty_urls() {
    let traversal = traverse(&two_screen_prototype());
    let source = RecordingImages::failing();
    let edges = resolve_transitions(traversal.edges, &traversal.index, &source).await;

    assert_eq!(edges.len(), 2);
    assert!(edges.iter().all(|e| e.from_url.is_empty() && e.from_frame_url.is_empty()));
    assert_eq!(source.calls().len(), 2);
}

// ============================================================================
// Extraction Tests
// ============================================================================

#[tokio::test]
async fn test_extract_from_tree_counts() {
    let tree = PrototypeTree::new(two_screen_prototype());
    let source = RecordingImages::knowing(&["1:1", "1:2", "2:1", "2:2"]);
    let extraction = extract_from_tree(&tree, "FILE", &source).await;

    assert_eq!(extraction.total_frames, 2);
    assert_eq!(extraction.total_interactions, 2);
    assert_eq!(extraction.frames[1].screen_name, "Detail");
}

#[tokio::test]
async fn test_extract_without_transitions_skips_image_lookups() {
    let tree = PrototypeTree::new(
        DesignNode::new("0:1", NodeType::Other, "Page")
            .with_child(DesignNode::new("1:1", NodeType::Frame, "Lonely")),
    );
    let source = RecordingImages::knowing(&["1:1"]);
    let extraction = extract_from_tree(&tree, "FILE", &source).await;

    assert_eq!(extraction.total_frames, 1);
    assert!(extraction.interactions.is_empty());
    assert!(source.calls().is_empty());
}

#[tokio::test]
async fn test_enriched_edge_serializes_kind_as_animation() {
    let traversal = traverse(&two_screen_prototype());
    let source = RecordingImages::knowing(&["1:1", "1:2", "2:1", "2:2"]);
    let edges = resolve_transitions(traversal.edges, &traversal.index, &source).await;

    let json = serde_json::to_value(&edges[0]).unwrap();
    assert_eq!(json["animation"], "Dissolve");
    assert_eq!(json["from_frame_url"], img("1:1"));
}
