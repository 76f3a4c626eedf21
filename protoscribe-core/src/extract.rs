// Prototype extraction: fetch the document tree, traverse it, resolve transition images

use crate::error::Result;
use crate::resolve::{EnrichedEdge, FigmaImages, ImageSource, resolve_transitions};
use crate::traverse::Traversal;
use crate::tree::{PrototypeTree, ScreenFrame};
use protoscribe_fetch::FigmaClient;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Screens and navigable transitions of one prototype subtree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrototypeExtraction {
    pub frames: Vec<ScreenFrame>,
    pub interactions: Vec<EnrichedEdge>,
    pub total_frames: usize,
    pub total_interactions: usize,
}

/// Build the extraction for an already fetched tree.
pub async fn extract_from_tree(
    tree: &PrototypeTree,
    file_key: &str,
    images: &dyn ImageSource,
) -> PrototypeExtraction {
    let frames = tree.screens(file_key);
    let Traversal { index, edges } = tree.traverse();
    info!(
        "Traversed {} nodes, found {} raw transitions",
        index.len(),
        edges.len()
    );

    let interactions = resolve_transitions(edges, &index, images).await;

    PrototypeExtraction {
        total_frames: frames.len(),
        total_interactions: interactions.len(),
        frames,
        interactions,
    }
}

/// Fetch `node_id` from `file_key` and extract it.
///
/// Only a failed document fetch (after the client's own retries) is an error; every later
/// failure degrades to empty values inside the result.
pub async fn extract_prototype(
    client: &FigmaClient,
    file_key: &str,
    node_id: &str,
) -> Result<PrototypeExtraction> {
    let root = client.fetch_node_tree(file_key, node_id).await?;
    let tree = PrototypeTree::new(root);
    let images = FigmaImages::new(client, file_key);

    let extraction = extract_from_tree(&tree, file_key, &images).await;
    info!(
        "Extracted {} screens and {} interactions",
        extraction.total_frames, extraction.total_interactions
    );
    Ok(extraction)
}
