use crate::traverse::RawEdge;
use crate::tree::NodeIndex;
use async_trait::async_trait;
use protoscribe_fetch::{FetchError, FigmaClient, canonical_id};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

pub const UNKNOWN_NODE_NAME: &str = "Unknown";

/// Batched node-id to rendered-image lookup.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn images(&self, node_ids: &[String]) -> Result<HashMap<String, String>, FetchError>;
}

/// Figma renders for one design file.
pub struct FigmaImages<'a> {
    client: &'a FigmaClient,
    file_key: &'a str,
}

impl<'a> FigmaImages<'a> {
    pub fn new(client: &'a FigmaClient, file_key: &'a str) -> Self {
        Self { client, file_key }
    }
}

#[async_trait]
impl ImageSource for FigmaImages<'_> {
    async fn images(&self, node_ids: &[String]) -> Result<HashMap<String, String>, FetchError> {
        self.client.fetch_images(self.file_key, node_ids).await
    }
}

/// A transition whose destination is a screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEdge {
    pub from_id: String,
    pub from_name: String,
    pub to_id: String,
    pub to_name: String,
    #[serde(rename = "animation")]
    pub kind: String,
}

/// A transition with rendered images for both endpoints and their enclosing screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedEdge {
    pub from_id: String,
    pub from_name: String,
    pub to_id: String,
    pub to_name: String,
    #[serde(rename = "animation")]
    pub kind: String,
    pub from_url: String,
    pub to_url: String,
    pub from_frame_url: String,
    pub to_frame_url: String,
}

/// Attach destination names and drop every edge that does not land on a frame.
pub fn navigable_edges(raw_edges: Vec<RawEdge>, index: &NodeIndex) -> Vec<TransitionEdge> {
    raw_edges
        .into_iter()
        .filter(|edge| index.is_frame(&edge.to_id))
        .map(|edge| TransitionEdge {
            to_name: index
                .name_of(&edge.to_id)
                .unwrap_or(UNKNOWN_NODE_NAME)
                .to_string(),
            from_id: edge.from_id,
            from_name: edge.from_name,
            to_id: edge.to_id,
            kind: edge.kind,
        })
        .collect()
}

/// Resolve element and enclosing-frame image URLs for every navigable transition.
///
/// Issues at most two batched lookups (endpoints, then their frames) and none at all when no
/// edge survives filtering. Lookup failures leave URLs empty rather than failing the run.
pub async fn resolve_transitions(
    raw_edges: Vec<RawEdge>,
    index: &NodeIndex,
    source: &dyn ImageSource,
) -> Vec<EnrichedEdge> {
    let edges = navigable_edges(raw_edges, index);
    if edges.is_empty() {
        debug!("No navigable transitions; skipping image lookups");
        return Vec::new();
    }

    let endpoint_ids: BTreeSet<String> = edges
        .iter()
        .flat_map(|e| [e.from_id.clone(), e.to_id.clone()])
        .collect();
    let element_images = lookup_images(source, &endpoint_ids).await;

    let frame_ids: BTreeSet<String> = endpoint_ids
        .iter()
        .map(|id| index.ancestor_frame(id).to_string())
        .collect();
    let frame_images = lookup_images(source, &frame_ids).await;

    debug!(
        "Resolved {} element and {} frame images for {} transitions",
        element_images.len(),
        frame_images.len(),
        edges.len()
    );

    edges
        .into_iter()
        .map(|edge| {
            let from_url = element_images.get(&edge.from_id).cloned().unwrap_or_default();
            let to_url = element_images.get(&edge.to_id).cloned().unwrap_or_default();
            let from_frame_url =
                frame_image_or(&frame_images, index.ancestor_frame(&edge.from_id), &from_url);
            let to_frame_url =
                frame_image_or(&frame_images, index.ancestor_frame(&edge.to_id), &to_url);

            EnrichedEdge {
                from_id: edge.from_id,
                from_name: edge.from_name,
                to_id: edge.to_id,
                to_name: edge.to_name,
                kind: edge.kind,
                from_url,
                to_url,
                from_frame_url,
                to_frame_url,
            }
        })
        .collect()
}

fn frame_image_or(
    frame_images: &HashMap<String, String>,
    frame_id: &str,
    fallback: &str,
) -> String {
    frame_images
        .get(frame_id)
        .filter(|url| !url.is_empty())
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}

async fn lookup_images(
    source: &dyn ImageSource,
    ids: &BTreeSet<String>,
) -> HashMap<String, String> {
    if ids.is_empty() {
        return HashMap::new();
    }

    let ids: Vec<String> = ids.iter().cloned().collect();
    match source.images(&ids).await {
        Ok(images) => images
            .into_iter()
            .map(|(id, url)| (canonical_id(&id).to_string(), url))
            .collect(),
        Err(e) => {
            warn!("Image render lookup for {} nodes failed: {}", ids.len(), e);
            HashMap::new()
        }
    }
}
