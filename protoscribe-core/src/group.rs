use crate::preprocess::FrameRegistry;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use url::Url;

/// Every image that has to be described for one screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameGroup {
    pub frame_url: String,
    /// Membership is what matters; insertion order only makes call order reproducible.
    pub urls: IndexSet<String>,
    pub element_count: usize,
}

/// Absolute `http`/`https` URL check.
pub fn is_valid_url(candidate: &str) -> bool {
    Url::parse(candidate)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// One group per screen, cheapest (fewest interactions) first. Ties keep registry order.
pub fn group_interactions(registry: &FrameRegistry) -> Vec<FrameGroup> {
    let mut groups: Vec<FrameGroup> = registry
        .iter()
        .map(|(frame_url, entry)| {
            let mut urls = IndexSet::new();
            if is_valid_url(frame_url) {
                urls.insert(frame_url.clone());
            }
            for element in &entry.elements {
                for url in [&element.from_url, &element.to_url] {
                    if is_valid_url(url) {
                        urls.insert(url.clone());
                    }
                }
            }

            FrameGroup {
                frame_url: frame_url.clone(),
                urls,
                element_count: entry.elements.len(),
            }
        })
        .collect();

    groups.sort_by_key(|group| group.element_count);
    groups
}
