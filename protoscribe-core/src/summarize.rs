// Batched, paced image summarization

use crate::group::FrameGroup;
use crate::preprocess::FrameRegistry;
use crate::prompts::PromptSelector;
use futures::future::join_all;
use indexmap::IndexMap;
use protoscribe_fetch::VisionSummarizer;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_BATCH_SIZE: usize = 6;
pub const DEFAULT_BATCH_PAUSE: Duration = Duration::from_millis(1200);

/// Image URL -> summary text. Failed summaries are stored as `""`.
pub type SummaryMap = IndexMap<String, String>;

/// What an image URL depicts, which decides the prompts it is sent with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlRole {
    Frame,
    SourceElement,
    DestinationElement,
    General,
}

/// Reverse index from URL to role, built once per run.
#[derive(Debug, Clone, Default)]
pub struct RoleIndex {
    frames: HashSet<String>,
    sources: HashSet<String>,
    destinations: HashSet<String>,
}

impl RoleIndex {
    pub fn build(registry: &FrameRegistry) -> Self {
        let mut index = Self::default();
        for (frame_url, entry) in registry {
            index.frames.insert(frame_url.clone());
            for element in &entry.elements {
                index.sources.insert(element.from_url.clone());
                index.destinations.insert(element.to_url.clone());
            }
        }
        index
    }

    /// Frame beats source element, which beats destination element.
    pub fn classify(&self, url: &str) -> UrlRole {
        if self.frames.contains(url) {
            UrlRole::Frame
        } else if self.sources.contains(url) {
            UrlRole::SourceElement
        } else if self.destinations.contains(url) {
            UrlRole::DestinationElement
        } else {
            UrlRole::General
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchMode {
    /// One request in flight at a time.
    #[default]
    Sequential,
    /// Every request of a batch in flight together.
    Concurrent,
}

/// Called with (completed, total) after each batch.
pub type SummaryProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

#[derive(Clone)]
pub struct SummarizeOptions {
    pub batch_size: usize,
    pub batch_pause: Duration,
    pub mode: BatchMode,
    pub progress_callback: Option<SummaryProgressCallback>,
}

impl Default for SummarizeOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_pause: DEFAULT_BATCH_PAUSE,
            mode: BatchMode::default(),
            progress_callback: None,
        }
    }
}

impl std::fmt::Debug for SummarizeOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummarizeOptions")
            .field("batch_size", &self.batch_size)
            .field("batch_pause", &self.batch_pause)
            .field("mode", &self.mode)
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

/// Summarize every URL of every group, in group order.
///
/// A URL shared by several groups is summarized once, under the first group that lists it.
/// The pause separates consecutive batches across group boundaries too, and is never taken
/// after the last batch.
pub async fn summarize_all(
    groups: &[FrameGroup],
    roles: &RoleIndex,
    prompts: &dyn PromptSelector,
    summarizer: &dyn VisionSummarizer,
    options: &SummarizeOptions,
) -> SummaryMap {
    let batch_size = options.batch_size.max(1);
    let mut seen: HashSet<&str> = HashSet::new();

    let batches: Vec<Vec<&str>> = groups
        .iter()
        .flat_map(|group| {
            let pending: Vec<&str> = group
                .urls
                .iter()
                .map(String::as_str)
                .filter(|url| seen.insert(*url))
                .collect();
            pending
                .chunks(batch_size)
                .map(|chunk| chunk.to_vec())
                .collect::<Vec<_>>()
        })
        .collect();

    let total: usize = batches.iter().map(Vec::len).sum();
    info!(
        "Summarizing {} images from {} screens in {} batches",
        total,
        groups.len(),
        batches.len()
    );

    let mut summaries = SummaryMap::with_capacity(total);
    for (i, batch) in batches.iter().enumerate() {
        if i > 0 && !options.batch_pause.is_zero() {
            tokio::time::sleep(options.batch_pause).await;
        }
        debug!("Batch {}/{}: {} images", i + 1, batches.len(), batch.len());

        let results: Vec<Option<String>> = match options.mode {
            BatchMode::Sequential => {
                let mut results = Vec::with_capacity(batch.len());
                for url in batch {
                    results.push(summarize_one(url, roles, prompts, summarizer).await);
                }
                results
            }
            BatchMode::Concurrent => {
                join_all(
                    batch
                        .iter()
                        .map(|url| summarize_one(url, roles, prompts, summarizer)),
                )
                .await
            }
        };

        for (url, result) in batch.iter().zip(results) {
            let text = match result {
                Some(text) if !text.trim().is_empty() => text,
                _ => {
                    warn!("No summary for {}", url);
                    String::new()
                }
            };
            summaries.insert((*url).to_string(), text);
        }

        if let Some(ref callback) = options.progress_callback {
            callback(summaries.len(), total);
        }
    }

    let failed = summaries.values().filter(|s| s.is_empty()).count();
    info!(
        "Summarized {} images ({} failed)",
        summaries.len() - failed,
        failed
    );
    summaries
}

async fn summarize_one(
    url: &str,
    roles: &RoleIndex,
    prompts: &dyn PromptSelector,
    summarizer: &dyn VisionSummarizer,
) -> Option<String> {
    let role = roles.classify(url);
    summarizer.summarize(url, &prompts.prompts_for(role)).await
}
