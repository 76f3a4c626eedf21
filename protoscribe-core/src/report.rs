// Summary artifact composition

use crate::group::FrameGroup;
use crate::preprocess::FrameRegistry;
use crate::summarize::SummaryMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryMetadata {
    pub processed_at: String,
    pub total_screens: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionSummary {
    pub from_summary: String,
    pub to_summary: String,
    pub to_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSummary {
    pub frame_url: String,
    pub frame_summary: String,
    pub interactions: Vec<InteractionSummary>,
}

/// The summarized prototype handed to document composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizedPrototype {
    pub metadata: SummaryMetadata,
    pub screens: Vec<ScreenSummary>,
}

impl SummarizedPrototype {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = self.to_json()?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

fn summary_of(summaries: &SummaryMap, url: &str) -> String {
    summaries.get(url).cloned().unwrap_or_default()
}

/// One screen per group, in group order. Missing summaries read as `""`.
pub fn compose_summary(
    groups: &[FrameGroup],
    registry: &FrameRegistry,
    summaries: &SummaryMap,
    processed_at: DateTime<Utc>,
) -> SummarizedPrototype {
    let screens: Vec<ScreenSummary> = groups
        .iter()
        .map(|group| {
            let interactions = registry
                .get(&group.frame_url)
                .map(|entry| {
                    entry
                        .elements
                        .iter()
                        .map(|element| InteractionSummary {
                            from_summary: summary_of(summaries, &element.from_url),
                            to_summary: summary_of(summaries, &element.to_url),
                            to_url: element.to_url.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default();

            ScreenSummary {
                frame_url: group.frame_url.clone(),
                frame_summary: summary_of(summaries, &group.frame_url),
                interactions,
            }
        })
        .collect();

    SummarizedPrototype {
        metadata: SummaryMetadata {
            processed_at: processed_at.to_rfc3339(),
            total_screens: screens.len(),
        },
        screens,
    }
}
