// Local copies of screenshots referenced by a story

use crate::report::SummarizedPrototype;
use protoscribe_fetch::{DESTINATION_TIMEOUT, FRAME_TIMEOUT, ImageFetcher};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Remote render URL -> path to use in the story, relative to the story file.
pub type ScreenshotLinks = HashMap<String, String>;

/// Directory that holds a story's screenshots, and its name as seen from the story.
///
/// `out/story.md` keeps its images in `out/story_assets/`.
pub fn assets_location(story_path: &Path) -> (PathBuf, String) {
    let stem = story_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "story".to_string());
    let folder = format!("{}_assets", stem);
    let dir = match story_path.parent() {
        Some(parent) => parent.join(&folder),
        None => PathBuf::from(&folder),
    };
    (dir, folder)
}

/// Download every frame and destination render of `summary` next to `story_path`.
///
/// Screen `i` is saved as `screen-i.png`, its `j`th destination as
/// `screen-i-destination-j.png`. A URL shared by several cells is downloaded once.
/// Failed downloads and writes are logged and left out of the result, so the story falls
/// back to the remote URL for them.
pub async fn save_screenshots(
    summary: &SummarizedPrototype,
    fetcher: &dyn ImageFetcher,
    story_path: &Path,
) -> ScreenshotLinks {
    let (dir, folder) = assets_location(story_path);
    let mut links = ScreenshotLinks::new();
    let mut dir_ready = false;

    for (url, file_name, timeout) in wanted_images(summary) {
        if url.is_empty() || links.contains_key(url) {
            continue;
        }

        let bytes = match fetcher.fetch(url, timeout).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Screenshot download failed for {}: {}", url, e);
                continue;
            }
        };

        if !dir_ready {
            if let Err(e) = fs::create_dir_all(&dir) {
                warn!("Could not create {}: {}", dir.display(), e);
                return links;
            }
            dir_ready = true;
        }

        match fs::write(dir.join(&file_name), &bytes) {
            Ok(()) => {
                links.insert(url.to_string(), format!("{}/{}", folder, file_name));
            }
            Err(e) => warn!("Could not write screenshot {}: {}", file_name, e),
        }
    }

    info!("Saved {} screenshots to {}", links.len(), dir.display());
    links
}

fn wanted_images(summary: &SummarizedPrototype) -> Vec<(&str, String, Duration)> {
    let mut wanted = Vec::new();
    for (i, screen) in summary.screens.iter().enumerate() {
        wanted.push((
            screen.frame_url.as_str(),
            format!("screen-{}.png", i + 1),
            FRAME_TIMEOUT,
        ));
        for (j, interaction) in screen.interactions.iter().enumerate() {
            wanted.push((
                interaction.to_url.as_str(),
                format!("screen-{}-destination-{}.png", i + 1, j + 1),
                DESTINATION_TIMEOUT,
            ));
        }
    }
    wanted
}
