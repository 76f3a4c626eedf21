// Tests for preprocessing, grouping and the summary artifact

use chrono::{TimeZone, Utc};
use protoscribe_core::group::{group_interactions, is_valid_url};
use protoscribe_core::preprocess::{ElementInteraction, FrameEntry, FrameRegistry};
use protoscribe_core::report::{SummarizedPrototype, compose_summary};
use protoscribe_core::summarize::SummaryMap;
use tempfile::TempDir;

fn url(name: &str) -> String {
    format!("https://img.test/{}.png", name)
}

fn entry(pairs: &[(&str, &str)]) -> FrameEntry {
    FrameEntry {
        elements: pairs
            .iter()
            .map(|(from, to)| ElementInteraction {
                from_name: from.to_string(),
                to_name: to.to_string(),
                from_url: if from.is_empty() { String::new() } else { url(from) },
                to_url: if to.is_empty() { String::new() } else { url(to) },
                animation: "Instant".to_string(),
            })
            .collect(),
    }
}

// ============================================================================
// Grouping Tests
// ============================================================================

#[test]
fn test_groups_sorted_by_count_stably() {
    let mut registry = FrameRegistry::new();
    registry.insert(url("three"), entry(&[("a", "b"), ("c", "d"), ("e", "f")]));
    registry.insert(url("one-first"), entry(&[("g", "h")]));
    registry.insert(url("one-second"), entry(&[("i", "j")]));
    registry.insert(url("two"), entry(&[("k", "l"), ("m", "n")]));

    let groups = group_interactions(&registry);
    let order: Vec<String> = groups.iter().map(|g| g.frame_url.clone()).collect();
    assert_eq!(
        order,
        vec![url("one-first"), url("one-second"), url("two"), url("three")]
    );
    let counts: Vec<usize> = groups.iter().map(|g| g.element_count).collect();
    assert_eq!(counts, vec![1, 1, 2, 3]);
}

#[test]
fn test_group_urls_are_deduplicated_and_valid() {
    let mut registry = FrameRegistry::new();
    registry.insert(url("home"), entry(&[("buy", "home"), ("buy", ""), ("", "cart")]));

    let groups = group_interactions(&registry);
    let urls: Vec<&str> = groups[0].urls.iter().map(String::as_str).collect();
    assert_eq!(urls, vec![url("home"), url("buy"), url("cart")]);
    assert_eq!(groups[0].element_count, 3);
}

#[test]
fn test_invalid_frame_url_is_not_summarized() {
    let mut registry = FrameRegistry::new();
    registry.insert("not a url".to_string(), entry(&[("x", "y")]));

    let groups = group_interactions(&registry);
    assert_eq!(groups[0].frame_url, "not a url");
    assert!(!groups[0].urls.contains("not a url"));
    assert_eq!(groups[0].urls.len(), 2);
}

#[test]
fn test_is_valid_url() {
    assert!(is_valid_url("https://img.test/a.png"));
    assert!(is_valid_url("http://img.test/a.png"));
    assert!(!is_valid_url("ftp://img.test/a.png"));
    assert!(!is_valid_url("/relative.png"));
    assert!(!is_valid_url(""));
}

// ============================================================================
// Summary Artifact Tests
// ============================================================================

fn sample_artifact() -> SummarizedPrototype {
    let mut registry = FrameRegistry::new();
    registry.insert(url("home"), entry(&[("buy", "cart"), ("help", "faq")]));

    let groups = group_interactions(&registry);
    let mut summaries = SummaryMap::new();
    summaries.insert(url("home"), "Landing screen".to_string());
    summaries.insert(url("buy"), "Buy button".to_string());
    summaries.insert(url("cart"), "Cart view".to_string());
    summaries.insert(url("help"), String::new());

    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    compose_summary(&groups, &registry, &summaries, now)
}

#[test]
fn test_compose_summary_shape() {
    let artifact = sample_artifact();

    assert_eq!(artifact.metadata.total_screens, 1);
    assert_eq!(artifact.metadata.processed_at, "2024-05-01T12:00:00+00:00");

    let screen = &artifact.screens[0];
    assert_eq!(screen.frame_url, url("home"));
    assert_eq!(screen.frame_summary, "Landing screen");
    assert_eq!(screen.interactions.len(), 2);
    assert_eq!(screen.interactions[0].from_summary, "Buy button");
    assert_eq!(screen.interactions[0].to_summary, "Cart view");
    assert_eq!(screen.interactions[0].to_url, url("cart"));
    // Failed and missing summaries both read as empty.
    assert_eq!(screen.interactions[1].from_summary, "");
    assert_eq!(screen.interactions[1].to_summary, "");
}

#[test]
fn test_summary_json_field_names() {
    let json: serde_json::Value =
        serde_json::from_str(&sample_artifact().to_json().unwrap()).unwrap();

    assert!(json["metadata"]["processed_at"].is_string());
    assert_eq!(json["metadata"]["total_screens"], 1);
    assert_eq!(json["screens"][0]["frame_summary"], "Landing screen");
    assert_eq!(json["screens"][0]["interactions"][0]["to_url"], url("cart"));
    assert!(json["screens"][0]["interactions"][0]["from_summary"].is_string());
}

#[test]
fn test_save_summary() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("summary.json");
    let artifact = sample_artifact();
    artifact.save(&path).unwrap();

    let loaded: SummarizedPrototype =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(loaded, artifact);
}
