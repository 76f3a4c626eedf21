// End-to-end runs: extraction -> summary artifact -> story

use crate::assets::save_screenshots;
use crate::config::Settings;
use crate::error::{PipelineError, Result};
use crate::extract::{PrototypeExtraction, extract_prototype};
use crate::group::{FrameGroup, group_interactions};
use crate::preprocess::{FrameRegistry, build_registry};
use crate::prompts::PromptSelector;
use crate::report::{SummarizedPrototype, compose_summary};
use crate::story::StoryComposer;
use crate::summarize::{RoleIndex, SummarizeOptions, SummaryMap, summarize_all};
use chrono::Utc;
use protoscribe_fetch::{
    AzureOpenAiClient, FigmaClient, ImageDownloader, TaskClient, TaskTicket, VisionSummarizer,
};
use std::path::Path;
use tracing::info;

/// Intermediate products of one summarization run.
#[derive(Debug, Clone)]
pub struct SummaryRun {
    pub registry: FrameRegistry,
    pub groups: Vec<FrameGroup>,
    pub summaries: SummaryMap,
    pub artifact: SummarizedPrototype,
}

/// Preprocess, group and summarize an extraction.
pub async fn summarize_extraction(
    extraction: &PrototypeExtraction,
    prompts: &dyn PromptSelector,
    summarizer: &dyn VisionSummarizer,
    options: &SummarizeOptions,
) -> SummaryRun {
    let registry = build_registry(&extraction.interactions);
    let groups = group_interactions(&registry);
    let roles = RoleIndex::build(&registry);

    let summaries = summarize_all(&groups, &roles, prompts, summarizer, options).await;
    let artifact = compose_summary(&groups, &registry, &summaries, Utc::now());
    info!("Summary artifact covers {} screens", artifact.metadata.total_screens);

    SummaryRun {
        registry,
        groups,
        summaries,
        artifact,
    }
}

pub fn figma_client(settings: &Settings) -> Result<FigmaClient> {
    Ok(FigmaClient::new(settings.require_figma_token()?)?)
}

pub fn task_client(settings: &Settings) -> Result<TaskClient> {
    Ok(TaskClient::new(settings.require_clickup_token()?)?)
}

pub fn azure_client(settings: &Settings) -> Result<AzureOpenAiClient> {
    Ok(AzureOpenAiClient::new(
        settings.require_azure_endpoint()?,
        settings.require_azure_api_key()?,
        &settings.azure_model,
        &settings.azure_api_version,
    )?)
}

/// Fetch a ticket, treating "not found" as an error.
pub async fn fetch_ticket(client: &TaskClient, task_id: &str) -> Result<TaskTicket> {
    client
        .fetch_task(task_id)
        .await?
        .ok_or_else(|| PipelineError::TicketUnavailable(task_id.to_string()))
}

/// Everything a full story run produced.
#[derive(Debug, Clone)]
pub struct StoryRun {
    pub ticket: TaskTicket,
    pub extraction: PrototypeExtraction,
    pub summary: SummaryRun,
    pub story: String,
}

/// Ticket + prototype in, Markdown story out.
///
/// With a `story_path`, screenshots are downloaded next to it and the story links the local
/// copies. Fails only on missing credentials, an unavailable ticket, or a document fetch
/// that exhausted its retries. Image and text generation failures degrade inside the result.
pub async fn run_story(
    settings: &Settings,
    task_id: &str,
    file_key: &str,
    node_id: &str,
    story_path: Option<&Path>,
    prompts: &dyn PromptSelector,
    options: &SummarizeOptions,
) -> Result<StoryRun> {
    let tasks = task_client(settings)?;
    let figma = figma_client(settings)?;
    let azure = azure_client(settings)?;

    let mut ticket = fetch_ticket(&tasks, task_id).await?;
    if ticket.figma_link.is_none() {
        ticket.figma_link = Some(FigmaClient::design_link(file_key, node_id));
    }

    let extraction = extract_prototype(&figma, file_key, node_id).await?;
    let summary = summarize_extraction(&extraction, prompts, &azure, options).await;

    let mut composer = StoryComposer::new(&azure);
    if let Some(story_path) = story_path {
        let downloader = ImageDownloader::new()?;
        let screenshots = save_screenshots(&summary.artifact, &downloader, story_path).await;
        composer = composer.with_screenshots(screenshots);
    }
    let story = composer.compose(&ticket, &summary.artifact).await;
    info!("Composed story for task {}", task_id);

    Ok(StoryRun {
        ticket,
        extraction,
        summary,
        story,
    })
}
