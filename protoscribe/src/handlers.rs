use chrono::{DateTime, Local};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use protoscribe_core::config::Settings;
use protoscribe_core::error::PipelineError;
use protoscribe_core::extract::{PrototypeExtraction, extract_prototype};
use protoscribe_core::pipeline::{self, run_story, summarize_extraction};
use protoscribe_core::prompts::DefaultPrompts;
use protoscribe_core::summarize::{BatchMode, SummarizeOptions, SummaryProgressCallback};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

// Helper functions shared by the handlers

/// Install the fmt subscriber; `-v` lowers the level to DEBUG.
pub fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}

/// Expand `~` in a user supplied path.
pub fn resolve_output_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
}

pub fn default_story_filename(now: DateTime<Local>) -> String {
    format!("confluence_story_{}.md", now.format("%Y%m%d_%H%M%S"))
}

/// Write `content` to `output`, creating parent directories, or print it when no path is given.
///
/// Returns the path written to.
pub fn write_output(content: &str, output: Option<&PathBuf>) -> Result<Option<PathBuf>, String> {
    let Some(output) = output else {
        println!("{}", content);
        return Ok(None);
    };

    let path = resolve_output_path(output);
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
    }
    fs::write(&path, content).map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
    Ok(Some(path))
}

pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("Failed to serialize output: {}", e))
}

/// Load an extraction written by the `extract` command.
pub fn read_extraction(path: &Path) -> Result<PrototypeExtraction, PipelineError> {
    let content = fs::read_to_string(resolve_output_path(path))?;
    Ok(serde_json::from_str(&content)?)
}

/// CLI flags win over settings.
pub fn build_summarize_options(
    settings: &Settings,
    batch_size: Option<usize>,
    batch_pause_ms: Option<u64>,
    concurrent: bool,
) -> SummarizeOptions {
    SummarizeOptions {
        batch_size: batch_size.unwrap_or(settings.batch_size).max(1),
        batch_pause: batch_pause_ms
            .map(Duration::from_millis)
            .unwrap_or(settings.batch_pause),
        mode: if concurrent {
            BatchMode::Concurrent
        } else {
            BatchMode::Sequential
        },
        progress_callback: None,
    }
}

fn summarize_options_from_args(args: &ArgMatches, settings: &Settings) -> SummarizeOptions {
    build_summarize_options(
        settings,
        args.get_one::<usize>("batch-size").copied(),
        args.get_one::<u64>("batch-pause-ms").copied(),
        args.get_flag("concurrent"),
    )
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", "✗".red().bold(), message);
    std::process::exit(1);
}

fn load_settings() -> Settings {
    Settings::from_env().unwrap_or_else(|e| fail(e))
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(message.to_string());
    spinner
}

fn summary_progress(quiet: bool) -> (ProgressBar, SummaryProgressCallback) {
    let bar = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(0)
    };
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} summarizing [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    let handle = bar.clone();
    let callback: SummaryProgressCallback = Arc::new(move |done, total| {
        handle.set_length(total as u64);
        handle.set_position(done as u64);
    });
    (bar, callback)
}

fn report_written(label: &str, written: Option<PathBuf>, quiet: bool) {
    if let Some(path) = written
        && !quiet
    {
        println!(
            "{} {} written to {}",
            "✓".green().bold(),
            label,
            path.display().to_string().bright_white()
        );
    }
}

// Command handlers

pub async fn handle_extract(args: &ArgMatches, quiet: bool) {
    let file_key = args.get_one::<String>("file-key").map(String::as_str).unwrap_or_default();
    let node_id = args.get_one::<String>("node-id").map(String::as_str).unwrap_or_default();
    let output = args.get_one::<PathBuf>("output");

    let settings = load_settings();
    let figma = pipeline::figma_client(&settings).unwrap_or_else(|e| fail(e));

    let progress = (!quiet)
        .then(|| spinner(&format!("Extracting prototype {} from {}", node_id, file_key)));
    let extraction = extract_prototype(&figma, file_key, node_id)
        .await
        .unwrap_or_else(|e| fail(format!("Extraction failed: {}", e)));
    if let Some(progress) = progress {
        progress.finish_and_clear();
    }

    if !quiet {
        print_divider();
        println!("{} {} screens", "→".blue(), extraction.total_frames);
        println!("{} {} navigable interactions", "→".blue(), extraction.total_interactions);
        print_divider();
    }

    let json = to_pretty_json(&extraction).unwrap_or_else(|e| fail(e));
    let written = write_output(&json, output).unwrap_or_else(|e| fail(e));
    report_written("Extraction", written, quiet);
}

pub async fn handle_ticket(args: &ArgMatches, quiet: bool) {
    let task_id = args.get_one::<String>("task-id").map(String::as_str).unwrap_or_default();
    let output = args.get_one::<PathBuf>("output");

    let settings = load_settings();
    let client = pipeline::task_client(&settings).unwrap_or_else(|e| fail(e));

    let progress = (!quiet).then(|| spinner(&format!("Fetching task {}", task_id)));
    let ticket = pipeline::fetch_ticket(&client, task_id)
        .await
        .unwrap_or_else(|e| fail(e));
    if let Some(progress) = progress {
        progress.finish_and_clear();
    }

    if !quiet {
        print_divider();
        println!("{} {}", "→".blue(), ticket.title.bold());
        println!(
            "{} {} comments, {} attachments",
            "→".blue(),
            ticket.comments.len(),
            ticket.attachments.len()
        );
        print_divider();
    }

    let json = to_pretty_json(&ticket).unwrap_or_else(|e| fail(e));
    let written = write_output(&json, output).unwrap_or_else(|e| fail(e));
    report_written("Ticket", written, quiet);
}

pub async fn handle_summarize(args: &ArgMatches, quiet: bool) {
    let Some(input) = args.get_one::<PathBuf>("input") else {
        fail("--input is required");
    };
    let output = args.get_one::<PathBuf>("output");

    let extraction = read_extraction(input)
        .unwrap_or_else(|e| fail(format!("Failed to read {}: {}", input.display(), e)));

    let settings = load_settings();
    let azure = pipeline::azure_client(&settings).unwrap_or_else(|e| fail(e));

    let (bar, callback) = summary_progress(quiet);
    let mut options = summarize_options_from_args(args, &settings);
    options.progress_callback = Some(callback);

    let run = summarize_extraction(&extraction, &DefaultPrompts, &azure, &options).await;
    bar.finish_and_clear();

    if !quiet {
        let failed = run.summaries.values().filter(|s| s.is_empty()).count();
        print_divider();
        println!(
            "{} {} screens, {} images summarized",
            "→".blue(),
            run.artifact.metadata.total_screens,
            run.summaries.len()
        );
        if failed > 0 {
            println!("{} {} images could not be summarized", "✗".yellow(), failed);
        }
        print_divider();
    }

    let json = to_pretty_json(&run.artifact).unwrap_or_else(|e| fail(e));
    let written = write_output(&json, output).unwrap_or_else(|e| fail(e));
    report_written("Summary", written, quiet);
}

pub async fn handle_story(args: &ArgMatches, quiet: bool) {
    let task_id = args.get_one::<String>("task-id").map(String::as_str).unwrap_or_default();
    let file_key = args.get_one::<String>("file-key").map(String::as_str).unwrap_or_default();
    let node_id = args.get_one::<String>("node-id").map(String::as_str).unwrap_or_default();
    let output = args
        .get_one::<PathBuf>("output")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(default_story_filename(Local::now())));
    let output = resolve_output_path(&output);

    let settings = load_settings();
    let (bar, callback) = summary_progress(quiet);
    let mut options = summarize_options_from_args(args, &settings);
    options.progress_callback = Some(callback);

    if !quiet {
        println!(
            "{} Building story for task {} from prototype {} ({})",
            "→".blue(),
            task_id.bright_white(),
            node_id,
            file_key
        );
    }

    let run = run_story(
        &settings,
        task_id,
        file_key,
        node_id,
        Some(&output),
        &DefaultPrompts,
        &options,
    )
    .await
    .unwrap_or_else(|e| fail(e));
    bar.finish_and_clear();

    if !quiet {
        print_divider();
        println!("{} {}", "→".blue(), run.ticket.title.bold());
        println!(
            "{} {} screens, {} interactions, {} summarized images",
            "→".blue(),
            run.extraction.total_frames,
            run.extraction.total_interactions,
            run.summary.summaries.len()
        );
        print_divider();
    }

    let written = write_output(&run.story, Some(&output)).unwrap_or_else(|e| fail(e));
    report_written("Story", written, quiet);
}
