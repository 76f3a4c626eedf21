// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    build_summarize_options, default_story_filename, read_extraction, resolve_output_path,
    write_output,
};

// Re-export pipeline entry points from protoscribe-core
pub use protoscribe_core::pipeline::{StoryRun, SummaryRun, run_story, summarize_extraction};
