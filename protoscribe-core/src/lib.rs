pub mod assets;
pub mod config;
pub mod error;
pub mod extract;
pub mod group;
pub mod pipeline;
pub mod preprocess;
pub mod prompts;
pub mod report;
pub mod resolve;
pub mod story;
pub mod summarize;
pub mod traverse;
pub mod tree;

use colored::Colorize;

pub use assets::{ScreenshotLinks, save_screenshots};
pub use config::Settings;
pub use error::{ConfigError, PipelineError, Result};
pub use extract::{PrototypeExtraction, extract_from_tree, extract_prototype};
pub use group::{FrameGroup, group_interactions};
pub use preprocess::{ElementInteraction, FrameEntry, FrameRegistry, build_registry};
pub use prompts::{DefaultPrompts, PromptSelector};
pub use report::{SummarizedPrototype, compose_summary};
pub use resolve::{EnrichedEdge, FigmaImages, ImageSource, TransitionEdge, resolve_transitions};
pub use story::StoryComposer;
pub use summarize::{
    BatchMode, RoleIndex, SummarizeOptions, SummaryMap, SummaryProgressCallback, UrlRole,
    summarize_all,
};
pub use traverse::{RawEdge, Traversal, traverse};
pub use tree::{NodeIndex, PrototypeTree, ScreenFrame};

pub fn print_banner() {
    let banner = r#"
                 _                            _ _
 _ __  _ __ ___ | |_ ___  ___  ___ _ __(_) |__   ___
| '_ \| '__/ _ \| __/ _ \/ __|/ __| '__| | '_ \ / _ \
| |_) | | | (_) | || (_) \__ \ (__| |  | | |_) |  __/
| .__/|_|  \___/ \__\___/|___/\___|_|  |_|_.__/ \___|
|_|
"#;
    println!("{}", banner.bright_cyan().bold());
    println!(
        "{}  {}\n",
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black(),
        "prototype walkthroughs into requirement stories".bright_black()
    );
}
