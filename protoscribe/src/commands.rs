use crate::CLAP_STYLING;
use clap::{arg, command};
use std::path::PathBuf;

fn output_arg(help: &'static str) -> clap::Arg {
    arg!(-o --"output" <PATH>)
        .required(false)
        .help(help)
        .value_parser(clap::value_parser!(PathBuf))
}

fn file_key_arg() -> clap::Arg {
    arg!(-k --"file-key" <FILE_KEY>)
        .required(true)
        .help("Key of the Figma design file (the segment after /file/ or /design/ in its URL)")
}

fn node_id_arg() -> clap::Arg {
    arg!(-n --"node-id" <NODE_ID>)
        .required(true)
        .help("Id of the prototype root node, e.g. 12:345")
}

fn task_id_arg() -> clap::Arg {
    arg!(-t --"task-id" <TASK_ID>)
        .required(true)
        .help("ClickUp task id")
}

fn batch_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(
        arg!(--"batch-size" <COUNT>)
            .required(false)
            .help("Images summarized per batch (default: PROTOSCRIBE_BATCH_SIZE or 6)")
            .value_parser(clap::value_parser!(usize)),
    )
    .arg(
        arg!(--"batch-pause-ms" <MILLIS>)
            .required(false)
            .help("Pause between batches in milliseconds (default: PROTOSCRIBE_BATCH_PAUSE_MS or 1200)")
            .value_parser(clap::value_parser!(u64)),
    )
    .arg(
        arg!(--"concurrent")
            .required(false)
            .help("Send the requests of one batch concurrently instead of one at a time")
            .action(clap::ArgAction::SetTrue),
    )
}

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("protoscribe")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("protoscribe")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(arg!(-v --"verbose" "Enable debug logging").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("extract")
                .about("Extract screens and navigable transitions from a Figma prototype")
                .arg(file_key_arg())
                .arg(node_id_arg())
                .arg(output_arg("Write the extraction JSON to a file (default: print to screen)")),
        )
        .subcommand(
            command!("ticket")
                .about("Fetch a ClickUp task with its comments and attachments")
                .arg(task_id_arg())
                .arg(output_arg("Write the ticket JSON to a file (default: print to screen)")),
        )
        .subcommand(batch_args(
            command!("summarize")
                .about("Summarize every screen and interaction image of an extraction")
                .arg(
                    arg!(-i --"input" <PATH>)
                        .required(true)
                        .help("Extraction JSON produced by the extract command")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(output_arg("Write the summary JSON to a file (default: print to screen)")),
        ))
        .subcommand(batch_args(
            command!("story")
                .about(
                    "Run the full pipeline: ticket, prototype extraction, summaries and the \
                Markdown requirements story",
                )
                .arg(task_id_arg())
                .arg(file_key_arg())
                .arg(node_id_arg())
                .arg(output_arg(
                    "Where to write the story (default: ./confluence_story_<timestamp>.md)",
                )),
        ))
}
