use commands::command_argument_builder;
use protoscribe::handlers::{
    handle_extract, handle_story, handle_summarize, handle_ticket, init_logging,
};
use protoscribe_core::print_banner;

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");
    let verbose = chosen_command.get_flag("verbose");

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    init_logging(verbose);

    match chosen_command.subcommand() {
        Some(("extract", primary_command)) => handle_extract(primary_command, quiet).await,
        Some(("ticket", primary_command)) => handle_ticket(primary_command, quiet).await,
        Some(("summarize", primary_command)) => handle_summarize(primary_command, quiet).await,
        Some(("story", primary_command)) => handle_story(primary_command, quiet).await,
        _ => unreachable!("clap should ensure we don't get here"),
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
