use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use trackcheck::{check_documents, scan_documents};

use crate::commands::CommandResult;
use crate::context::CliSession;
use crate::error::CliError;
use crate::util;

const MARKDOWN_EXTENSION: &str = "md";

pub fn command() -> Command {
    Command::new("links")
        .about("Verify that relative links in markdown files resolve inside the repository")
        .arg(
            Arg::new("files")
                .value_name("FILE")
                .num_args(0..)
                .action(ArgAction::Append)
                .value_parser(value_parser!(PathBuf))
                .help("Markdown files to check. Without files, every *.md below the start directory is checked."),
        )
}

pub fn run(session: &CliSession, matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let mut documents = Vec::new();
    if let Some(files) = matches.get_many::<PathBuf>("files") {
        for file in files {
            documents.push(util::absolute(file)?);
        }
    }

    if documents.is_empty() {
        documents = scan_documents(session.fs.as_ref(), &session.start, MARKDOWN_EXTENSION)?;
    }

    let report = check_documents(session.fs.as_ref(), &documents)?;
    Ok(CommandResult::Links { report })
}
