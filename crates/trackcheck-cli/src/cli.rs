use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use tracing_subscriber::EnvFilter;

use crate::commands;
use crate::context::CliSession;
use crate::error::{CliError, ExitStatus};
use crate::formatter::{OutputFormat, emit_result};
use crate::util::Verbosity;

const NAME: &str = "trackcheck";

pub fn run() -> ExitCode {
    match run_cli(std::env::args()) {
        Ok(code) => code,
        Err(err) => {
            err.print();
            err.exit_code()
        }
    }
}

/// Parses CLI arguments, builds the run session, and dispatches to the
/// selected checker. Returns `0` for a clean run, `1` when integrity errors
/// were reported, and a `sysexits` code for fatal conditions.
pub fn run_cli<I, S>(args: I) -> Result<ExitCode, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
{
    let command = build_cli();
    let matches = command.try_get_matches_from(args)?;

    let verbosity = Verbosity {
        json: matches.get_flag("json"),
        verbose: matches.get_flag("verbose"),
    };
    init_tracing(verbosity.verbose);
    let output = if verbosity.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let session = CliSession::bootstrap(
        matches.get_one::<PathBuf>("repo").cloned(),
        matches.get_one::<PathBuf>("config").cloned(),
        verbosity,
    )?;
    tracing::info!(
        start = %session.start.display(),
        types = ?session.registry.names().collect::<Vec<_>>(),
        "resolved session"
    );

    let result = dispatch(&session, &matches)?;
    emit_result(result, output)
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_cli() -> Command {
    Command::new(NAME)
        .about("Repository integrity checks for markdown links and state symlinks")
        .arg(
            Arg::new("repo")
                .long("repo")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .global(true)
                .help("Start repository discovery and scans from PATH instead of the current directory."),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .global(true)
                .help("Load entity type definitions from a YAML file instead of the built-in tasks/tweets."),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Emit the report as a single JSON object instead of one line per error."),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Log repository discovery and run summaries to stderr."),
        )
        .subcommand_required(true)
        .subcommand(commands::links::command())
        .subcommand(commands::states::command())
}

fn dispatch(
    session: &CliSession,
    matches: &ArgMatches,
) -> Result<commands::CommandResult, CliError> {
    match matches.subcommand() {
        Some(("links", sub)) => commands::links::run(session, sub),
        Some(("states", sub)) => commands::states::run(session, sub),
        _ => Err(CliError::new("missing command", ExitStatus::Usage)),
    }
}
