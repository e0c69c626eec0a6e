use clap::{Arg, ArgMatches, Command};
use trackcheck::{TypeRegistry, check_states, find_repo_root};

use crate::commands::CommandResult;
use crate::context::CliSession;
use crate::error::CliError;

pub fn command() -> Command {
    Command::new("states")
        .about("Verify that every catalog entry has exactly one state symlink")
        .arg(
            Arg::new("type")
                .long("type")
                .value_name("TYPE")
                .default_value(TypeRegistry::DEFAULT_TYPE)
                .help("Entity type to check (built-in: tasks, tweets)"),
        )
}

pub fn run(session: &CliSession, matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let type_name = matches
        .get_one::<String>("type")
        .map(String::as_str)
        .unwrap_or(TypeRegistry::DEFAULT_TYPE);
    let config = session.registry.get(type_name)?;

    let root = find_repo_root(session.fs.as_ref(), &session.start)?;
    if session.verbosity.verbose {
        tracing::info!(
            root = %root.display(),
            type_name,
            states = ?config.states,
            "checking state symlinks"
        );
    }

    let report = check_states(session.fs.as_ref(), &root, config);
    Ok(CommandResult::States {
        type_name: type_name.to_string(),
        root: root.display().to_string(),
        report,
    })
}
