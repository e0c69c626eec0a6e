use std::process::ExitCode;

use crate::commands::CommandResult;
use crate::error::CliError;

pub enum OutputFormat {
    Text,
    Json,
}

/// Prints a `CommandResult` and converts its outcome into the process exit code.
pub fn emit_result(result: CommandResult, format: OutputFormat) -> Result<ExitCode, CliError> {
    match format {
        OutputFormat::Text => print_text(&result),
        OutputFormat::Json => print_json(&result)?,
    };
    Ok(ExitCode::from(result.exit_status().code()))
}

fn print_text(result: &CommandResult) {
    let report = result.report();
    if !report.is_ok() {
        println!("{}", report.render());
    }
}

fn print_json(result: &CommandResult) -> Result<(), CliError> {
    let payload = serde_json::to_string(result)?;
    println!("{payload}");
    Ok(())
}
