use std::process::ExitCode;

fn main() -> ExitCode {
    trackcheck_cli::run()
}
