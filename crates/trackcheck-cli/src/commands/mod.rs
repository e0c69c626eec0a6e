use serde::Serialize;
use trackcheck::ValidationReport;

use crate::error::ExitStatus;

pub mod links;
pub mod states;

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandResult {
    Links {
        report: ValidationReport,
    },
    States {
        type_name: String,
        root: String,
        report: ValidationReport,
    },
}

impl CommandResult {
    pub fn report(&self) -> &ValidationReport {
        match self {
            CommandResult::Links { report } | CommandResult::States { report, .. } => report,
        }
    }

    pub fn exit_status(&self) -> ExitStatus {
        if self.report().is_ok() {
            ExitStatus::Ok
        } else {
            ExitStatus::Failure
        }
    }
}
