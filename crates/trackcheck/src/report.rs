use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single integrity problem found during a run.
///
/// The `Display` form is the one-line report format:
/// `<path>: <Category>: <detail>`.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("{document}: Broken link: {target} -> {resolved}")]
    BrokenLink {
        document: String,
        target: String,
        resolved: String,
    },
    #[error("{document}: Outside repository: {target} -> {resolved}")]
    OutsideRepository {
        document: String,
        target: String,
        resolved: String,
    },
    #[error("{document}: Resolution error: {target}: {cause}")]
    ResolutionError {
        document: String,
        target: String,
        cause: String,
    },
    #[error("{entry}: Missing link: not linked in any state directory")]
    MissingLink { entry: String },
    #[error("{entry}: Multiple links: linked in multiple states: {}", states.join(", "))]
    MultipleLinks { entry: String, states: Vec<String> },
    #[error("{link}: Not a symlink: expected a symlink into {type_name}/")]
    NotASymlink { link: String, type_name: String },
    #[error("{link}: Invalid link: points outside {type_name}/: {resolved}")]
    InvalidLink {
        link: String,
        type_name: String,
        resolved: String,
    },
    #[error("{pointer}: Current pointer error: {problem}")]
    CurrentPointer {
        pointer: String,
        problem: PointerProblem,
    },
}

impl ValidationError {
    /// Category label used in the text report.
    pub fn category(&self) -> &'static str {
        match self {
            ValidationError::BrokenLink { .. } => "Broken link",
            ValidationError::OutsideRepository { .. } => "Outside repository",
            ValidationError::ResolutionError { .. } => "Resolution error",
            ValidationError::MissingLink { .. } => "Missing link",
            ValidationError::MultipleLinks { .. } => "Multiple links",
            ValidationError::NotASymlink { .. } => "Not a symlink",
            ValidationError::InvalidLink { .. } => "Invalid link",
            ValidationError::CurrentPointer { .. } => "Current pointer error",
        }
    }
}

/// Why the current-pointer symlink is unusable.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum PointerProblem {
    #[error("missing")]
    Missing,
    #[error("not a symlink")]
    NotASymlink,
    #[error("target does not exist: {resolved}")]
    Broken { resolved: String },
    #[error("points outside {type_name}/: {resolved}")]
    OutsideCatalog { type_name: String, resolved: String },
    #[error("cannot resolve target: {cause}")]
    Unresolvable { cause: String },
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Success,
    Failure,
}

/// Ordered outcome of one validation run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidationReport {
    pub status: ValidationStatus,
    /// Documents or catalog entries examined.
    pub checked: usize,
    pub errors: Vec<ValidationError>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            status: ValidationStatus::Success,
            checked: 0,
            errors: Vec::new(),
        }
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn extend(&mut self, errors: impl IntoIterator<Item = ValidationError>) {
        self.errors.extend(errors);
    }

    pub fn finalize(mut self) -> Self {
        self.status = if self.errors.is_empty() {
            ValidationStatus::Success
        } else {
            ValidationStatus::Failure
        };
        self
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Newline-joined text form of every error, in encounter order.
    pub fn render(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
