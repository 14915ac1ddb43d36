mod case;
mod runner;
mod source;

pub use case::{TestAction, TestCase, TESTCASE_SCHEMA_V1};
pub use runner::{assert_case, run_case, RunReport};
pub use source::{discover_cases, read_scenario, read_test_case, ScenarioSource};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum XfToolError {
    #[error("Failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse testcase {path}: {source}")]
    ParseCase {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid testcase schema version \"{found}\", expected \"{expected}\".")]
    InvalidSchemaVersion { expected: String, found: String },
    #[error("Testcase {path} names neither an expected document nor an expected error.")]
    CaseIncomplete { path: PathBuf },
    #[error("Form error: {0}")]
    Form(#[from] xf_core::XformError),
    #[error("Action {index} ({kind}) failed: {source}")]
    ActionFailed {
        index: usize,
        kind: String,
        source: xf_core::XformError,
    },
    #[error("Expected error {expected}, but the case succeeded.")]
    ExpectedErrorMissing { expected: String },
    #[error("Expected error {expected}, got {actual}.")]
    ErrorCodeMismatch { expected: String, actual: String },
    #[error("Output mismatch.\nexpected:\n{expected}\nactual:\n{actual}")]
    OutputMismatch { expected: String, actual: String },
}

impl XfToolError {
    /// Code of the form error behind this failure, if any.
    pub fn form_error_code(&self) -> Option<&str> {
        match self {
            Self::Form(error) | Self::ActionFailed { source: error, .. } => Some(error.code.as_str()),
            _ => None,
        }
    }
}
