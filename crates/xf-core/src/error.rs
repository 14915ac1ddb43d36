use crate::types::SourceSpan;
use thiserror::Error;

/// Code of the error raised when a path string cannot be parsed.
pub const MALFORMED_PATH: &str = "PATH_MALFORMED";
/// Code of the error raised when a qualified name uses an undeclared prefix.
pub const UNKNOWN_PREFIX: &str = "NAMESPACE_UNKNOWN_PREFIX";
/// Code of the error raised when a choice instance has several selected alternatives.
pub const AMBIGUOUS_CHOICE: &str = "CHOICE_AMBIGUOUS";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct XformError {
    pub code: String,
    pub message: String,
    pub span: Option<SourceSpan>,
}

impl XformError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(
        code: impl Into<String>,
        message: impl Into<String>,
        span: SourceSpan,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            span: Some(span),
        }
    }

    /// Attaches a span unless one is already recorded.
    pub fn at(mut self, span: &SourceSpan) -> Self {
        if self.span.is_none() {
            self.span = Some(span.clone());
        }
        self
    }

    pub fn malformed_path(raw: &str, reason: impl Into<String>) -> Self {
        Self::new(
            MALFORMED_PATH,
            format!("Malformed path \"{}\": {}.", raw, reason.into()),
        )
    }

    pub fn unknown_prefix(prefix: &str) -> Self {
        Self::new(
            UNKNOWN_PREFIX,
            format!("Namespace prefix \"{}\" is not declared.", prefix),
        )
    }

    pub fn is_code(&self, code: &str) -> bool {
        self.code == code
    }
}
