use std::fmt::{Display, Formatter};

use thiserror::Error;

/// Input validation errors raised while parsing request parameters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid timespan '{value}', expected one of 1m, 5m, 15m, 1h, day, month")]
    InvalidTimespan { value: String },
    #[error("invalid window '{value}', use <n>d, <n>w, <n>m, <n>y or max (e.g. 5d, 1m)")]
    InvalidWindow { value: String },
    #[error("window '{value}' is longer than {max_days} days")]
    WindowTooLong { value: String, max_days: i64 },

    #[error("search query must not be empty")]
    EmptyQuery,
    #[error("search limit must be at least 1")]
    InvalidLimit,

    #[error("url is required")]
    EmptyUrl,
    #[error("unsupported GitHub URL '{value}'; provide a repository, blob, tree or raw URL")]
    UnsupportedUrl { value: String },
}

/// Error classification shared by both gateways.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    InvalidInput,
    NotFound,
    RateLimited,
    Upstream,
    UnsupportedResponseShape,
    NotAFile,
}

/// Structured upstream error carried back to the HTTP boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
}

impl SourceError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::InvalidInput, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::NotFound, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::RateLimited, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Upstream, message)
    }

    pub fn unsupported_shape(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::UnsupportedResponseShape, message)
    }

    pub fn not_a_file(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::NotAFile, message)
    }

    /// Map a non-success upstream status to an error kind.
    pub fn from_status(provider: &str, status: u16) -> Self {
        match status {
            404 => Self::not_found(format!("{provider} returned status 404 (not found)")),
            429 => Self::rate_limited(format!("{provider} returned status 429 (rate limited)")),
            other => Self::upstream(format!("{provider} returned status {other}")),
        }
    }

    fn new(kind: SourceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::InvalidInput => "source.invalid_input",
            SourceErrorKind::NotFound => "source.not_found",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::Upstream => "source.upstream",
            SourceErrorKind::UnsupportedResponseShape => "source.unsupported_response_shape",
            SourceErrorKind::NotAFile => "source.not_a_file",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

impl From<ValidationError> for SourceError {
    fn from(error: ValidationError) -> Self {
        Self::invalid_input(error.to_string())
    }
}
