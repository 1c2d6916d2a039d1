use std::path::PathBuf;
use thiserror::Error;

/// Source position reported by a parser, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Errors raised by the analysis pipeline.
///
/// Unknown features are never errors: they become warning-level issues.
/// Only malformed source, bad configuration and I/O problems end up here.
#[derive(Debug, Error)]
pub enum CompatError {
    #[error("{language} parse error{}: {message}", at_location(.location))]
    Parse {
        language: &'static str,
        message: String,
        location: Option<Location>,
    },

    #[error("invalid value for {field}: {message}")]
    Validation {
        field: String,
        message: String,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("File too large: {size} bytes exceeds limit of {limit} bytes")]
    FileTooLarge {
        size: u64,
        limit: u64,
    },

    #[error("Analysis timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Path does not exist: {path}")]
    PathNotFound { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, CompatError>;

fn at_location(location: &Option<Location>) -> String {
    location.map(|l| format!(" at {l}")).unwrap_or_default()
}

impl CompatError {
    pub fn parse<S: Into<String>>(
        language: &'static str,
        message: S,
        location: Option<Location>,
    ) -> Self {
        Self::Parse {
            language,
            message: message.into(),
            location,
        }
    }

    pub fn validation<F: Into<String>, S: Into<String>>(field: F, message: S) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn file_too_large(size: u64, limit: u64) -> Self {
        Self::FileTooLarge { size, limit }
    }

    pub fn path_not_found<P: Into<PathBuf>>(path: P) -> Self {
        Self::PathNotFound { path: path.into() }
    }

    /// Returns true if the error only affects a single file and the batch can continue
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Parse { .. } | Self::FileTooLarge { .. } | Self::Timeout { .. } | Self::Io(_)
        )
    }

    /// Parser-reported location, when the parser produced one
    pub fn location(&self) -> Option<Location> {
        match self {
            Self::Parse { location, .. } => *location,
            _ => None,
        }
    }
}
