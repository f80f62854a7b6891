use thiserror::Error;

use crate::syntax::ParseError;

pub type Result<T> = std::result::Result<T, RewriteError>;

#[derive(Error, Debug)]
pub enum RewriteError {
    // Standard library and dependency errors with automatic conversion
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Invalid prefilter pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Transform errors
    #[error("Parse error in {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: ParseError,
    },

    #[error("Package metadata is missing the \"{0}\" field")]
    MissingPackageField(String),

    // Manifest lookup errors
    #[error("Error code {0} not found in manifest")]
    CodeNotFound(u32),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),
}

impl RewriteError {
    pub fn parse(file: impl Into<String>, source: ParseError) -> Self {
        RewriteError::Parse {
            file: file.into(),
            source,
        }
    }
}
