//! Error types for the UP template engine.

use std::path::PathBuf;

use thiserror::Error;

pub use uplang_ast::ParseError;

/// All errors that can occur while parsing or resolving UP documents
#[derive(Error, Debug)]
pub enum UpError {
    #[error(transparent)]
    ParseError(#[from] ParseError),

    #[error("Failed to parse {}: {source}", path.display())]
    FileParseError {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("Directive error: {message}")]
    DirectiveError { message: String },

    #[error("Failed to load {}: {source}", path.display())]
    LoadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Circular include detected: {}", path.display())]
    CircularInclude { path: PathBuf },

    #[error(
        "Circular variable reference: no convergence after {iterations} iterations ({})",
        unresolved.join(", ")
    )]
    CircularVariable {
        iterations: usize,
        unresolved: Vec<String>,
    },

    #[error("Unknown {kind} strategy '{value}'")]
    UnknownStrategy { kind: &'static str, value: String },

    #[error("Type error: {message}")]
    TypeError { message: String },
}

impl UpError {
    /// True for both include cycles and variable cycles.
    pub fn is_circular(&self) -> bool {
        matches!(
            self,
            UpError::CircularInclude { .. } | UpError::CircularVariable { .. }
        )
    }

    pub(crate) fn directive(message: impl Into<String>) -> Self {
        UpError::DirectiveError {
            message: message.into(),
        }
    }
}

/// Result type alias for UP operations
pub type Result<T> = std::result::Result<T, UpError>;
