use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the token-gate library.
///
/// Every variant except [`Error::Config`] and [`Error::InvalidPattern`] is fatal for a
/// processing run: the run aborts and no partial result is returned.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// IO error with context about the file path.
    #[error("IO error accessing '{path}': {message}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Configuration validation error.
    #[error("{message}")]
    Config {
        /// Detailed error message
        message: String,
    },

    /// Invalid glob pattern.
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The invalid pattern
        pattern: String,
        /// Reason why it's invalid
        reason: String,
    },

    /// Invalid UTF-8 encountered in a text file.
    #[error("Invalid UTF-8 encoding in file '{path}': {message}")]
    InvalidUtf8 {
        /// Path to file with encoding issues
        path: PathBuf,
        /// Decoder message
        message: String,
    },

    /// The tokenization scheme could not be loaded or is no longer usable.
    #[error("Tokenizer '{encoding}' unavailable: {message}")]
    Tokenizer {
        /// Encoding identifier
        encoding: String,
        /// Error message
        message: String,
    },

    /// Tokenizing a file's content failed.
    #[error("Failed to tokenize '{path}': {message}")]
    Tokenization {
        /// File being tokenized
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Template rendering error.
    #[error("Failed to render template '{template}': {message}")]
    Template {
        /// Template name
        template: String,
        /// Error message
        message: String,
    },

    /// JSON serialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message
        message: String,
    },
}

impl Error {
    /// Creates an IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid pattern error.
    #[must_use]
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid UTF-8 error.
    #[must_use]
    pub fn invalid_utf8(path: impl Into<PathBuf>, source: &std::str::Utf8Error) -> Self {
        Self::InvalidUtf8 {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a tokenizer availability error.
    #[must_use]
    pub fn tokenizer(encoding: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tokenizer {
            encoding: encoding.into(),
            message: message.into(),
        }
    }

    /// Wraps an error raised while tokenizing `path`.
    #[must_use]
    pub fn tokenization(path: impl Into<PathBuf>, source: &Self) -> Self {
        Self::Tokenization {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a template error.
    #[must_use]
    pub fn template(template: impl Into<String>, source: &tera::Error) -> Self {
        // tera keeps the useful part of the message in the source chain
        let mut message = source.to_string();
        let mut cause = std::error::Error::source(source);
        while let Some(inner) = cause {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            cause = std::error::Error::source(inner);
        }

        Self::Template {
            template: template.into(),
            message,
        }
    }

    /// Returns true if this is an IO error.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::InvalidPattern { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
        }
    }
}
