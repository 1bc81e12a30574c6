//! Error types for jpage

use thiserror::Error;

/// Boxed error produced by a page provider
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// jpage error types
#[derive(Debug, Error)]
pub enum PageError {
    /// The execution context was cancelled.
    #[error("Operation cancelled")]
    Cancelled,
    /// The execution context deadline passed.
    #[error("Deadline exceeded")]
    DeadlineExceeded,
    /// A provider failed to fetch the requested page.
    #[error("Failed to fetch page '{page}': {source}")]
    Fetch {
        /// Page identifier handed to the provider
        page: String,
        /// Underlying failure (I/O, HTTP status, transport)
        #[source]
        source: BoxError,
    },
    /// The value at the located position is not a JSON array.
    #[error("Expected [ at {offset} position; got: {found}")]
    Structural {
        /// Input offset (bytes) right after the unexpected token
        offset: u64,
        /// Rendering of the token that was found instead
        found: String,
    },
    /// The token stream is not valid JSON.
    #[error("JSON syntax error at offset {offset}: {message}")]
    Syntax {
        /// Input offset (bytes) of the offending byte
        offset: u64,
        /// Description of what was expected
        message: String,
    },
    /// Input ended inside an unfinished value.
    #[error("Unexpected end of input at offset {offset}")]
    UnexpectedEof {
        /// Input offset (bytes) where the input ended
        offset: u64,
    },
    /// An element could not be deserialized into the requested type.
    #[error("Failed to decode element: {0}")]
    Decode(#[source] serde_json::Error),
    /// A configured decoding limit was exceeded.
    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),
    /// An earlier error left the decoder partway through the input.
    #[error("Decoder halted at offset {offset} after an earlier error: {cause}")]
    Halted {
        /// Input offset (bytes) where the earlier error occurred
        offset: u64,
        /// Message of the earlier error
        cause: String,
    },
    /// `scan` was called while no page is open.
    #[error("No page is open; call advance() before scan()")]
    NoActivePage,
    /// Reading the remainder of a page stream failed during disposal.
    #[error("Failed to drain page stream: {0}")]
    Drain(#[source] std::io::Error),
    /// Releasing a page stream failed during disposal.
    #[error("Failed to release page stream: {0}")]
    Release(#[source] std::io::Error),
    /// I/O operation failed while reading a page.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration is invalid or exceeds hard limits.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PageError {
    /// Wrap a provider failure for the given page
    pub fn fetch(page: impl Into<String>, source: impl Into<BoxError>) -> Self {
        PageError::Fetch {
            page: page.into(),
            source: source.into(),
        }
    }

    /// True for errors caused by the execution context ending
    pub fn is_cancellation(&self) -> bool {
        matches!(self, PageError::Cancelled | PageError::DeadlineExceeded)
    }

    /// True for errors raised while disposing of a page stream
    pub fn is_disposal(&self) -> bool {
        matches!(self, PageError::Drain(_) | PageError::Release(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, PageError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn structural_message_reports_offset_and_token() {
        let err = PageError::Structural {
            offset: 10,
            found: "{".to_string(),
        };
        assert_eq!(err.to_string(), "Expected [ at 10 position; got: {");
    }

    #[test]
    fn fetch_wraps_string_sources() {
        let err = PageError::fetch("page-1", "wrong status code: 404");
        assert!(err.to_string().contains("page-1"));
        assert!(err.to_string().contains("404"));
        assert!(!err.is_cancellation());
    }

    #[test]
    fn classification_helpers() {
        assert!(PageError::Cancelled.is_cancellation());
        assert!(PageError::DeadlineExceeded.is_cancellation());
        assert!(PageError::Drain(io::Error::from(io::ErrorKind::BrokenPipe)).is_disposal());
        assert!(PageError::Release(io::Error::from(io::ErrorKind::BrokenPipe)).is_disposal());
        assert!(!PageError::NoActivePage.is_disposal());
    }
}
