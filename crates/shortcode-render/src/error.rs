//! Render error types.

use shortcode_core::ScanError;

/// Error produced while resolving the shortcodes of a document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// The document could not be scanned.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// No handler is registered under the shortcode's name.
    #[error("unknown shortcode `{name}` at offset {offset}")]
    UnknownDirective {
        /// Shortcode name.
        name: String,
        /// Offset of the shortcode's opening tag.
        offset: usize,
    },

    /// A handler failed.
    #[error("shortcode `{name}` at offset {offset} failed: {message}")]
    Handler {
        /// Shortcode name.
        name: String,
        /// Offset of the shortcode's opening tag.
        offset: usize,
        /// Handler error message.
        message: String,
    },

    /// Reprocessed handler output nested deeper than allowed.
    #[error("shortcode `{name}` at offset {offset} exceeded the maximum nesting depth ({max_depth})")]
    DepthExceeded {
        /// Shortcode name.
        name: String,
        /// Offset of the shortcode's opening tag.
        offset: usize,
        /// Configured limit.
        max_depth: usize,
    },
}

impl RenderError {
    /// Offset of the offending shortcode in the document.
    #[must_use]
    pub fn offset(&self) -> usize {
        match self {
            Self::Scan(err) => err.offset(),
            Self::UnknownDirective { offset, .. }
            | Self::Handler { offset, .. }
            | Self::DepthExceeded { offset, .. } => *offset,
        }
    }
}

/// Error returned by a [`ShortcodeHandler`](crate::ShortcodeHandler).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for HandlerError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}
