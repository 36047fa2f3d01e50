//! Scan error types.

/// Error produced while scanning a document for shortcodes.
///
/// Every variant carries the byte offset(s) of the offending text. Scanning is
/// fail-fast: the first error aborts the pass and no partial result is
/// returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    /// Malformed attribute text (unterminated quote, dangling key).
    #[error("invalid argument syntax at offset {offset}: {message}")]
    InvalidArgumentSyntax {
        /// Offset of the offending character.
        offset: usize,
        /// What went wrong.
        message: String,
    },

    /// Opening or self-closing tag with an invalid or missing name.
    #[error("malformed shortcode name at offset {offset}")]
    MalformedTagName {
        /// Offset of the tag's open marker.
        offset: usize,
    },

    /// Closing tag with a missing name or unexpected trailing content.
    #[error("malformed closing tag at offset {offset}: {message}")]
    MalformedClosingTag {
        /// Offset of the closing tag's prefix.
        offset: usize,
        /// What went wrong.
        message: String,
    },

    /// A tag that never reaches its terminator, or a shortcode that is still
    /// open at the end of the buffer.
    #[error("unterminated shortcode `{name}` at offset {offset}")]
    UnterminatedTag {
        /// Name of the shortcode.
        name: String,
        /// Offset of the shortcode's opening tag.
        offset: usize,
    },

    /// Closing tag does not match the innermost open shortcode.
    #[error(
        "closing tag `{found}` at offset {found_offset} does not match `{expected}` opened at offset {expected_offset}"
    )]
    MismatchedClosingTag {
        /// Name of the innermost open shortcode.
        expected: String,
        /// Offset of its opening tag.
        expected_offset: usize,
        /// Name carried by the closing tag.
        found: String,
        /// Offset of the closing tag.
        found_offset: usize,
    },

    /// Closing tag with no open shortcode at all.
    #[error("closing tag `{name}` at offset {offset} has no matching opening tag")]
    UnmatchedClosingTag {
        /// Name carried by the closing tag.
        name: String,
        /// Offset of the closing tag.
        offset: usize,
    },

    /// Opening tag nested deeper than the tracker's nesting limit.
    #[error("shortcode `{name}` at offset {offset} is nested deeper than {limit} levels")]
    NestingTooDeep {
        /// Name of the shortcode that exceeded the limit.
        name: String,
        /// Offset of its opening tag.
        offset: usize,
        /// The nesting limit in effect.
        limit: usize,
    },
}

impl ScanError {
    /// Offset of the first offending character in the scanned buffer.
    #[must_use]
    pub fn offset(&self) -> usize {
        match self {
            Self::InvalidArgumentSyntax { offset, .. }
            | Self::MalformedTagName { offset }
            | Self::MalformedClosingTag { offset, .. }
            | Self::UnterminatedTag { offset, .. }
            | Self::UnmatchedClosingTag { offset, .. }
            | Self::NestingTooDeep { offset, .. } => *offset,
            Self::MismatchedClosingTag { found_offset, .. } => *found_offset,
        }
    }

    /// Shift every offset by `delta`.
    ///
    /// Used when a buffer slice was scanned on its own and the error has to be
    /// reported against the enclosing buffer.
    #[must_use]
    pub fn shifted(self, delta: usize) -> Self {
        match self {
            Self::InvalidArgumentSyntax { offset, message } => Self::InvalidArgumentSyntax {
                offset: offset + delta,
                message,
            },
            Self::MalformedTagName { offset } => Self::MalformedTagName {
                offset: offset + delta,
            },
            Self::MalformedClosingTag { offset, message } => Self::MalformedClosingTag {
                offset: offset + delta,
                message,
            },
            Self::UnterminatedTag { name, offset } => Self::UnterminatedTag {
                name,
                offset: offset + delta,
            },
            Self::MismatchedClosingTag {
                expected,
                expected_offset,
                found,
                found_offset,
            } => Self::MismatchedClosingTag {
                expected,
                expected_offset: expected_offset + delta,
                found,
                found_offset: found_offset + delta,
            },
            Self::UnmatchedClosingTag { name, offset } => Self::UnmatchedClosingTag {
                name,
                offset: offset + delta,
            },
            Self::NestingTooDeep {
                name,
                offset,
                limit,
            } => Self::NestingTooDeep {
                name,
                offset: offset + delta,
                limit,
            },
        }
    }
}
