//! Shortcode output types.

/// Output of a shortcode handler.
///
/// # Example
///
/// ```
/// use shortcode_render::ShortcodeOutput;
///
/// // Replace the shortcode with text
/// let output = ShortcodeOutput::text("<kbd>Ctrl+C</kbd>");
///
/// // Replace the shortcode with text that may contain more shortcodes
/// let output = ShortcodeOutput::reprocess("<<meta title/>>");
///
/// // Leave the shortcode in place
/// let output = ShortcodeOutput::Skip;
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShortcodeOutput {
    /// Final replacement text.
    Text(String),
    /// Replacement text that is scanned and resolved again.
    ///
    /// Used by `include` to expand shortcodes inside included files.
    Reprocess(String),
    /// Keep the original tags around the resolved content.
    Skip,
}

impl ShortcodeOutput {
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    #[must_use]
    pub fn reprocess(s: impl Into<String>) -> Self {
        Self::Reprocess(s.into())
    }
}
