//! Shortcode handler trait.

use shortcode_core::Arguments;

use crate::{HandlerError, ShortcodeContext, ShortcodeOutput};

/// Handler for a named shortcode: `<<name args>>content<</name>>` or `<<name args/>>`.
///
/// Handlers receive the shortcode's arguments and its content with every
/// nested shortcode already resolved.
///
/// # Thread Safety
///
/// Handlers are `Send + Sync` and take `&self`: a single [`Resolver`](crate::Resolver)
/// is shared by every document of a parallel batch. Handlers that need
/// per-document state keep it in the [`ShortcodeContext`] metadata instead.
///
/// # Example
///
/// ```
/// use shortcode_core::Arguments;
/// use shortcode_render::{HandlerError, ShortcodeContext, ShortcodeHandler, ShortcodeOutput};
///
/// struct Note;
///
/// impl ShortcodeHandler for Note {
///     fn name(&self) -> &str { "note" }
///
///     fn render(
///         &self,
///         args: &Arguments,
///         content: &str,
///         _ctx: &ShortcodeContext,
///     ) -> Result<ShortcodeOutput, HandlerError> {
///         let title = args.get("title").unwrap_or("Note");
///         Ok(ShortcodeOutput::text(format!(
///             r#"<div class="note"><p class="title">{title}</p>{content}</div>"#
///         )))
///     }
/// }
/// ```
pub trait ShortcodeHandler: Send + Sync {
    /// Shortcode name matched against tag names (case-sensitive).
    fn name(&self) -> &str;

    /// Render one shortcode instance.
    ///
    /// `content` is empty for self-closing shortcodes.
    fn render(
        &self,
        args: &Arguments,
        content: &str,
        ctx: &ShortcodeContext,
    ) -> Result<ShortcodeOutput, HandlerError>;
}

/// Handler backed by a closure, created by [`Resolver::with_fn`](crate::Resolver::with_fn).
pub(crate) struct FnHandler<F> {
    name: String,
    render: F,
}

impl<F> FnHandler<F> {
    pub(crate) fn new(name: impl Into<String>, render: F) -> Self {
        Self {
            name: name.into(),
            render,
        }
    }
}

impl<F> ShortcodeHandler for FnHandler<F>
where
    F: Fn(&Arguments, &str, &ShortcodeContext) -> Result<ShortcodeOutput, HandlerError>
        + Send
        + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn render(
        &self,
        args: &Arguments,
        content: &str,
        ctx: &ShortcodeContext,
    ) -> Result<ShortcodeOutput, HandlerError> {
        (self.render)(args, content, ctx)
    }
}
