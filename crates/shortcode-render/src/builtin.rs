//! Built-in shortcode handlers.

use shortcode_core::Arguments;

use crate::{HandlerError, ShortcodeContext, ShortcodeHandler, ShortcodeOutput};

/// `<<include path="snippets/intro.md"/>>` or `<<include snippets/intro.md/>>`.
///
/// Reads the file relative to the base directory and resolves shortcodes in
/// its content. Paths that leave the base directory are rejected.
#[derive(Debug, Default)]
pub struct IncludeShortcode;

impl ShortcodeHandler for IncludeShortcode {
    fn name(&self) -> &str {
        "include"
    }

    fn render(
        &self,
        args: &Arguments,
        _content: &str,
        ctx: &ShortcodeContext,
    ) -> Result<ShortcodeOutput, HandlerError> {
        let relative = args
            .get("path")
            .or_else(|| args.positional().next())
            .ok_or_else(|| HandlerError::new("missing include path"))?;

        let path = ctx.resolve_path_safe(relative).ok_or_else(|| {
            HandlerError::new(format!("include path `{relative}` escapes the base directory"))
        })?;

        let content = ctx.read(&path).map_err(|e| {
            HandlerError::new(format!("failed to read `{}`: {e}", path.display()))
        })?;

        tracing::debug!(path = %path.display(), bytes = content.len(), "Included file");
        Ok(ShortcodeOutput::Reprocess(content))
    }
}

/// `<<meta title/>>` or `<<meta key=title default="Untitled"/>>`.
///
/// Looks up a value in the ambient metadata. Fails when the key is missing
/// and no default is given.
#[derive(Debug, Default)]
pub struct MetaShortcode;

impl ShortcodeHandler for MetaShortcode {
    fn name(&self) -> &str {
        "meta"
    }

    fn render(
        &self,
        args: &Arguments,
        _content: &str,
        ctx: &ShortcodeContext,
    ) -> Result<ShortcodeOutput, HandlerError> {
        let key = args
            .get("key")
            .or_else(|| args.positional().next())
            .ok_or_else(|| HandlerError::new("missing metadata key"))?;

        match ctx.meta(key).or_else(|| args.get("default")) {
            Some(value) => Ok(ShortcodeOutput::text(value)),
            None => Err(HandlerError::new(format!("metadata key `{key}` is not set"))),
        }
    }
}
