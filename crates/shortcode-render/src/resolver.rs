//! Shortcode resolver.
//!
//! Scans a document, renders every shortcode innermost-first through the
//! registered handlers and splices the results back into the text.

use std::borrow::Cow;
use std::io;
use std::path::{Path, PathBuf};

use shortcode_core::{Arguments, Delimiters, LineIndex, Segment, Shortcode, scan_with};

use crate::batch::Document;
use crate::builtin::{IncludeShortcode, MetaShortcode};
use crate::handler::FnHandler;
use crate::{
    HandlerError, Metadata, RenderError, ShortcodeContext, ShortcodeHandler, ShortcodeOutput,
};

/// Type alias for the file reading callback function.
pub type ReadFileFn = dyn Fn(&Path) -> io::Result<String> + Send + Sync;

/// Configuration for the shortcode resolver.
pub struct ResolverConfig {
    /// Tag delimiters.
    pub delimiters: Delimiters,
    /// Base directory for resolving relative paths (e.g., for `include`).
    pub base_dir: PathBuf,
    /// Path to the document being resolved (if known).
    pub source_path: Option<PathBuf>,
    /// Callback to read files from the file system.
    ///
    /// Default: `std::fs::read_to_string`
    pub read_file: Option<Box<ReadFileFn>>,
    /// Maximum number of nested reprocessing levels.
    ///
    /// Default: 10
    pub max_depth: usize,
    /// Leave shortcodes without a handler in place instead of failing.
    pub allow_unknown: bool,
    /// Metadata visible to every handler.
    pub metadata: Metadata,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            delimiters: Delimiters::default(),
            base_dir: PathBuf::from("."),
            source_path: None,
            read_file: None,
            max_depth: 10,
            allow_unknown: false,
            metadata: Metadata::new(),
        }
    }

    #[must_use]
    pub fn with_delimiters(mut self, delimiters: Delimiters) -> Self {
        self.delimiters = delimiters;
        self
    }

    #[must_use]
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    #[must_use]
    pub fn with_source_path(mut self, source_path: impl Into<PathBuf>) -> Self {
        self.source_path = Some(source_path.into());
        self
    }

    /// Set the file reading callback.
    #[must_use]
    pub fn with_read_file<F>(mut self, read_file: F) -> Self
    where
        F: Fn(&Path) -> io::Result<String> + Send + Sync + 'static,
    {
        self.read_file = Some(Box::new(read_file));
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_allow_unknown(mut self, allow_unknown: bool) -> Self {
        self.allow_unknown = allow_unknown;
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    fn read_file(&self) -> &dyn Fn(&Path) -> io::Result<String> {
        match &self.read_file {
            Some(read_file) => read_file.as_ref(),
            None => &default_read_file,
        }
    }
}

fn default_read_file(path: &Path) -> io::Result<String> {
    std::fs::read_to_string(path)
}

/// Where a piece of text being resolved comes from.
struct Scope<'a> {
    source_path: Option<&'a Path>,
    metadata: &'a Metadata,
    depth: usize,
    /// Line of the shortcode whose output is being reprocessed.
    line: Option<usize>,
}

/// Resolves shortcodes in text through registered handlers.
///
/// Nested shortcodes are rendered before their parents, so every handler
/// receives content that is already fully resolved. Output returned as
/// [`ShortcodeOutput::Reprocess`] is scanned again, up to
/// [`max_depth`](ResolverConfig::max_depth) levels.
///
/// # Example
///
/// ```
/// use shortcode_render::{Resolver, ResolverConfig, ShortcodeOutput};
///
/// let resolver = Resolver::new(ResolverConfig::new())
///     .with_fn("upper", |_, content, _| Ok(ShortcodeOutput::text(content.to_uppercase())));
///
/// let output = resolver.resolve("say <<upper>>hi<</upper>>!").unwrap();
/// assert_eq!(output, "say HI!");
/// ```
pub struct Resolver {
    config: ResolverConfig,
    handlers: Vec<Box<dyn ShortcodeHandler>>,
}

impl Resolver {
    /// Create a resolver without any handlers.
    #[must_use]
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            handlers: Vec::new(),
        }
    }

    /// Register the built-in `include` and `meta` handlers.
    #[must_use]
    pub fn with_builtins(self) -> Self {
        self.with_handler(IncludeShortcode).with_handler(MetaShortcode)
    }

    /// Register a handler. A later handler with the same name replaces an earlier one.
    #[must_use]
    pub fn with_handler<H: ShortcodeHandler + 'static>(mut self, handler: H) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Register a closure as the handler for `name`.
    #[must_use]
    pub fn with_fn<F>(self, name: impl Into<String>, render: F) -> Self
    where
        F: Fn(&Arguments, &str, &ShortcodeContext) -> Result<ShortcodeOutput, HandlerError>
            + Send
            + Sync
            + 'static,
    {
        self.with_handler(FnHandler::new(name, render))
    }

    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Whether a handler is registered under `name`.
    #[must_use]
    pub fn has_handler(&self, name: &str) -> bool {
        self.handler(name).is_some()
    }

    /// Resolve every shortcode in `text`.
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be scanned, a shortcode has no
    /// handler (unless unknown shortcodes are allowed), a handler fails or
    /// reprocessing nests deeper than the configured limit.
    pub fn resolve(&self, text: &str) -> Result<String, RenderError> {
        let scope = Scope {
            source_path: self.config.source_path.as_deref(),
            metadata: &self.config.metadata,
            depth: 0,
            line: None,
        };
        self.resolve_text(text, &scope)
    }

    /// Resolve a document, layering its metadata over the configured metadata.
    ///
    /// # Errors
    ///
    /// Same as [`resolve`](Self::resolve).
    pub fn resolve_document(&self, document: &Document) -> Result<String, RenderError> {
        let metadata = if document.metadata.is_empty() {
            Cow::Borrowed(&self.config.metadata)
        } else {
            let mut merged = self.config.metadata.clone();
            merged.extend(document.metadata.clone());
            Cow::Owned(merged)
        };

        let scope = Scope {
            source_path: document
                .path
                .as_deref()
                .or(self.config.source_path.as_deref()),
            metadata: &metadata,
            depth: 0,
            line: None,
        };
        self.resolve_text(&document.content, &scope)
    }

    fn handler(&self, name: &str) -> Option<&dyn ShortcodeHandler> {
        self.handlers
            .iter()
            .rev()
            .find(|h| h.name() == name)
            .map(AsRef::as_ref)
    }

    fn resolve_text(&self, text: &str, scope: &Scope<'_>) -> Result<String, RenderError> {
        let locations = scan_with(text, &self.config.delimiters)?;
        if locations.is_empty() {
            return Ok(text.to_owned());
        }

        let lines = LineIndex::new(text);
        // In post-order a shortcode's children are the last entries rendered.
        let mut rendered: Vec<String> = Vec::new();
        for shortcode in locations.innermost_first() {
            let children = rendered.split_off(rendered.len() - shortcode.children().len());
            let content = splice(shortcode.segments(text), children);
            rendered.push(self.render_shortcode(text, shortcode, &content, &lines, scope)?);
        }
        Ok(splice(locations.segments(text), rendered))
    }

    fn render_shortcode(
        &self,
        text: &str,
        shortcode: &Shortcode,
        content: &str,
        lines: &LineIndex,
        scope: &Scope<'_>,
    ) -> Result<String, RenderError> {
        let name = shortcode.name();
        let offset = shortcode.start_offset();

        let Some(handler) = self.handler(name) else {
            if self.config.allow_unknown {
                tracing::warn!(name, offset, "No handler for shortcode, leaving it in place");
                return Ok(passthrough(text, shortcode, content));
            }
            return Err(RenderError::UnknownDirective {
                name: name.to_owned(),
                offset,
            });
        };

        let line = scope.line.unwrap_or_else(|| lines.line(offset));
        let ctx = ShortcodeContext {
            source_path: scope.source_path,
            base_dir: &self.config.base_dir,
            line,
            depth: scope.depth,
            metadata: scope.metadata,
            read_file: self.config.read_file(),
            on_disk: self.config.read_file.is_none(),
        };

        tracing::debug!(name, line, depth = scope.depth, "Rendering shortcode");
        let output = handler
            .render(shortcode.arguments(), content, &ctx)
            .map_err(|err| RenderError::Handler {
                name: name.to_owned(),
                offset,
                message: err.message().to_owned(),
            })?;

        match output {
            ShortcodeOutput::Text(rendered) => Ok(rendered),
            ShortcodeOutput::Skip => Ok(passthrough(text, shortcode, content)),
            ShortcodeOutput::Reprocess(nested) => {
                if scope.depth >= self.config.max_depth {
                    tracing::warn!(name, offset, max_depth = self.config.max_depth, "Reprocess depth limit reached");
                    return Err(RenderError::DepthExceeded {
                        name: name.to_owned(),
                        offset,
                        max_depth: self.config.max_depth,
                    });
                }
                let nested_scope = Scope {
                    source_path: scope.source_path,
                    metadata: scope.metadata,
                    depth: scope.depth + 1,
                    line: Some(line),
                };
                self.resolve_text(&nested, &nested_scope)
                    .map_err(|err| relocate(err, name, offset))
            }
        }
    }
}

/// Join segments, replacing each shortcode with its rendered output in order.
fn splice<'a>(segments: impl Iterator<Item = Segment<'a>>, rendered: Vec<String>) -> String {
    let mut rendered = rendered.into_iter();
    let mut output = String::new();
    for segment in segments {
        match segment {
            Segment::Text(t) => output.push_str(t),
            Segment::Shortcode(_) => output.extend(rendered.next()),
        }
    }
    output
}

/// Original tags around the resolved content.
fn passthrough(text: &str, shortcode: &Shortcode, content: &str) -> String {
    let span = shortcode.span();
    let content_span = shortcode.content_span();
    let open_tag = &text[span.start..content_span.start];
    let close_tag = &text[content_span.end..span.end];
    format!("{open_tag}{content}{close_tag}")
}

/// Report an error from reprocessed output at the shortcode that produced it.
fn relocate(err: RenderError, parent: &str, offset: usize) -> RenderError {
    match err {
        RenderError::Scan(scan) => RenderError::Handler {
            name: parent.to_owned(),
            offset,
            message: scan.to_string(),
        },
        RenderError::UnknownDirective { name, .. } => RenderError::UnknownDirective { name, offset },
        RenderError::Handler { name, message, .. } => RenderError::Handler {
            name,
            offset,
            message,
        },
        RenderError::DepthExceeded {
            name, max_depth, ..
        } => RenderError::DepthExceeded {
            name,
            offset,
            max_depth,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shortcode_core::ScanError;
    use std::collections::HashMap;

    static_assertions::assert_impl_all!(Resolver: Send, Sync);

    fn files(entries: &[(&str, &str)]) -> impl Fn(&Path) -> io::Result<String> + Send + Sync + use<> {
        let files: HashMap<PathBuf, String> = entries
            .iter()
            .map(|(path, content)| (Path::new("/docs").join(path), (*content).to_owned()))
            .collect();
        move |path: &Path| {
            files
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "not found"))
        }
    }

    fn upper() -> Resolver {
        Resolver::new(ResolverConfig::new())
            .with_fn("upper", |_, content, _| Ok(ShortcodeOutput::text(content.to_uppercase())))
    }

    #[test]
    fn test_plain_text_unchanged() {
        let resolver = upper();
        assert_eq!(resolver.resolve("no tags here").unwrap(), "no tags here");
        assert_eq!(resolver.resolve("").unwrap(), "");
    }

    #[test]
    fn test_nested_resolved_before_parent() {
        let metadata = Metadata::from([("title".to_owned(), "guide".to_owned())]);
        let resolver = Resolver::new(ResolverConfig::new().with_metadata(metadata))
            .with_builtins()
            .with_fn("upper", |_, content, _| Ok(ShortcodeOutput::text(content.to_uppercase())));

        let output = resolver
            .resolve("[<<upper>>a <<meta title/>> b<</upper>>]")
            .unwrap();
        assert_eq!(output, "[A GUIDE B]");
    }

    #[test]
    fn test_handler_receives_arguments() {
        let resolver = Resolver::new(ResolverConfig::new()).with_fn("link", |args, content, _| {
            let href = args.get("href").unwrap_or("#");
            Ok(ShortcodeOutput::text(format!(r#"<a href="{href}">{content}</a>"#)))
        });

        let output = resolver
            .resolve(r#"see <<link href="/a b">>here<</link>>"#)
            .unwrap();
        assert_eq!(output, r#"see <a href="/a b">here</a>"#);
    }

    #[test]
    fn test_unknown_shortcode_is_error() {
        let err = upper().resolve("ab <<nope/>>").unwrap_err();
        assert_eq!(
            err,
            RenderError::UnknownDirective {
                name: "nope".to_owned(),
                offset: 3,
            }
        );
    }

    #[test]
    fn test_unknown_shortcode_passthrough() {
        let resolver = Resolver::new(ResolverConfig::new().with_allow_unknown(true))
            .with_fn("upper", |_, content, _| Ok(ShortcodeOutput::text(content.to_uppercase())));

        let output = resolver
            .resolve("<<x a=1>>in <<upper>>b<</upper>><</x>> <<y/>>")
            .unwrap();
        assert_eq!(output, "<<x a=1>>in B<</x>> <<y/>>");
    }

    #[test]
    fn test_skip_keeps_tags() {
        let resolver = Resolver::new(ResolverConfig::new())
            .with_fn("keep", |_, _, _| Ok(ShortcodeOutput::Skip));
        assert_eq!(
            resolver.resolve("<<keep>>x<</keep>>").unwrap(),
            "<<keep>>x<</keep>>"
        );
    }

    #[test]
    fn test_handler_error() {
        let resolver = Resolver::new(ResolverConfig::new())
            .with_fn("fail", |_, _, _| Err(HandlerError::new("boom")));
        let err = resolver.resolve("ab<<fail/>>").unwrap_err();
        assert_eq!(
            err,
            RenderError::Handler {
                name: "fail".to_owned(),
                offset: 2,
                message: "boom".to_owned(),
            }
        );
    }

    #[test]
    fn test_scan_error() {
        let err = upper().resolve("x <<upper>>").unwrap_err();
        assert!(matches!(
            err,
            RenderError::Scan(ScanError::UnterminatedTag { ref name, offset: 2 }) if name == "upper"
        ));
    }

    #[test]
    fn test_context_line() {
        let resolver = Resolver::new(ResolverConfig::new())
            .with_fn("line", |_, _, ctx| Ok(ShortcodeOutput::text(ctx.line.to_string())));
        assert_eq!(resolver.resolve("a\nb <<line/>>\n<<line/>>").unwrap(), "a\nb 2\n3");
    }

    #[test]
    fn test_include_reprocesses_output() {
        let config = ResolverConfig::new()
            .with_base_dir("/docs")
            .with_read_file(files(&[("a.md", "<<include b.md/>>!"), ("b.md", "B")]));
        let resolver = Resolver::new(config).with_builtins();

        assert_eq!(resolver.resolve("[<<include a.md/>>]").unwrap(), "[B!]");
    }

    #[test]
    fn test_reprocess_depth_limit() {
        let config = ResolverConfig::new()
            .with_base_dir("/docs")
            .with_max_depth(3)
            .with_read_file(files(&[("loop.md", "<<include loop.md/>>")]));
        let resolver = Resolver::new(config).with_builtins();

        let err = resolver.resolve("x <<include loop.md/>>").unwrap_err();
        assert_eq!(
            err,
            RenderError::DepthExceeded {
                name: "include".to_owned(),
                offset: 2,
                max_depth: 3,
            }
        );
    }

    #[test]
    fn test_scan_error_in_included_file() {
        let config = ResolverConfig::new()
            .with_base_dir("/docs")
            .with_read_file(files(&[("bad.md", "<<open>>")]));
        let resolver = Resolver::new(config).with_builtins();

        let err = resolver.resolve("xx <<include bad.md/>>").unwrap_err();
        assert!(matches!(
            err,
            RenderError::Handler { ref name, offset: 3, .. } if name == "include"
        ));
    }

    #[test]
    fn test_reprocessed_line_is_parent_line() {
        let config = ResolverConfig::new()
            .with_base_dir("/docs")
            .with_read_file(files(&[("a.md", "\n\n<<line/>>")]));
        let resolver = Resolver::new(config)
            .with_builtins()
            .with_fn("line", |_, _, ctx| {
                Ok(ShortcodeOutput::text(format!("{}@{}", ctx.line, ctx.depth)))
            });

        assert_eq!(resolver.resolve("\n<<include a.md/>>").unwrap(), "\n\n\n2@1");
    }

    #[test]
    fn test_later_handler_wins() {
        let resolver = Resolver::new(ResolverConfig::new())
            .with_fn("x", |_, _, _| Ok(ShortcodeOutput::text("first")))
            .with_fn("x", |_, _, _| Ok(ShortcodeOutput::text("second")));
        assert!(resolver.has_handler("x"));
        assert!(!resolver.has_handler("y"));
        assert_eq!(resolver.resolve("<<x/>>").unwrap(), "second");
    }

    #[test]
    fn test_resolve_document_layers_metadata() {
        let config = ResolverConfig::new().with_metadata(Metadata::from([
            ("site".to_owned(), "Docs".to_owned()),
            ("title".to_owned(), "Default".to_owned()),
        ]));
        let resolver = Resolver::new(config)
            .with_builtins()
            .with_fn("source", |_, _, ctx| {
                let path = ctx.source_path.map(|p| p.display().to_string());
                Ok(ShortcodeOutput::text(path.unwrap_or_default()))
            });

        let document = Document::new("<<meta site/>>/<<meta title/>> (<<source/>>)")
            .with_path("guide.md")
            .with_metadata(Metadata::from([("title".to_owned(), "Guide".to_owned())]));

        assert_eq!(
            resolver.resolve_document(&document).unwrap(),
            "Docs/Guide (guide.md)"
        );
    }

    fn nested(depth: usize) -> String {
        format!("{}x{}", "<<a>>".repeat(depth), "<</a>>".repeat(depth))
    }

    fn wrap() -> Resolver {
        Resolver::new(ResolverConfig::new())
            .with_fn("a", |_, content, _| Ok(ShortcodeOutput::text(format!("[{content}]"))))
    }

    #[test]
    fn test_deep_nesting_resolves() {
        let depth = shortcode_core::MAX_NESTING;
        let output = wrap().resolve(&nested(depth)).unwrap();
        assert_eq!(output, format!("{}x{}", "[".repeat(depth), "]".repeat(depth)));
    }

    #[test]
    fn test_excessive_nesting_is_error() {
        let err = wrap().resolve(&nested(2000)).unwrap_err();
        assert!(matches!(
            err,
            RenderError::Scan(ScanError::NestingTooDeep { .. })
        ));
    }

    #[test]
    fn test_siblings_and_children_spliced_in_order() {
        let output = wrap()
            .resolve("1<<a>>2<<a/>>3<<a>><<a>>4<</a>><</a>>5<</a>>6<<a/>>")
            .unwrap();
        assert_eq!(output, "1[2[]3[[4]]5]6[]");
    }

    #[cfg(unix)]
    #[test]
    fn test_include_rejects_symlink_out_of_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join("docs");
        let outside = dir.path().join("outside");
        std::fs::create_dir_all(&docs).unwrap();
        std::fs::create_dir_all(&outside).unwrap();
        std::fs::write(outside.join("secret.txt"), "TOP SECRET").unwrap();
        std::fs::write(docs.join("inner.md"), "inner").unwrap();
        std::os::unix::fs::symlink(&outside, docs.join("link")).unwrap();

        let resolver = Resolver::new(ResolverConfig::new().with_base_dir(&docs)).with_builtins();

        let err = resolver.resolve("<<include link/secret.txt/>>").unwrap_err();
        assert!(matches!(
            err,
            RenderError::Handler { ref name, ref message, .. }
                if name == "include" && message.contains("escapes")
        ));
        assert_eq!(resolver.resolve("<<include inner.md/>>").unwrap(), "inner");
    }

    #[test]
    fn test_custom_delimiters() {
        let delimiters = Delimiters::new("{%", "%}", "/%}", "{%/").unwrap();
        let resolver = Resolver::new(ResolverConfig::new().with_delimiters(delimiters))
            .with_fn("upper", |_, content, _| Ok(ShortcodeOutput::text(content.to_uppercase())));

        assert_eq!(
            resolver.resolve("{%upper%}a <<b/>>{%/upper%}").unwrap(),
            "A <<B/>>"
        );
    }
}
