//! Nesting tracker.
//!
//! Consumes tag events, keeps a stack of open shortcodes and matches closing
//! tags by name in LIFO order.

use crate::{Arguments, Delimiters, Locations, ScanError, Scanner, Shortcode, Span, TagEvent};

/// Default limit on how many shortcodes may be open at once.
pub const MAX_NESTING: usize = 256;

/// Shortcode whose closing tag has not been seen yet.
///
/// An open shortcode has no end offset. Only the [`Tracker`] that opened it
/// can close it, which consumes the open value.
#[derive(Debug, PartialEq, Eq)]
pub struct OpenShortcode {
    name: String,
    arguments: Arguments,
    start: usize,
    open_end: usize,
    children: Vec<Shortcode>,
}

impl OpenShortcode {
    fn new(name: &str, arguments: Arguments, span: Span) -> Self {
        Self {
            name: name.to_owned(),
            arguments,
            start: span.start,
            open_end: span.end,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    #[must_use]
    pub fn start_offset(&self) -> usize {
        self.start
    }

    /// One past the last byte of the opening tag.
    #[must_use]
    pub fn open_end(&self) -> usize {
        self.open_end
    }

    /// Close the shortcode with the span of its closing tag.
    ///
    /// The inner content is the slice of `text` between the end of the opening
    /// tag and the start of the closing tag.
    #[must_use]
    pub(crate) fn finish(self, text: &str, closing_tag: Span) -> Shortcode {
        debug_assert!(self.open_end <= closing_tag.start);
        let content_span = Span::new(self.open_end, closing_tag.start);
        Shortcode {
            name: self.name,
            arguments: self.arguments,
            span: Span::new(self.start, closing_tag.end),
            content: content_span.slice(text).to_owned(),
            content_span,
            self_closing: false,
            children: self.children,
        }
    }
}

/// Builds the shortcode forest of one document from its tag events.
///
/// A tracker owns all scanning state for a single buffer. Scanning several
/// documents in parallel means one tracker per document.
///
/// # Example
///
/// ```
/// use shortcode_core::{Delimiters, Scanner, Tracker};
///
/// let text = "<<note>>hi<</note>>";
/// let delimiters = Delimiters::default();
/// let mut tracker = Tracker::new(text);
/// for event in Scanner::new(text, &delimiters) {
///     tracker.push(event.unwrap()).unwrap();
/// }
/// let locations = tracker.finish().unwrap();
/// assert_eq!(locations.shortcodes()[0].content(), "hi");
/// ```
#[derive(Debug)]
pub struct Tracker<'a> {
    text: &'a str,
    stack: Vec<OpenShortcode>,
    top_level: Vec<Shortcode>,
    max_nesting: usize,
}

impl<'a> Tracker<'a> {
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            stack: Vec::new(),
            top_level: Vec::new(),
            max_nesting: MAX_NESTING,
        }
    }

    /// Set how many shortcodes may be open at once.
    ///
    /// Opening one more fails with [`ScanError::NestingTooDeep`].
    #[must_use]
    pub fn with_max_nesting(mut self, max_nesting: usize) -> Self {
        self.max_nesting = max_nesting;
        self
    }

    /// Shortcodes currently open, outermost first.
    #[must_use]
    pub fn open_shortcodes(&self) -> &[OpenShortcode] {
        &self.stack
    }

    /// Current nesting depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Apply one tag event.
    pub fn push(&mut self, event: TagEvent<'_>) -> Result<(), ScanError> {
        tracing::trace!(?event, depth = self.stack.len(), "Shortcode tag");

        match event {
            TagEvent::Open {
                name,
                args,
                args_offset,
                span,
            } => {
                if self.stack.len() >= self.max_nesting {
                    return Err(ScanError::NestingTooDeep {
                        name: name.to_owned(),
                        offset: span.start,
                        limit: self.max_nesting,
                    });
                }
                let arguments = parse_arguments(args, args_offset)?;
                self.stack.push(OpenShortcode::new(name, arguments, span));
            }
            TagEvent::SelfClose {
                name,
                args,
                args_offset,
                span,
            } => {
                let arguments = parse_arguments(args, args_offset)?;
                self.attach(Shortcode {
                    name: name.to_owned(),
                    arguments,
                    span,
                    content_span: Span::new(span.end, span.end),
                    content: String::new(),
                    self_closing: true,
                    children: Vec::new(),
                });
            }
            TagEvent::Close { name, span } => {
                let Some(open) = self.stack.pop() else {
                    return Err(ScanError::UnmatchedClosingTag {
                        name: name.to_owned(),
                        offset: span.start,
                    });
                };
                if open.name != name {
                    return Err(ScanError::MismatchedClosingTag {
                        expected: open.name,
                        expected_offset: open.start,
                        found: name.to_owned(),
                        found_offset: span.start,
                    });
                }
                let shortcode = open.finish(self.text, span);
                self.attach(shortcode);
            }
        }

        Ok(())
    }

    /// Finish the document and publish its locations.
    ///
    /// Fails with [`ScanError::UnterminatedTag`] for the outermost shortcode
    /// that is still open.
    pub fn finish(self) -> Result<Locations, ScanError> {
        if let Some(outermost) = self.stack.first() {
            for open in &self.stack {
                tracing::debug!(name = %open.name, offset = open.start, "Unclosed shortcode");
            }
            return Err(ScanError::UnterminatedTag {
                name: outermost.name.clone(),
                offset: outermost.start,
            });
        }

        tracing::debug!(count = self.top_level.len(), "Shortcode scan completed");
        Ok(Locations::new(self.top_level))
    }

    fn attach(&mut self, shortcode: Shortcode) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(shortcode),
            None => self.top_level.push(shortcode),
        }
    }
}

fn parse_arguments(args: &str, args_offset: usize) -> Result<Arguments, ScanError> {
    Arguments::parse(args).map_err(|e| e.shifted(args_offset))
}

/// Scan `text` with the default delimiters.
pub fn scan(text: &str) -> Result<Locations, ScanError> {
    scan_with(text, &Delimiters::default())
}

/// Scan `text` with custom delimiters.
///
/// The scan is fail-fast: the first error is returned and no locations are
/// published.
pub fn scan_with(text: &str, delimiters: &Delimiters) -> Result<Locations, ScanError> {
    let mut tracker = Tracker::new(text);
    for event in Scanner::new(text, delimiters) {
        tracker.push(event?)?;
    }
    tracker.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // Open shortcodes can only be closed by the tracker that owns their buffer.
    static_assertions::assert_not_impl_any!(OpenShortcode: Clone);

    #[test]
    fn test_single_shortcode() {
        let locations = scan("a <<dir x=1>> b <</dir>> c").unwrap();
        assert_eq!(locations.shortcodes().len(), 1);

        let dir = &locations.shortcodes()[0];
        assert_eq!(dir.name(), "dir");
        assert_eq!(dir.arguments().pairs(), vec![("x", "1")]);
        assert_eq!(dir.content(), " b ");
        assert_eq!(dir.start_offset(), 2);
        assert_eq!(dir.end_offset(), 24);
        assert!(!dir.is_self_closing());
    }

    #[test]
    fn test_nested_shortcodes() {
        let text = r#"<<outer>><<inner a="v">><</inner>><</outer>>"#;
        let locations = scan(text).unwrap();
        assert_eq!(locations.shortcodes().len(), 1);

        let outer = &locations.shortcodes()[0];
        assert_eq!(outer.name(), "outer");
        assert_eq!(outer.content(), r#"<<inner a="v">><</inner>>"#);
        assert_eq!(outer.span(), Span::new(0, text.len()));
        assert_eq!(outer.children().len(), 1);

        let inner = &outer.children()[0];
        assert_eq!(inner.name(), "inner");
        assert_eq!(inner.arguments().pairs(), vec![("a", "v")]);
        assert_eq!(inner.content(), "");
        assert!(outer.span().contains(inner.span()));
    }

    #[test]
    fn test_mismatched_closing_tag() {
        let err = scan("<<a>>text<</b>>").unwrap_err();
        assert_eq!(
            err,
            ScanError::MismatchedClosingTag {
                expected: "a".to_owned(),
                expected_offset: 0,
                found: "b".to_owned(),
                found_offset: 9,
            }
        );
    }

    #[test]
    fn test_unterminated_shortcode() {
        let err = scan("<<a>>unterminated").unwrap_err();
        assert_eq!(
            err,
            ScanError::UnterminatedTag {
                name: "a".to_owned(),
                offset: 0,
            }
        );
    }

    #[test]
    fn test_unterminated_reports_outermost() {
        let err = scan("x <<a>> <<b>> <</b>> <<c>>").unwrap_err();
        assert_eq!(
            err,
            ScanError::UnterminatedTag {
                name: "a".to_owned(),
                offset: 2,
            }
        );
    }

    #[test]
    fn test_self_closing() {
        let locations = scan("<<img src=photo.png/>>").unwrap();
        let img = &locations.shortcodes()[0];
        assert_eq!(img.name(), "img");
        assert_eq!(img.arguments().pairs(), vec![("src", "photo.png")]);
        assert_eq!(img.content(), "");
        assert!(img.is_self_closing());
        assert_eq!(img.span(), Span::new(0, 22));
    }

    #[test]
    fn test_positional_argument() {
        let text = "<<tag verbatim>><</tag>>";
        let locations = scan(text).unwrap();
        assert_eq!(
            locations.shortcodes()[0].arguments().pairs(),
            vec![("", "verbatim")]
        );
    }

    #[test]
    fn test_same_name_nesting() {
        let text = "<<box>>1<<box>>2<</box>>3<</box>>";
        let locations = scan(text).unwrap();
        let outer = &locations.shortcodes()[0];
        assert_eq!(outer.content(), "1<<box>>2<</box>>3");
        assert_eq!(outer.children()[0].content(), "2");
    }

    #[test]
    fn test_siblings_ascending() {
        let text = "<<a/>> <<b>>x<</b>> <<c/>>";
        let locations = scan(text).unwrap();
        let starts: Vec<_> = locations
            .shortcodes()
            .iter()
            .map(Shortcode::start_offset)
            .collect();
        assert_eq!(starts, vec![0, 7, 20]);
    }

    #[test]
    fn test_children_in_order() {
        let text = "<<p>><<a/>><<b>><</b>><<c/>><</p>>";
        let locations = scan(text).unwrap();
        let names: Vec<_> = locations.shortcodes()[0]
            .children()
            .iter()
            .map(Shortcode::name)
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unmatched_closing_tag() {
        let err = scan("text <</a>>").unwrap_err();
        assert_eq!(
            err,
            ScanError::UnmatchedClosingTag {
                name: "a".to_owned(),
                offset: 5,
            }
        );
    }

    #[test]
    fn test_argument_error_offset_is_absolute() {
        let err = scan(r#"abc <<a x="open>>"#).unwrap_err();
        assert!(matches!(
            err,
            ScanError::InvalidArgumentSyntax { offset: 10, .. }
        ));
    }

    #[test]
    fn test_case_sensitive_names() {
        let err = scan("<<Note>><</note>>").unwrap_err();
        assert!(matches!(err, ScanError::MismatchedClosingTag { .. }));
    }

    #[test]
    fn test_tracker_state() {
        let text = "<<a>><<b>>";
        let delimiters = Delimiters::default();
        let mut tracker = Tracker::new(text);
        for event in Scanner::new(text, &delimiters) {
            tracker.push(event.unwrap()).unwrap();
        }
        assert_eq!(tracker.depth(), 2);
        let names: Vec<_> = tracker
            .open_shortcodes()
            .iter()
            .map(OpenShortcode::name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(tracker.open_shortcodes()[1].open_end(), 10);
    }

    #[test]
    fn test_finish_open_shortcode() {
        let text = "<<a k=v>>body<</a>>";
        let open = OpenShortcode::new("a", Arguments::parse("k=v").unwrap(), Span::new(0, 9));
        let closed = open.finish(text, Span::new(13, 19));
        assert_eq!(closed.content(), "body");
        assert_eq!(closed.span(), Span::new(0, 19));
        assert_eq!(closed.content_span(), Span::new(9, 13));
    }

    fn nested(depth: usize) -> String {
        format!("{}x{}", "<<a>>".repeat(depth), "<</a>>".repeat(depth))
    }

    #[test]
    fn test_nesting_at_limit() {
        let locations = scan(&nested(MAX_NESTING)).unwrap();
        assert_eq!(locations.total(), MAX_NESTING);
        assert_eq!(locations.innermost_first().next().unwrap().content(), "x");
    }

    #[test]
    fn test_nesting_too_deep() {
        let err = scan(&nested(MAX_NESTING + 1)).unwrap_err();
        assert_eq!(
            err,
            ScanError::NestingTooDeep {
                name: "a".to_owned(),
                offset: MAX_NESTING * 5,
                limit: MAX_NESTING,
            }
        );
    }

    #[test]
    fn test_very_deep_document_fails_cleanly() {
        let err = scan(&nested(20_000)).unwrap_err();
        assert!(matches!(err, ScanError::NestingTooDeep { .. }));
    }

    #[test]
    fn test_custom_nesting_limit() {
        let text = "<<a>><<b>><<c/>><</b>><</a>>";
        let delimiters = Delimiters::default();
        let mut tracker = Tracker::new(text).with_max_nesting(1);
        let err = Scanner::new(text, &delimiters)
            .map(|event| tracker.push(event.unwrap()))
            .find_map(Result::err)
            .unwrap();
        assert!(matches!(err, ScanError::NestingTooDeep { offset: 5, limit: 1, .. }));
    }

    #[test]
    fn test_custom_delimiters() {
        let delimiters = Delimiters::new("[[", "]]", "/]]", "[[/").unwrap();
        let locations = scan_with("[[a]]x[[b/]][[/a]]", &delimiters).unwrap();
        let a = &locations.shortcodes()[0];
        assert_eq!(a.content(), "x[[b/]]");
        assert_eq!(a.children()[0].name(), "b");
    }
}
