//! Resolved shortcode locations.
//!
//! The result of a scan: an ordered forest of closed shortcodes that an
//! external resolver can substitute innermost-first.

use crate::{Arguments, Span};

/// A closed shortcode instance.
///
/// Instances are only ever constructed by finishing an open shortcode, so the
/// end offset and inner content are always present.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Shortcode {
    pub(crate) name: String,
    pub(crate) arguments: Arguments,
    pub(crate) span: Span,
    pub(crate) content_span: Span,
    pub(crate) content: String,
    pub(crate) self_closing: bool,
    pub(crate) children: Vec<Shortcode>,
}

impl Shortcode {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// Span from the first byte of the opening tag to one past the last byte
    /// of the closing tag.
    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    #[must_use]
    pub fn start_offset(&self) -> usize {
        self.span.start
    }

    #[must_use]
    pub fn end_offset(&self) -> usize {
        self.span.end
    }

    /// Raw text between the opening and closing tags, before substitution.
    ///
    /// Empty for self-closing shortcodes.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Span of [`content`](Self::content) in the scanned buffer.
    ///
    /// For self-closing shortcodes this is the empty span at the tag's end.
    #[must_use]
    pub fn content_span(&self) -> Span {
        self.content_span
    }

    #[must_use]
    pub fn is_self_closing(&self) -> bool {
        self.self_closing
    }

    /// Directly nested shortcodes in ascending start order.
    #[must_use]
    pub fn children(&self) -> &[Shortcode] {
        &self.children
    }
}

/// Ordered forest of the shortcodes found in one document.
///
/// Top-level shortcodes are stored in ascending start order and each carries
/// its children in the same order. The value is immutable once built.
///
/// # Example
///
/// ```
/// use shortcode_core::scan;
///
/// let locations = scan("a <<outer>><<inner/>><</outer>> b").unwrap();
/// let names: Vec<_> = locations.innermost_first().map(|s| s.name()).collect();
/// assert_eq!(names, vec!["inner", "outer"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct Locations {
    shortcodes: Vec<Shortcode>,
}

impl Locations {
    pub(crate) fn new(shortcodes: Vec<Shortcode>) -> Self {
        Self { shortcodes }
    }

    /// Top-level shortcodes.
    #[must_use]
    pub fn shortcodes(&self) -> &[Shortcode] {
        &self.shortcodes
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shortcodes.is_empty()
    }

    /// Number of shortcodes at every nesting level.
    #[must_use]
    pub fn total(&self) -> usize {
        self.depth_first().count()
    }

    /// Every shortcode, parents before children (pre-order).
    pub fn depth_first(&self) -> DepthFirst<'_> {
        DepthFirst {
            stack: self.shortcodes.iter().rev().collect(),
        }
    }

    /// Every shortcode, children before parents (post-order).
    ///
    /// This is the order in which a resolver has to render shortcodes so a
    /// parent sees its already-resolved content.
    pub fn innermost_first(&self) -> InnermostFirst<'_> {
        InnermostFirst {
            roots: self.shortcodes.iter(),
            stack: Vec::new(),
        }
    }

    /// Split `text` into passthrough text and top-level shortcode spans.
    ///
    /// `text` must be the buffer these locations were scanned from.
    /// Concatenating every segment's source slice yields `text` unchanged.
    pub fn segments<'a>(&'a self, text: &'a str) -> Segments<'a> {
        Segments::new(text, &self.shortcodes, 0, text.len())
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Shortcode> {
        self.shortcodes
    }
}

impl<'a> IntoIterator for &'a Locations {
    type Item = &'a Shortcode;
    type IntoIter = std::slice::Iter<'a, Shortcode>;

    fn into_iter(self) -> Self::IntoIter {
        self.shortcodes.iter()
    }
}

/// Pre-order iterator returned by [`Locations::depth_first`].
pub struct DepthFirst<'a> {
    stack: Vec<&'a Shortcode>,
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = &'a Shortcode;

    fn next(&mut self) -> Option<Self::Item> {
        let shortcode = self.stack.pop()?;
        self.stack.extend(shortcode.children.iter().rev());
        Some(shortcode)
    }
}

/// Post-order iterator returned by [`Locations::innermost_first`].
pub struct InnermostFirst<'a> {
    roots: std::slice::Iter<'a, Shortcode>,
    /// Path from the current root, with the index of the next child to visit.
    stack: Vec<(&'a Shortcode, usize)>,
}

impl<'a> Iterator for InnermostFirst<'a> {
    type Item = &'a Shortcode;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Some((shortcode, next_child)) = self.stack.last_mut() else {
                let root = self.roots.next()?;
                self.stack.push((root, 0));
                continue;
            };
            let shortcode: &'a Shortcode = *shortcode;
            match shortcode.children.get(*next_child) {
                Some(child) => {
                    *next_child += 1;
                    self.stack.push((child, 0));
                }
                None => return self.stack.pop().map(|(shortcode, _)| shortcode),
            }
        }
    }
}

/// A piece of a buffer: either untouched text or a shortcode span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text outside any shortcode at this level.
    Text(&'a str),
    /// A shortcode covering its full span.
    Shortcode(&'a Shortcode),
}

/// Iterator returned by [`Locations::segments`] and [`Shortcode::segments`].
pub struct Segments<'a> {
    text: &'a str,
    shortcodes: std::slice::Iter<'a, Shortcode>,
    pending: Option<&'a Shortcode>,
    pos: usize,
    end: usize,
}

impl<'a> Segments<'a> {
    fn new(text: &'a str, shortcodes: &'a [Shortcode], pos: usize, end: usize) -> Self {
        Self {
            text,
            shortcodes: shortcodes.iter(),
            pending: None,
            pos,
            end,
        }
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(shortcode) = self.pending.take() {
            self.pos = shortcode.span.end;
            return Some(Segment::Shortcode(shortcode));
        }

        match self.shortcodes.next() {
            Some(shortcode) if shortcode.span.start > self.pos => {
                let text = &self.text[self.pos..shortcode.span.start];
                self.pending = Some(shortcode);
                Some(Segment::Text(text))
            }
            Some(shortcode) => {
                self.pos = shortcode.span.end;
                Some(Segment::Shortcode(shortcode))
            }
            None if self.pos < self.end => {
                let text = &self.text[self.pos..self.end];
                self.pos = self.end;
                Some(Segment::Text(text))
            }
            None => None,
        }
    }
}

impl Shortcode {
    /// Split this shortcode's content into passthrough text and child spans.
    ///
    /// `text` must be the buffer this shortcode was scanned from.
    pub fn segments<'a>(&'a self, text: &'a str) -> Segments<'a> {
        Segments::new(
            text,
            &self.children,
            self.content_span.start,
            self.content_span.end,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan;
    use pretty_assertions::assert_eq;

    static_assertions::assert_impl_all!(super::Locations: Send, Sync);

    fn render_segments(text: &str, locations: &Locations) -> String {
        locations
            .segments(text)
            .map(|segment| match segment {
                Segment::Text(t) => t,
                Segment::Shortcode(s) => s.span().slice(text),
            })
            .collect()
    }

    #[test]
    fn test_depth_first_order() {
        let locations = scan("<<a>><<b>><<c/>><</b>><<d/>><</a>><<e/>>").unwrap();
        let names: Vec<_> = locations.depth_first().map(Shortcode::name).collect();
        assert_eq!(names, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(locations.total(), 5);
    }

    #[test]
    fn test_innermost_first_order() {
        let locations = scan("<<a>><<b>><<c/>><</b>><<d/>><</a>><<e/>>").unwrap();
        let names: Vec<_> = locations.innermost_first().map(Shortcode::name).collect();
        assert_eq!(names, vec!["c", "b", "d", "a", "e"]);
    }

    #[test]
    fn test_segments_round_trip() {
        let text = "start <<x/>> mid <<y>>in<</y>> end";
        let locations = scan(text).unwrap();
        let segments: Vec<_> = locations.segments(text).collect();

        assert_eq!(segments.len(), 5);
        assert_eq!(segments[0], Segment::Text("start "));
        assert!(matches!(segments[1], Segment::Shortcode(s) if s.name() == "x"));
        assert_eq!(segments[2], Segment::Text(" mid "));
        assert!(matches!(segments[3], Segment::Shortcode(s) if s.name() == "y"));
        assert_eq!(segments[4], Segment::Text(" end"));
        assert_eq!(render_segments(text, &locations), text);
    }

    #[test]
    fn test_segments_adjacent_shortcodes() {
        let text = "<<x/>><<y/>>";
        let locations = scan(text).unwrap();
        let segments: Vec<_> = locations.segments(text).collect();
        assert_eq!(segments.len(), 2);
        assert_eq!(render_segments(text, &locations), text);
    }

    #[test]
    fn test_child_segments() {
        let text = "<<p>>a<<c/>>b<</p>>";
        let locations = scan(text).unwrap();
        let parent = &locations.shortcodes()[0];
        let rebuilt: String = parent
            .segments(text)
            .map(|segment| match segment {
                Segment::Text(t) => t,
                Segment::Shortcode(s) => s.span().slice(text),
            })
            .collect();
        assert_eq!(rebuilt, parent.content());
        assert_eq!(rebuilt, "a<<c/>>b");
    }

    #[test]
    fn test_empty_locations() {
        let locations = scan("nothing here").unwrap();
        assert!(locations.is_empty());
        assert_eq!(locations.segments("nothing here").count(), 1);

        let empty = scan("").unwrap();
        assert_eq!(empty.segments("").count(), 0);
    }
}
