//! Tag scanner.
//!
//! Single forward pass over a buffer that yields opening, self-closing and
//! closing tag events with their byte spans. Text between tags is never
//! tokenized.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::{Delimiters, ScanError, Span};

/// Escape character inside quoted argument values.
const ESCAPE: char = '\\';

/// Raw tag recognized by the [`Scanner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagEvent<'a> {
    /// Opening tag: `<<name args>>`. The span covers the whole tag.
    Open {
        name: &'a str,
        args: &'a str,
        args_offset: usize,
        span: Span,
    },
    /// Self-closing tag: `<<name args/>>`.
    SelfClose {
        name: &'a str,
        args: &'a str,
        args_offset: usize,
        span: Span,
    },
    /// Closing tag: `<</name>>`.
    Close { name: &'a str, span: Span },
}

impl TagEvent<'_> {
    /// Span of the whole tag.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Open { span, .. } | Self::SelfClose { span, .. } | Self::Close { span, .. } => {
                *span
            }
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Open { name, .. } | Self::SelfClose { name, .. } | Self::Close { name, .. } => {
                name
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminator {
    Close,
    SelfClose,
}

/// Iterator over the tag events of a buffer.
///
/// The iterator stops after the first error. Dropping it between events
/// abandons the scan without side effects.
///
/// # Example
///
/// ```
/// use shortcode_core::{Delimiters, Scanner, TagEvent};
///
/// let delimiters = Delimiters::default();
/// let events: Vec<_> = Scanner::new("a <<b x=1>>c<</b>>", &delimiters)
///     .collect::<Result<_, _>>()
///     .unwrap();
///
/// assert_eq!(events.len(), 2);
/// assert!(matches!(events[0], TagEvent::Open { name: "b", .. }));
/// assert!(matches!(events[1], TagEvent::Close { name: "b", .. }));
/// ```
pub struct Scanner<'a> {
    text: &'a str,
    delimiters: &'a Delimiters,
    pos: usize,
    done: bool,
}

impl<'a> Scanner<'a> {
    #[must_use]
    pub fn new(text: &'a str, delimiters: &'a Delimiters) -> Self {
        Self {
            text,
            delimiters,
            pos: 0,
            done: false,
        }
    }

    /// Byte offset where scanning resumes.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    fn next_event(&mut self) -> Option<Result<TagEvent<'a>, ScanError>> {
        let rest = &self.text[self.pos..];
        let open_at = rest.find(self.delimiters.open());
        // A closing prefix only matters if it starts before the next open marker.
        let search_end = open_at.map_or(rest.len(), |at| at + self.delimiters.close_open().len());
        let close_at = rest
            .get(..search_end)
            .unwrap_or(rest)
            .find(self.delimiters.close_open());

        let start = self.pos
            + match (open_at, close_at) {
                (Some(a), Some(b)) => a.min(b),
                (Some(a), None) | (None, Some(a)) => a,
                (None, None) => {
                    self.pos = self.text.len();
                    return None;
                }
            };

        let at = &self.text[start..];
        let is_open = at.starts_with(self.delimiters.open());
        let is_close = at.starts_with(self.delimiters.close_open());

        let result = match (is_open, is_close) {
            (true, true) if self.delimiters.open().len() > self.delimiters.close_open().len() => {
                self.scan_open(start)
            }
            (_, true) => self.scan_close(start),
            _ => self.scan_open(start),
        };

        if let Ok(event) = &result {
            self.pos = event.span().end;
        }
        Some(result)
    }

    fn scan_open(&self, start: usize) -> Result<TagEvent<'a>, ScanError> {
        let name_start = start + self.delimiters.open().len();
        let name_end = self.name_end(name_start);
        let name = &self.text[name_start..name_end];

        if name.is_empty() {
            return Err(ScanError::MalformedTagName { offset: start });
        }

        let after_name = &self.text[name_end..];
        match after_name.chars().next() {
            None => {
                return Err(ScanError::UnterminatedTag {
                    name: name.to_owned(),
                    offset: start,
                });
            }
            Some(c)
                if !c.is_whitespace()
                    && !after_name.starts_with(self.delimiters.close())
                    && !after_name.starts_with(self.delimiters.self_close()) =>
            {
                return Err(ScanError::MalformedTagName { offset: start });
            }
            Some(_) => {}
        }

        let Some((term_pos, terminator)) = self
            .find_terminator(name_end)
            .or_else(|| self.find_terminator_ignoring_quotes(name_end))
        else {
            return Err(ScanError::UnterminatedTag {
                name: name.to_owned(),
                offset: start,
            });
        };

        let args = &self.text[name_end..term_pos];
        Ok(match terminator {
            Terminator::Close => TagEvent::Open {
                name,
                args,
                args_offset: name_end,
                span: Span::new(start, term_pos + self.delimiters.close().len()),
            },
            Terminator::SelfClose => TagEvent::SelfClose {
                name,
                args,
                args_offset: name_end,
                span: Span::new(start, term_pos + self.delimiters.self_close().len()),
            },
        })
    }

    fn scan_close(&self, start: usize) -> Result<TagEvent<'a>, ScanError> {
        let name_start = start + self.delimiters.close_open().len();
        let name_end = self.name_end(name_start);
        let name = &self.text[name_start..name_end];

        if name.is_empty() {
            return Err(ScanError::MalformedClosingTag {
                offset: start,
                message: "missing shortcode name".to_owned(),
            });
        }

        let after_name = &self.text[name_end..];
        let trimmed = after_name.trim_start();
        let term_pos = name_end + (after_name.len() - trimmed.len());

        if trimmed.starts_with(self.delimiters.close()) {
            return Ok(TagEvent::Close {
                name,
                span: Span::new(start, term_pos + self.delimiters.close().len()),
            });
        }

        match trimmed.chars().next() {
            None => Err(ScanError::UnterminatedTag {
                name: name.to_owned(),
                offset: start,
            }),
            Some(c) => Err(ScanError::MalformedClosingTag {
                offset: start,
                message: format!("unexpected `{c}` after `{name}`"),
            }),
        }
    }

    fn name_end(&self, from: usize) -> usize {
        self.text[from..]
            .find(|c: char| !is_name_char(c))
            .map_or(self.text.len(), |i| from + i)
    }

    /// Find the tag terminator, skipping over quoted argument values.
    ///
    /// Quotes are recognized where [`Arguments::parse`](crate::Arguments::parse)
    /// reads a quoted value: at the start of a token or right after `key=`.
    /// Returns `None` at end of buffer, including when a quote never closes.
    fn find_terminator(&self, from: usize) -> Option<(usize, Terminator)> {
        let mut chars: Peekable<CharIndices<'_>> = self.text[from..].char_indices().peekable();
        let mut quote: Option<char> = None;
        let mut token = Token::Start;

        while let Some((i, c)) = chars.next() {
            if let Some(q) = quote {
                if c == ESCAPE {
                    chars.next_if(|&(_, next)| next == q || next == ESCAPE);
                } else if c == q {
                    quote = None;
                    token = Token::Value;
                }
                continue;
            }
            if let Some(terminator) = self.terminator_at(from + i) {
                return Some((from + i, terminator));
            }
            token = match (token, c) {
                (_, c) if c.is_whitespace() => Token::Start,
                (Token::Start | Token::ValueStart, '"' | '\'') => {
                    quote = Some(c);
                    token
                }
                (Token::Start | Token::Key, '=') => Token::ValueStart,
                (Token::Start | Token::Key, _) => Token::Key,
                (Token::ValueStart | Token::Value, _) => Token::Value,
            };
        }

        None
    }

    /// Local backtrack for an unterminated quote: locate the terminator as if
    /// quotes did not exist, leaving the quote error to the argument parser.
    fn find_terminator_ignoring_quotes(&self, from: usize) -> Option<(usize, Terminator)> {
        self.text[from..]
            .char_indices()
            .find_map(|(i, _)| self.terminator_at(from + i).map(|t| (from + i, t)))
    }

    fn terminator_at(&self, pos: usize) -> Option<Terminator> {
        let rest = &self.text[pos..];
        if rest.starts_with(self.delimiters.self_close()) {
            Some(Terminator::SelfClose)
        } else if rest.starts_with(self.delimiters.close()) {
            Some(Terminator::Close)
        } else {
            None
        }
    }
}

/// Position inside the attribute text, mirroring the argument tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    /// After whitespace, before any character of a token.
    Start,
    /// Inside a key or a positional token.
    Key,
    /// Right after `key=`.
    ValueStart,
    /// Inside an unquoted value, where quotes and `=` are literal.
    Value,
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<TagEvent<'a>, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.next_event();
        if !matches!(item, Some(Ok(_))) {
            self.done = true;
        }
        item
    }
}

impl std::iter::FusedIterator for Scanner<'_> {}

/// Shortcode names contain only alphanumeric characters, hyphens, and underscores.
pub(crate) fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}
