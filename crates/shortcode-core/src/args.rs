//! Shortcode argument parsing.
//!
//! Parses the attribute text of a tag: `key=value key="quoted value" positional`.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::ScanError;

/// Escape character recognized inside quoted values.
const ESCAPE: char = '\\';

/// A single `key=value` pair. Positional arguments have an empty key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Argument {
    /// Argument key (empty for positional arguments).
    pub key: String,
    /// Argument value with quotes and escapes removed.
    pub value: String,
}

impl Argument {
    /// Whether this argument was written without a key.
    #[must_use]
    pub fn is_positional(&self) -> bool {
        self.key.is_empty()
    }
}

/// Ordered shortcode arguments.
///
/// Keys may repeat and insertion order is preserved. A bare token is stored
/// as a positional argument with an empty key.
///
/// # Example
///
/// ```
/// use shortcode_core::Arguments;
///
/// let args = Arguments::parse(r#"src=photo.png alt="A photo" lazy"#).unwrap();
/// assert_eq!(args.get("src"), Some("photo.png"));
/// assert_eq!(args.get("alt"), Some("A photo"));
/// assert_eq!(args.positional().collect::<Vec<_>>(), vec!["lazy"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct Arguments {
    items: Vec<Argument>,
}

impl Arguments {
    /// Parse the attribute text of a tag.
    ///
    /// Offsets in the returned error are relative to `text`.
    pub fn parse(text: &str) -> Result<Self, ScanError> {
        let mut items = Vec::new();
        let mut chars = text.char_indices().peekable();

        loop {
            while chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}

            let Some(&(start, c)) = chars.peek() else {
                break;
            };

            // Quoted positional argument: "some value"
            if c == '"' || c == '\'' {
                let value = read_quoted(&mut chars, start)?;
                expect_token_end(&mut chars)?;
                items.push(Argument {
                    key: String::new(),
                    value,
                });
                continue;
            }

            let token = read_unquoted(&mut chars, text, start, true);

            let Some(&(eq_pos, '=')) = chars.peek() else {
                items.push(Argument {
                    key: String::new(),
                    value: token.to_owned(),
                });
                continue;
            };
            chars.next();

            if token.is_empty() {
                return Err(invalid(start, "missing key before `=`"));
            }

            let value = match chars.peek() {
                None => return Err(invalid(eq_pos, format!("missing value for `{token}`"))),
                Some(&(_, c)) if c.is_whitespace() => {
                    return Err(invalid(eq_pos, format!("missing value for `{token}`")));
                }
                Some(&(quote_pos, '"' | '\'')) => {
                    let value = read_quoted(&mut chars, quote_pos)?;
                    expect_token_end(&mut chars)?;
                    value
                }
                Some(&(value_start, _)) => {
                    read_unquoted(&mut chars, text, value_start, false).to_owned()
                }
            };

            items.push(Argument {
                key: token.to_owned(),
                value,
            });
        }

        Ok(Self { items })
    }

    /// First value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|arg| arg.key == key)
            .map(|arg| arg.value.as_str())
    }

    /// All values for `key`, in order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.items
            .iter()
            .filter(move |arg| arg.key == key)
            .map(|arg| arg.value.as_str())
    }

    /// Values of positional arguments, in order.
    pub fn positional(&self) -> impl Iterator<Item = &str> {
        self.items
            .iter()
            .filter(|arg| arg.is_positional())
            .map(|arg| arg.value.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Argument> {
        self.items.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Arguments as borrowed `(key, value)` pairs.
    #[must_use]
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.items
            .iter()
            .map(|arg| (arg.key.as_str(), arg.value.as_str()))
            .collect()
    }

    /// Reconstruct attribute text that parses back to the same arguments.
    ///
    /// Values that are empty or contain whitespace, quotes, `=` or the escape
    /// character are double-quoted.
    #[must_use]
    pub fn to_syntax(&self) -> String {
        let mut parts = Vec::with_capacity(self.items.len());
        for arg in &self.items {
            let value = quote_if_needed(&arg.value);
            if arg.is_positional() {
                parts.push(value);
            } else {
                parts.push(format!("{}={value}", arg.key));
            }
        }
        parts.join(" ")
    }
}

impl<'a> IntoIterator for &'a Arguments {
    type Item = &'a Argument;
    type IntoIter = std::slice::Iter<'a, Argument>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Arguments {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            items: iter
                .into_iter()
                .map(|(key, value)| Argument {
                    key: key.into(),
                    value: value.into(),
                })
                .collect(),
        }
    }
}

fn invalid(offset: usize, message: impl Into<String>) -> ScanError {
    ScanError::InvalidArgumentSyntax {
        offset,
        message: message.into(),
    }
}

/// Read raw characters until whitespace (or `=` when reading a key).
fn read_unquoted<'a>(
    chars: &mut Peekable<CharIndices<'_>>,
    text: &'a str,
    start: usize,
    stop_at_eq: bool,
) -> &'a str {
    let mut end = text.len();
    while let Some(&(i, c)) = chars.peek() {
        if c.is_whitespace() || (stop_at_eq && c == '=') {
            end = i;
            break;
        }
        chars.next();
    }
    &text[start..end]
}

/// Read a quoted value; the cursor must be on the opening quote.
fn read_quoted(chars: &mut Peekable<CharIndices<'_>>, open_pos: usize) -> Result<String, ScanError> {
    let Some((_, quote)) = chars.next() else {
        return Err(invalid(open_pos, "expected quote"));
    };
    let mut value = String::new();

    loop {
        match chars.next() {
            None => return Err(invalid(open_pos, format!("unterminated {quote} quote"))),
            Some((_, c)) if c == quote => return Ok(value),
            Some((_, ESCAPE)) => match chars.next_if(|&(_, next)| next == quote || next == ESCAPE) {
                Some((_, escaped)) => value.push(escaped),
                None => value.push(ESCAPE),
            },
            Some((_, c)) => value.push(c),
        }
    }
}

/// A quoted value must be followed by whitespace or the end of the text.
fn expect_token_end(chars: &mut Peekable<CharIndices<'_>>) -> Result<(), ScanError> {
    match chars.peek() {
        Some(&(i, c)) if !c.is_whitespace() => Err(invalid(
            i,
            format!("unexpected `{c}` after quoted value"),
        )),
        _ => Ok(()),
    }
}

fn quote_if_needed(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '=' | ESCAPE));
    if !needs_quotes {
        return value.to_owned();
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == ESCAPE {
            quoted.push(ESCAPE);
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pairs(text: &str) -> Vec<(String, String)> {
        Arguments::parse(text)
            .unwrap()
            .iter()
            .map(|arg| (arg.key.clone(), arg.value.clone()))
            .collect()
    }

    fn owned(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_empty_args() {
        assert!(Arguments::parse("").unwrap().is_empty());
        assert!(Arguments::parse("   \t\n").unwrap().is_empty());
    }

    #[test]
    fn test_unquoted_value() {
        assert_eq!(pairs("x=1"), owned(&[("x", "1")]));
    }

    #[test]
    fn test_double_quoted_value() {
        assert_eq!(pairs(r#"title="Hello World""#), owned(&[("title", "Hello World")]));
    }

    #[test]
    fn test_single_quoted_value() {
        assert_eq!(pairs("title='Hello World'"), owned(&[("title", "Hello World")]));
    }

    #[test]
    fn test_empty_quoted_value() {
        assert_eq!(pairs(r#"alt="""#), owned(&[("alt", "")]));
    }

    #[test]
    fn test_positional() {
        assert_eq!(pairs("verbatim"), owned(&[("", "verbatim")]));
    }

    #[test]
    fn test_quoted_positional() {
        assert_eq!(pairs(r#""two words" x=1"#), owned(&[("", "two words"), ("x", "1")]));
    }

    #[test]
    fn test_order_and_duplicates_preserved() {
        assert_eq!(
            pairs("a=1 first b=2 a=3 second"),
            owned(&[("a", "1"), ("", "first"), ("b", "2"), ("a", "3"), ("", "second")])
        );
    }

    #[test]
    fn test_value_may_contain_equals() {
        assert_eq!(pairs("query=a=b"), owned(&[("query", "a=b")]));
    }

    #[test]
    fn test_escaped_quote() {
        assert_eq!(
            pairs(r#"text="say \"hi\"""#),
            owned(&[("text", r#"say "hi""#)])
        );
        assert_eq!(pairs(r"text='it\'s'"), owned(&[("text", "it's")]));
    }

    #[test]
    fn test_escaped_escape() {
        assert_eq!(pairs(r#"path="C:\\dir""#), owned(&[("path", r"C:\dir")]));
    }

    #[test]
    fn test_unknown_escape_is_literal() {
        assert_eq!(pairs(r#"re="\d+""#), owned(&[("re", r"\d+")]));
    }

    #[test]
    fn test_other_quote_inside_quotes() {
        assert_eq!(pairs(r#"q="it's""#), owned(&[("q", "it's")]));
    }

    #[test]
    fn test_unterminated_quote() {
        let err = Arguments::parse(r#"a="open"#).unwrap_err();
        assert!(matches!(err, ScanError::InvalidArgumentSyntax { offset: 2, .. }));
    }

    #[test]
    fn test_dangling_key() {
        let err = Arguments::parse("a= b=2").unwrap_err();
        assert!(matches!(err, ScanError::InvalidArgumentSyntax { offset: 1, .. }));

        let err = Arguments::parse("x=1 key=").unwrap_err();
        assert!(matches!(err, ScanError::InvalidArgumentSyntax { offset: 7, .. }));
        assert!(err.to_string().contains("key"));
    }

    #[test]
    fn test_missing_key() {
        let err = Arguments::parse("=value").unwrap_err();
        assert!(matches!(err, ScanError::InvalidArgumentSyntax { offset: 0, .. }));
    }

    #[test]
    fn test_garbage_after_quote() {
        let err = Arguments::parse(r#"a="x"y"#).unwrap_err();
        assert!(matches!(err, ScanError::InvalidArgumentSyntax { offset: 5, .. }));
    }

    #[test]
    fn test_get_and_get_all() {
        let args = Arguments::parse("tag=a tag=b other=c").unwrap();
        assert_eq!(args.get("tag"), Some("a"));
        assert_eq!(args.get_all("tag").collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(args.get("missing"), None);
    }

    #[test]
    fn test_from_iter_and_pairs() {
        let args: Arguments = [("", "p"), ("k", "v")].into_iter().collect();
        assert_eq!(args.pairs(), vec![("", "p"), ("k", "v")]);
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_to_syntax_parses_back() {
        let args = Arguments::parse(r#"plain "two words" k=v q="say \"hi\"" e="""#).unwrap();
        let syntax = args.to_syntax();
        assert_eq!(syntax, r#"plain "two words" k=v q="say \"hi\"" e="""#);
        assert_eq!(Arguments::parse(&syntax).unwrap(), args);
    }
}
