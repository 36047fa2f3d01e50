//! Shortcode delimiter configuration.
//!
//! Delimiters are literal markers; the scanning algorithm does not depend on
//! their exact text.

/// Literal markers recognized by the scanner.
///
/// With the defaults a document looks like:
///
/// ```text
/// <<name key=value>> inner content <</name>>
/// <<name key=value/>>
/// ```
///
/// # Example
///
/// ```
/// use shortcode_core::Delimiters;
///
/// let delimiters = Delimiters::new("{%", "%}", "/%}", "{%/").unwrap();
/// assert_eq!(delimiters.open(), "{%");
/// assert!(Delimiters::new("", "%}", "/%}", "{%/").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    open: String,
    close: String,
    self_close: String,
    close_open: String,
}

/// Invalid delimiter configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DelimiterError {
    #[error("delimiter `{0}` cannot be empty")]
    Empty(&'static str),
    #[error("delimiter `{0}` cannot contain whitespace")]
    Whitespace(&'static str),
    #[error("delimiters `{0}` and `{1}` must differ")]
    Ambiguous(&'static str, &'static str),
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            open: "<<".to_owned(),
            close: ">>".to_owned(),
            self_close: "/>>".to_owned(),
            close_open: "<</".to_owned(),
        }
    }
}

impl Delimiters {
    /// Create a validated delimiter set.
    ///
    /// * `open` - start of an opening or self-closing tag
    /// * `close` - terminator of an opening or closing tag
    /// * `self_close` - terminator of a self-closing tag
    /// * `close_open` - start of a closing tag
    pub fn new(
        open: impl Into<String>,
        close: impl Into<String>,
        self_close: impl Into<String>,
        close_open: impl Into<String>,
    ) -> Result<Self, DelimiterError> {
        let delimiters = Self {
            open: open.into(),
            close: close.into(),
            self_close: self_close.into(),
            close_open: close_open.into(),
        };
        delimiters.validate()?;
        Ok(delimiters)
    }

    fn validate(&self) -> Result<(), DelimiterError> {
        let fields = [
            ("open", &self.open),
            ("close", &self.close),
            ("self_close", &self.self_close),
            ("close_open", &self.close_open),
        ];
        for (field, value) in fields {
            if value.is_empty() {
                return Err(DelimiterError::Empty(field));
            }
            if value.chars().any(char::is_whitespace) {
                return Err(DelimiterError::Whitespace(field));
            }
        }
        if self.open == self.close_open {
            return Err(DelimiterError::Ambiguous("open", "close_open"));
        }
        if self.close == self.self_close {
            return Err(DelimiterError::Ambiguous("close", "self_close"));
        }
        Ok(())
    }

    #[must_use]
    pub fn open(&self) -> &str {
        &self.open
    }

    #[must_use]
    pub fn close(&self) -> &str {
        &self.close
    }

    #[must_use]
    pub fn self_close(&self) -> &str {
        &self.self_close
    }

    #[must_use]
    pub fn close_open(&self) -> &str {
        &self.close_open
    }
}
