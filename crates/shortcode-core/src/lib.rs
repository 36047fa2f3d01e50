//! Shortcode scanning and nesting resolution.
//!
//! This crate finds shortcode tags embedded in arbitrary text, parses their
//! arguments and builds an ordered forest of nested shortcode locations that
//! an external resolver can substitute innermost-first.
//!
//! # Architecture
//!
//! Scanning is a single pass over one immutable buffer:
//!
//! - [`Scanner`]: yields [`TagEvent`]s for opening, self-closing and closing tags
//! - [`Arguments`]: parses the attribute text of opening and self-closing tags
//! - [`Tracker`]: keeps the stack of open shortcodes and matches closing tags
//!   by name in LIFO order
//! - [`Locations`]: the published, read-only result
//!
//! No state is shared between documents, so independent documents can be
//! scanned on separate threads.
//!
//! # Example
//!
//! ```
//! use shortcode_core::scan;
//!
//! let text = r#"Hello <<card title="Intro">>body <<icon name=star/>><</card>>!"#;
//! let locations = scan(text).unwrap();
//!
//! let card = &locations.shortcodes()[0];
//! assert_eq!(card.name(), "card");
//! assert_eq!(card.arguments().get("title"), Some("Intro"));
//! assert_eq!(card.content(), "body <<icon name=star/>>");
//! assert_eq!(card.children()[0].name(), "icon");
//! ```

mod args;
mod delimiters;
mod error;
mod location;
mod scanner;
mod span;
mod tracker;

pub use args::{Argument, Arguments};
pub use delimiters::{DelimiterError, Delimiters};
pub use error::ScanError;
pub use location::{DepthFirst, InnermostFirst, Locations, Segment, Segments, Shortcode};
pub use scanner::{Scanner, TagEvent};
pub use span::{LineIndex, Span};
pub use tracker::{MAX_NESTING, OpenShortcode, Tracker, scan, scan_with};
