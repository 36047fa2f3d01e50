//! Shortcode resolution with pluggable handlers.
//!
//! This crate turns the locations found by `shortcode-core` into output text.
//!
//! # Architecture
//!
//! - [`ShortcodeHandler`]: renders one named shortcode from its arguments and
//!   already-resolved content
//! - [`Resolver`]: scans a document and calls handlers innermost-first
//! - [`ShortcodeOutput::Reprocess`]: handler output that is scanned again, with
//!   a depth limit against include cycles
//! - [`render_batch`]: resolves many documents on the rayon thread pool
//!
//! Built-in handlers: [`IncludeShortcode`] (`include`) and [`MetaShortcode`] (`meta`).
//!
//! # Example
//!
//! ```
//! use shortcode_render::{Metadata, Resolver, ResolverConfig, ShortcodeOutput};
//!
//! let metadata = Metadata::from([("product".to_owned(), "Acme".to_owned())]);
//! let resolver = Resolver::new(ResolverConfig::new().with_metadata(metadata))
//!     .with_builtins()
//!     .with_fn("b", |_, content, _| Ok(ShortcodeOutput::text(format!("<b>{content}</b>"))));
//!
//! let output = resolver.resolve("Welcome to <<b>><<meta product/>><</b>>").unwrap();
//! assert_eq!(output, "Welcome to <b>Acme</b>");
//! ```

mod batch;
mod builtin;
mod context;
mod error;
mod handler;
mod output;
mod resolver;

pub use batch::{Document, render_batch, scan_batch};
pub use builtin::{IncludeShortcode, MetaShortcode};
pub use context::{Metadata, ShortcodeContext};
pub use error::{HandlerError, RenderError};
pub use handler::ShortcodeHandler;
pub use output::ShortcodeOutput;
pub use resolver::{ReadFileFn, Resolver, ResolverConfig};
