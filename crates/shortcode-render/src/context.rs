//! Shortcode rendering context.
//!
//! Provides file system access, source location and ambient metadata to
//! shortcode handlers.

use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Ambient key/value metadata handed to every handler.
pub type Metadata = BTreeMap<String, String>;

/// Context provided to shortcode handlers.
///
/// The context is created by the [`Resolver`](crate::Resolver) for each
/// shortcode and provides:
///
/// - Source file information for error messages
/// - Base directory for resolving relative paths
/// - Ambient document metadata
/// - File reading callback for `include` and similar shortcodes
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use shortcode_render::{Metadata, ShortcodeContext};
///
/// let metadata = Metadata::new();
/// let ctx = ShortcodeContext {
///     source_path: Some(Path::new("docs/guide.md")),
///     base_dir: Path::new("docs"),
///     line: 42,
///     depth: 0,
///     metadata: &metadata,
///     read_file: &|path| std::fs::read_to_string(path),
///     on_disk: true,
/// };
///
/// let resolved = ctx.resolve_path("snippets/example.md");
/// assert_eq!(resolved, Path::new("docs/snippets/example.md"));
/// ```
pub struct ShortcodeContext<'a> {
    /// Path to the document being resolved (if known).
    pub source_path: Option<&'a Path>,
    /// Base directory for resolving relative paths.
    pub base_dir: &'a Path,
    /// Line number where the shortcode appears (1-indexed).
    pub line: usize,
    /// How many reprocessing levels deep this shortcode is (0 for the document itself).
    pub depth: usize,
    /// Ambient document metadata.
    pub metadata: &'a Metadata,
    /// Callback to read a file.
    pub read_file: &'a dyn Fn(&Path) -> io::Result<String>,
    /// Whether `read_file` reads the real file system.
    ///
    /// Enables symlink checks in [`resolve_path_safe`](Self::resolve_path_safe).
    pub on_disk: bool,
}

impl ShortcodeContext<'_> {
    /// Resolve a relative path against the base directory.
    #[must_use]
    pub fn resolve_path(&self, relative: &str) -> PathBuf {
        self.base_dir.join(relative)
    }

    /// Resolve a relative path, refusing paths that could leave the base directory.
    ///
    /// Returns `None` for absolute paths and for paths with `..` components.
    /// The check is lexical so it also holds for virtual file systems behind
    /// [`read_file`](Self::read_file). When [`on_disk`](Self::on_disk) is set
    /// and the path exists, it is canonicalized and must stay inside the
    /// canonical base directory, so symlinks cannot point outside it.
    ///
    /// # Example
    ///
    /// ```
    /// use std::path::Path;
    /// use shortcode_render::{Metadata, ShortcodeContext};
    ///
    /// let metadata = Metadata::new();
    /// let ctx = ShortcodeContext {
    ///     source_path: None,
    ///     base_dir: Path::new("/docs"),
    ///     line: 1,
    ///     depth: 0,
    ///     metadata: &metadata,
    ///     read_file: &|_| Ok(String::new()),
    ///     on_disk: false,
    /// };
    ///
    /// assert!(ctx.resolve_path_safe("../../etc/passwd").is_none());
    /// assert_eq!(ctx.resolve_path_safe("./a/b.md"), Some(Path::new("/docs/a/b.md").to_path_buf()));
    /// ```
    #[must_use]
    pub fn resolve_path_safe(&self, relative: &str) -> Option<PathBuf> {
        let mut resolved = self.base_dir.to_path_buf();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }

        if self.on_disk
            && let Ok(canonical) = resolved.canonicalize()
            && let Ok(canonical_base) = self.base_dir.canonicalize()
        {
            return canonical.starts_with(&canonical_base).then_some(canonical);
        }
        Some(resolved)
    }

    /// Read a file using the context's `read_file` callback.
    pub fn read(&self, path: &Path) -> io::Result<String> {
        (self.read_file)(path)
    }

    /// Look up an ambient metadata value.
    #[must_use]
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}
