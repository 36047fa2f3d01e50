//! CLI command implementations.

pub(crate) mod check;
pub(crate) mod render;
pub(crate) mod scan;

pub(crate) use check::CheckArgs;
pub(crate) use render::RenderArgs;
pub(crate) use scan::ScanArgs;

use std::path::Path;

use shortcode_config::{CliSettings, Config};
use shortcode_core::LineIndex;
use shortcode_render::Document;

use crate::GlobalArgs;
use crate::error::CliError;

/// Load the configuration named by `--config`, or the discovered one.
fn load_config(global: &GlobalArgs, settings: Option<&CliSettings>) -> Result<Config, CliError> {
    let config = Config::load(global.config.as_deref(), settings)?;
    match &config.config_path {
        Some(path) => tracing::info!(path = %path.display(), "Loaded configuration"),
        None => tracing::info!("No configuration file found, using defaults"),
    }
    Ok(config)
}

fn read_document(path: &Path) -> Result<Document, CliError> {
    Document::read(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// `path:line:column` of a byte offset in `text`.
fn location(path: &Path, text: &str, offset: usize) -> String {
    let (line, column) = LineIndex::new(text).line_col(offset);
    format!("{}:{line}:{column}", path.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location() {
        let text = "first\nsecond <<x>>";
        assert_eq!(location(Path::new("doc.md"), text, 13), "doc.md:2:8");
        assert_eq!(location(Path::new("doc.md"), text, 0), "doc.md:1:1");
    }
}
