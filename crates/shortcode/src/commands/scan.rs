//! `shortcode scan` command implementation.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use shortcode_core::{Shortcode, scan_with};

use super::{load_config, location, read_document};
use crate::GlobalArgs;
use crate::error::CliError;

/// Arguments for the scan command.
#[derive(Args)]
pub(crate) struct ScanArgs {
    /// Document to scan.
    file: PathBuf,

    /// Print the shortcode tree as JSON.
    #[arg(long)]
    json: bool,
}

impl ScanArgs {
    /// Execute the scan command.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read or scanned.
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let config = load_config(global, None)?;
        let delimiters = config.delimiters.to_delimiters()?;
        let document = read_document(&self.file)?;

        let locations =
            scan_with(&document.content, &delimiters).map_err(|source| CliError::Scan {
                location: location(&self.file, &document.content, source.offset()),
                source,
            })?;
        tracing::info!(
            path = %self.file.display(),
            shortcodes = locations.total(),
            "Scanned document"
        );

        let mut stdout = std::io::stdout().lock();
        if self.json {
            serde_json::to_writer_pretty(&mut stdout, &locations)?;
            writeln!(stdout)?;
        } else {
            write_tree(&mut stdout, locations.shortcodes(), 0)?;
        }
        Ok(())
    }
}

/// Write one line per shortcode, children indented under their parent.
fn write_tree(out: &mut impl Write, shortcodes: &[Shortcode], depth: usize) -> std::io::Result<()> {
    for shortcode in shortcodes {
        let span = shortcode.span();
        write!(
            out,
            "{:indent$}{} [{}..{}]",
            "",
            shortcode.name(),
            span.start,
            span.end,
            indent = depth * 2
        )?;
        if !shortcode.arguments().is_empty() {
            write!(out, " {}", shortcode.arguments().to_syntax())?;
        }
        if shortcode.is_self_closing() {
            write!(out, " (self-closing)")?;
        }
        writeln!(out)?;
        write_tree(out, shortcode.children(), depth + 1)?;
    }
    Ok(())
}
