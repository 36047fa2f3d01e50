//! `shortcode check` command implementation.

use std::path::PathBuf;

use clap::Args;
use shortcode_core::Delimiters;
use shortcode_render::{Document, scan_batch};

use super::{load_config, location, read_document};
use crate::GlobalArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    /// Documents to check.
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

impl CheckArgs {
    /// Execute the check command.
    ///
    /// Every file is checked even when an earlier one fails.
    ///
    /// # Errors
    ///
    /// Returns `CliError::CheckFailed` if any file cannot be read or scanned.
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let config = load_config(global, None)?;
        let delimiters = config.delimiters.to_delimiters()?;

        let diagnostics = check_files(&self.files, &delimiters);
        for diagnostic in &diagnostics {
            output.error(diagnostic);
        }

        let total = self.files.len();
        if diagnostics.is_empty() {
            output.success(&format!("{total} files OK"));
            Ok(())
        } else {
            Err(CliError::CheckFailed {
                failed: diagnostics.len(),
                total,
            })
        }
    }
}

/// One `path:line:column: message` diagnostic per failing file, in input order.
fn check_files(files: &[PathBuf], delimiters: &Delimiters) -> Vec<String> {
    let mut read_errors = Vec::with_capacity(files.len());
    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        match read_document(path) {
            Ok(document) => {
                read_errors.push(None);
                documents.push(document);
            }
            Err(err) => {
                read_errors.push(Some(err.to_string()));
                documents.push(Document::default());
            }
        }
    }

    let results = scan_batch(delimiters, &documents);
    let mut diagnostics = Vec::new();
    for (((path, document), read_error), result) in
        files.iter().zip(&documents).zip(read_errors).zip(results)
    {
        if let Some(read_error) = read_error {
            diagnostics.push(read_error);
            continue;
        }
        match result {
            Ok(locations) => {
                tracing::info!(path = %path.display(), shortcodes = locations.total(), "Checked");
            }
            Err(err) => diagnostics.push(format!(
                "{}: {err}",
                location(path, &document.content, err.offset())
            )),
        }
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_check_files() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.md");
        let bad = dir.path().join("bad.md");
        let missing = dir.path().join("missing.md");
        std::fs::write(&good, "<<a>>x<</a>>").unwrap();
        std::fs::write(&bad, "line one\n  <<a>><</b>>").unwrap();

        let diagnostics = check_files(
            &[good, bad.clone(), missing.clone()],
            &Delimiters::default(),
        );

        assert_eq!(diagnostics.len(), 2);
        assert!(
            diagnostics[0].starts_with(&format!("{}:2:8: ", bad.display())),
            "unexpected diagnostic: {}",
            diagnostics[0]
        );
        assert!(diagnostics[1].starts_with(&format!("Failed to read {}", missing.display())));
    }

    #[test]
    fn test_check_files_all_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.md");
        std::fs::write(&path, "plain text <<x/>>").unwrap();
        assert!(check_files(&[path], &Delimiters::default()).is_empty());
    }
}
