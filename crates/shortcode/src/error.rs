//! CLI error types.

use std::path::PathBuf;

use shortcode_config::ConfigError;
use shortcode_core::ScanError;
use shortcode_render::RenderError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{location}: {source}")]
    Scan {
        location: String,
        source: ScanError,
    },

    #[error("{location}: {source}")]
    Render {
        location: String,
        source: RenderError,
    },

    #[error("{failed} of {total} files failed the check")]
    CheckFailed { failed: usize, total: usize },
}
