//! `shortcode render` command implementation.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use shortcode_config::{CliSettings, Config};
use shortcode_render::{Resolver, ResolverConfig};

use super::{load_config, location, read_document};
use crate::GlobalArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Document to render.
    file: PathBuf,

    /// Write the result to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Base directory for `include` paths (overrides config).
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Maximum nesting of reprocessed output (overrides config).
    #[arg(long)]
    max_depth: Option<usize>,

    /// Leave shortcodes without a handler in place instead of failing (overrides config).
    #[arg(long)]
    allow_unknown: bool,

    /// Fail on shortcodes without a handler even if the config allows them.
    #[arg(long, conflicts_with = "allow_unknown")]
    no_allow_unknown: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the document cannot be read
    /// or a shortcode cannot be resolved.
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let allow_unknown = self.resolve_allow_unknown();
        let cli_settings = CliSettings {
            base_dir: self.base_dir,
            max_depth: self.max_depth,
            allow_unknown,
        };
        let config = load_config(global, Some(&cli_settings))?;
        let rendered = render_file(&config, &self.file)?;

        match &self.output {
            Some(path) => {
                std::fs::write(path, &rendered)?;
                Output::new().success(&format!("Rendered {}", path.display()));
            }
            None => std::io::stdout().lock().write_all(rendered.as_bytes())?,
        }
        Ok(())
    }

    /// Resolve `allow_unknown` from --allow-unknown/--no-allow-unknown flags.
    fn resolve_allow_unknown(&self) -> Option<bool> {
        self.no_allow_unknown
            .then_some(false)
            .or(self.allow_unknown.then_some(true))
    }
}

/// Build a resolver with the built-in handlers from the loaded configuration.
fn resolver_from_config(config: &Config) -> Result<Resolver, CliError> {
    let render = &config.render_resolved;
    let resolver_config = ResolverConfig::new()
        .with_delimiters(config.delimiters.to_delimiters()?)
        .with_base_dir(&render.base_dir)
        .with_max_depth(render.max_depth)
        .with_allow_unknown(render.allow_unknown)
        .with_metadata(config.metadata.clone());
    Ok(Resolver::new(resolver_config).with_builtins())
}

fn render_file(config: &Config, path: &std::path::Path) -> Result<String, CliError> {
    let resolver = resolver_from_config(config)?;
    let document = read_document(path)?;

    resolver
        .resolve_document(&document)
        .map_err(|source| CliError::Render {
            location: location(path, &document.content, source.offset()),
            source,
        })
}
