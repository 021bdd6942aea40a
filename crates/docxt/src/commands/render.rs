//! `docxt render` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use docxt_config::CliSettings;

use super::{open_template, read_params};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Extracted docx package directory.
    package_dir: PathBuf,

    /// JSON file with parameter values.
    #[arg(short, long)]
    params: PathBuf,

    /// Directory the filled package is written to.
    #[arg(short, long)]
    output: PathBuf,

    /// Part name pattern to process, repeatable (overrides config).
    #[arg(long = "part")]
    parts: Vec<String>,

    /// Image download timeout in seconds (overrides config).
    #[arg(long)]
    download_timeout: Option<u64>,

    /// User agent for image downloads (overrides config).
    #[arg(long)]
    user_agent: Option<String>,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if config, package or parameters cannot be loaded,
    /// or the result cannot be written.
    pub(crate) fn execute(self, config_path: Option<&Path>) -> Result<(), CliError> {
        let output = Output::new();

        if self.output == self.package_dir {
            return Err(CliError::Validation(
                "output directory must differ from the package directory".to_owned(),
            ));
        }

        let cli_settings = CliSettings {
            parts: (!self.parts.is_empty()).then_some(self.parts),
            download_timeout: self.download_timeout,
            user_agent: self.user_agent,
        };
        let mut template = open_template(config_path, &cli_settings, &self.package_dir)?;
        let params = read_params(&self.params)?;
        output.info(&format!(
            "Rendering {} with {}",
            self.package_dir.display(),
            self.params.display()
        ));

        let expanded = template.apply(&params);
        let leftovers = template.placeholders();
        template.package().write_dir(&self.output)?;

        output.success(&format!(
            "Rendered {expanded} part(s) into {}",
            self.output.display()
        ));
        if !leftovers.is_empty() {
            output.warning(&format!(
                "{} placeholder(s) left without data: {}",
                leftovers.len(),
                leftovers.join(", ")
            ));
        }
        Ok(())
    }
}
