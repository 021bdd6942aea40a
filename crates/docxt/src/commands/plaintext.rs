//! `docxt plaintext` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use docxt_config::CliSettings;

use super::{open_template, read_params};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the plaintext command.
#[derive(Args)]
pub(crate) struct PlaintextArgs {
    /// Extracted docx package directory.
    package_dir: PathBuf,

    /// JSON file with parameter values applied before printing.
    #[arg(short, long)]
    params: Option<PathBuf>,
}

impl PlaintextArgs {
    /// Execute the plaintext command.
    ///
    /// # Errors
    ///
    /// Returns an error if config, package or parameters cannot be loaded.
    pub(crate) fn execute(self, config_path: Option<&Path>) -> Result<(), CliError> {
        let output = Output::new();
        let mut template = open_template(config_path, &CliSettings::default(), &self.package_dir)?;

        if let Some(path) = &self.params {
            let params = read_params(path)?;
            template.apply(&params);
        }
        let text = template.plaintext();
        if !text.is_empty() {
            output.result(&text)?;
        }
        Ok(())
    }
}
