//! `docxt placeholders` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use docxt_config::CliSettings;

use super::open_template;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the placeholders command.
#[derive(Args)]
pub(crate) struct PlaceholdersArgs {
    /// Extracted docx package directory.
    package_dir: PathBuf,

    /// Print each distinct placeholder once.
    #[arg(short, long)]
    unique: bool,
}

impl PlaceholdersArgs {
    /// Execute the placeholders command.
    ///
    /// # Errors
    ///
    /// Returns an error if config or package cannot be loaded.
    pub(crate) fn execute(self, config_path: Option<&Path>) -> Result<(), CliError> {
        let output = Output::new();
        let template = open_template(config_path, &CliSettings::default(), &self.package_dir)?;

        let mut placeholders = template.placeholders();
        if self.unique {
            let mut seen = std::collections::HashSet::new();
            placeholders.retain(|placeholder| seen.insert(placeholder.clone()));
        }
        for placeholder in &placeholders {
            output.result(placeholder)?;
        }
        Ok(())
    }
}
