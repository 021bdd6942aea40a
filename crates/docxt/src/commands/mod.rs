//! CLI command implementations.

pub(crate) mod placeholders;
pub(crate) mod plaintext;
pub(crate) mod render;

pub(crate) use placeholders::PlaceholdersArgs;
pub(crate) use plaintext::PlaintextArgs;
pub(crate) use render::RenderArgs;

use std::path::Path;

use docxt_config::{CliSettings, Config};
use docxt_params::Params;
use docxt_template::{HttpDownloader, Package, Template};

use crate::error::CliError;

/// Load config, the package in `package_dir` and bind them into a template.
pub(crate) fn open_template(
    config_path: Option<&Path>,
    cli_settings: &CliSettings,
    package_dir: &Path,
) -> Result<Template, CliError> {
    if !package_dir.is_dir() {
        return Err(CliError::Validation(format!(
            "package directory not found: {}",
            package_dir.display()
        )));
    }
    let config = Config::load(config_path, Some(cli_settings))?;

    let mut downloader = HttpDownloader::new(config.images.timeout());
    if let Some(user_agent) = &config.images.user_agent {
        downloader = downloader.user_agent(user_agent.as_str());
    }

    let package = Package::from_dir(package_dir)?;
    let template = Template::open(package)?
        .with_parts(config.template.parts)
        .with_downloader(downloader);
    Ok(template)
}

/// Read parameters from a JSON file.
pub(crate) fn read_params(path: &Path) -> Result<Params, CliError> {
    let bytes = std::fs::read(path)?;
    Ok(Params::from_json(&bytes)?)
}
