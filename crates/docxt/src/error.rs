//! CLI error types.

use docxt_config::ConfigError;
use docxt_params::ParamsError;
use docxt_template::TemplateError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Template(#[from] TemplateError),

    #[error("{0}")]
    Params(#[from] ParamsError),

    #[error("{0}")]
    Validation(String),
}
