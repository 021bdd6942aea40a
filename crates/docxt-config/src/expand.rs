//! `${VAR}` and `${VAR:-default}` expansion of configuration values.

use std::env::{self, VarError};

use crate::ConfigError;

/// Expand the part patterns in place.
///
/// Patterns are trimmed after expansion, so `${DOCXT_PART:-}` can leave an
/// empty pattern that validation then rejects. Errors name the pattern by
/// position (`template.parts[1]`).
pub(crate) fn expand_parts(parts: &mut [String]) -> Result<(), ConfigError> {
    for (index, part) in parts.iter_mut().enumerate() {
        let expanded = expand_field(part, &format!("template.parts[{index}]"))?;
        *part = expanded.trim().to_owned();
    }
    Ok(())
}

/// Expand one string field. Bare `$VAR` is left as is.
pub(crate) fn expand_field(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }
    shellexpand::env_with_context(value, |var| env::var(var).map(Some))
        .map(std::borrow::Cow::into_owned)
        .map_err(|err| ConfigError::EnvVar {
            field: field.to_owned(),
            message: match err.cause {
                VarError::NotPresent => format!("${{{}}} not set", err.var_name),
                VarError::NotUnicode(_) => format!("${{{}}} is not valid unicode", err.var_name),
            },
        })
}
