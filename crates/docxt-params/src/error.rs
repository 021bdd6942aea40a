//! Parameter tree construction errors.

/// Error while building a [`Params`](crate::Params) tree.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ParamsError {
    /// Input is not valid JSON or the value cannot be serialized.
    #[error("invalid parameter data: {0}")]
    Json(#[from] serde_json::Error),

    /// The top-level value is not a key/value object.
    #[error("parameters must be an object, found {0}")]
    NotAnObject(&'static str),
}
