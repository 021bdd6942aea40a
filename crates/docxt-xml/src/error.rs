//! Error types for XML tree construction.

/// Error while building a node tree from markup.
///
/// Only input that yields no tree at all is reported as an error. Markup that
/// breaks part way through is logged and the partial tree is kept.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum XmlError {
    /// XML parsing error before any element was read.
    #[error("XML parse error")]
    Parse(#[from] quick_xml::Error),

    /// The input contains no element.
    #[error("document has no root element")]
    NoRootElement,
}
