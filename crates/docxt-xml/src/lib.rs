//! Arena-backed XML tree for WordprocessingML templates.
//!
//! Template expansion clones, deletes and rewrites large parts of a document
//! while walking it. This crate stores the tree as a flat arena of nodes
//! addressed by [`NodeId`] handles, so the walker can mutate the tree without
//! fighting the borrow checker and stale handles stay safe to query.
//!
//! # Example
//!
//! ```
//! use docxt_xml::Document;
//!
//! let mut doc = Document::parse("<w:p><w:r><w:t>Hello</w:t></w:r></w:p>").unwrap();
//! let run = doc.find_first(doc.root(), &["w:r"]).unwrap();
//! doc.clone_and_insert_after(run);
//!
//! assert_eq!(doc.all_text(doc.root()), "HelloHello");
//! ```
//!
//! # Modules
//!
//! - [`merge`]: joins text that word processors split across runs
//! - [`wordml`]: WordprocessingML tag names and helpers

mod document;
mod error;
pub mod merge;
mod node;
mod parser;
mod serializer;
pub mod wordml;

pub use document::{Document, Walk};
pub use error::XmlError;
pub use node::{Attribute, Node, NodeId};
