//! Template expansion for docx packages.
//!
//! A [`Template`] binds a [`Package`] (the parts of an extracted `.docx`) and
//! fills its `{{...}}` placeholders from [`docxt_params::Params`]:
//!
//! - scalars are substituted in place, with optional case formatters
//! - rows (table rows, else paragraphs) that reference a list are repeated
//!   once per item, nested lists included
//! - `{{Key sep}}` joins all values of a list in place
//! - triggers such as `:empty:remove:row` remove or clear parts of the
//!   document depending on the value
//! - image parameters are embedded into the package through an
//!   [`ImageResolver`]
//!
//! Problems with single placeholders, images or secondary parts are logged
//! with `tracing` and never abort the document. Placeholders without data
//! stay visible and are listed by [`Template::placeholders`].
//!
//! # Example
//!
//! ```
//! use docxt_params::Params;
//! use docxt_template::{Package, Template};
//!
//! let document = concat!(
//!     "<w:document><w:body><w:tbl><w:tr>",
//!     "<w:tc><w:p><w:r><w:t>{{Friends.Name :empty:remove:row}}</w:t></w:r></w:p></w:tc>",
//!     "<w:tc><w:p><w:r><w:t>{{Friends.Age}}</w:t></w:r></w:p></w:tc>",
//!     "</w:tr></w:tbl></w:body></w:document>",
//! );
//! let params = Params::from_json(
//!     br#"{"Friends": [{"Name": "Bob", "Age": 28}, {"Name": "", "Age": 999}]}"#,
//! )
//! .unwrap();
//!
//! let mut template = Template::open(Package::from_parts([("word/document.xml", document)])).unwrap();
//! template.apply(&params);
//! assert_eq!(template.plaintext(), "Bob\n28");
//! ```

mod download;
mod error;
mod images;
mod package;
mod pipeline;
mod template;

pub use download::{DEFAULT_TIMEOUT, Downloader, HttpDownloader};
pub use error::{DownloadError, ImageError, TemplateError};
pub use images::{ImageResolver, PackageImageResolver, resolve_images};
pub use package::{CONTENT_TYPES, MAIN_DOCUMENT, Package};
pub use template::{DEFAULT_PARTS, Template};
