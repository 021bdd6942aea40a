//! Parameters and placeholder grammar for docx templates.
//!
//! Two halves meet during template expansion:
//!
//! - [`Params`]: the hierarchical values supplied by the caller, addressed by
//!   absolute (`Users.1.Name`) and compact (`Users.Name`) key paths
//! - [`Placeholder`]: the parsed form of a `{{...}}` marker found in document
//!   text, with its optional separator, [`Formatter`] and [`Trigger`]
//!
//! # Example
//!
//! ```
//! use docxt_params::{Params, Placeholder};
//!
//! let params = Params::from_json(br#"{"Users": [{"Name": "Ann"}, {"Name": "Dan"}]}"#).unwrap();
//! let placeholder = Placeholder::parse("Hi {{Users.Name :upper}}").unwrap();
//!
//! let names: Vec<String> = params
//!     .resolve(placeholder.key())
//!     .iter()
//!     .map(|param| placeholder.format(param.value()))
//!     .collect();
//! assert_eq!(names, ["ANN", "DAN"]);
//! ```

mod error;
mod formatter;
mod image;
pub mod key;
mod param;
mod params;
pub mod placeholder;
pub mod trigger;

pub use error::ParamsError;
pub use formatter::Formatter;
pub use image::{IMAGE_TAG, Image};
pub use param::{Param, ParamKind};
pub use params::{Indexed, Params, PendingList};
pub use placeholder::Placeholder;
pub use trigger::{Trigger, TriggerCommand, TriggerOn, TriggerScope};
