//! Path utilities and path template compilation for RustAx.
//!
//! - [`path`]: validation, normalization, and relativization of URL paths.
//! - [`PathTemplate`]: compiles a template such as `/items/{id:\d+}/parts-{part}`
//!   once, then matches concrete paths against it and extracts the captured
//!   segments in left-to-right order.
//!
//! ```
//! use rustax_template::PathTemplate;
//!
//! let template = PathTemplate::compile(r"/items/{id:\d+}/parts-{part}").unwrap();
//! assert_eq!(
//!     template.matches("/items/42/parts-lid/"),
//!     Some(vec!["42".to_owned(), "lid".to_owned()]),
//! );
//! assert_eq!(template.matches("/items/x/parts-lid"), None);
//! ```

mod error;
pub mod path;
mod template;

pub use error::TemplateError;
pub use template::{PathTemplate, Placeholder, is_valid_template};
