pub mod document;
pub mod error;
pub mod namespace;
pub mod path;
pub mod types;

pub use document::{Attribute, Document, Element, Node};
pub use error::{XformError, AMBIGUOUS_CHOICE, MALFORMED_PATH, UNKNOWN_PREFIX};
pub use namespace::{qualify, NamespaceBinding, NamespaceTable, XML_NAMESPACE_URI};
pub use path::{is_valid_qualified_name, MatchPattern, Path, Step};
pub use types::*;
