//! HTML fragment handling: parsing into an arena tree, sanitizing,
//! structural post-processing and serialization.

pub mod enhance;
pub mod sanitize;
pub mod serialize;
pub mod sink;
pub mod tree;

pub use sanitize::{sanitize, SanitizeStats};
pub use serialize::serialize_children;
pub use sink::parse_fragment;
pub use tree::{HtmlTree, NodeId};
