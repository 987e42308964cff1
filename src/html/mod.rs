//! Template pages.
//!
//! - **`tree`**: arena holding the parsed tag tree
//! - **`parse`**: html5ever front end filling the arena
//! - **`document`**: O(1) lookups by role, id, name and form action
//! - **`render`**: per-request substitution and serialization
//! - **`page`**: a tree bundled with its index

pub mod document;
pub mod page;
pub mod parse;
pub mod render;
pub mod tree;

pub use document::{Document, LookupError};
pub use page::Page;
pub use render::{Render, Rendering, TagCallback};
pub use tree::{Element, NodeId, NodeKind, TagTree};
