//! # Debug Expressions
//!
//! Resolution and completion of dotted, indexable paths such as
//! `list.elementData[3].name` or `$last.next`.
//!
//! Both operations walk decoded values through the same child cursors the
//! renderer uses, so a path reaches exactly the children a user sees
//! printed (minus the display limits, which resolution lifts).

pub mod complete;
pub mod path;
pub mod resolver;

pub use complete::SymbolTrie;
pub use path::{parse_path, Segment, LAST_RESULT};
pub use resolver::resolve;
