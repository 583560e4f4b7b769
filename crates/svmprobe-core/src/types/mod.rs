//! # Types
//!
//! Target-agnostic data model shared by every component: addresses, raw
//! values, type descriptors and frame facts.
//!
//! Nothing here reads memory. Reading is the job of [`crate::target`].

pub mod address;
pub mod descriptor;
pub mod stack;
pub mod symbols;
pub mod value;

// Re-export all public types
pub use address::Address;
pub use descriptor::{FieldDescriptor, FieldStorage, TypeDescriptor, TypeKind};
pub use stack::{FrameClass, FrameId, FrameInfo, FrameKind};
pub use symbols::SourceLocation;
pub use value::{InlineArray, ObjectHandle, PrimitiveKind, Scalar, Value, ValueType};
