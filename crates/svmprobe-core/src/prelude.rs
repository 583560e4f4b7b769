//! Common module for library exports

pub use crate::config::{InspectorConfig, Setting, SettingOutcome};
pub use crate::error::{InspectError, InspectResult};
pub use crate::interrupt::InterruptHandle;
pub use crate::session::Session;
pub use crate::target::{MemoryAccess, Target};
pub use crate::types::{
    Address, FieldDescriptor, FrameInfo, FrameKind, ObjectHandle, PrimitiveKind, Scalar, SourceLocation, TypeDescriptor,
    TypeKind, Value, ValueType,
};
pub use crate::unwind::{DecoratedFrame, PendingFrame, UnwindInfo};
pub use crate::visual::{HighLevelRepresentation, VisualNode};
