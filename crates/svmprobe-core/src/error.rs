//! # Error Types
//!
//! General error handling for the inspector.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.

use thiserror::Error;

use crate::types::Address;

/// Main error type for inspection operations
///
/// Most of these never reach the host: the decoder recovers from
/// `MemoryFault` and `TypeMismatch` at the innermost step and degrades to a
/// fallback rendering. Only `Unresolved`, `Interrupted` and the settings /
/// registry errors surface from [`crate::Session`] operations.
///
/// ## Error Categories
///
/// 1. **Target errors**: MemoryFault, TypeMismatch
/// 2. **Expression errors**: Unresolved
/// 3. **Control errors**: Interrupted
/// 4. **Configuration errors**: InvalidSetting, UnknownSetting, DuplicateRepresentation
///
/// Truncation by a display limit is not an error. It shows up as
/// [`crate::visual::ChildValue::Elided`] in the decoded tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InspectError
{
    /// The target refused a read (unmapped page, stale pointer, process gone)
    #[error("Cannot access memory at {address} ({length} bytes)")]
    MemoryFault
    {
        /// First byte of the failed read
        address: Address,
        /// Number of bytes requested
        length: usize,
    },

    /// A type or field lookup failed, or memory did not have the expected shape
    ///
    /// Examples:
    /// - The type catalog has no entry for a name
    /// - A field is missing from a descriptor
    /// - A string's backing array is not valid UTF-16
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// A debug-expression path could not be bound in the current context
    #[error("No debug-expression \"{0}\" in current context.")]
    Unresolved(String),

    /// The user cancelled the running top-level operation
    #[error("Interrupted")]
    Interrupted,

    /// A setting received an argument it cannot parse
    #[error("Invalid value `{value}` for setting {name}")]
    InvalidSetting
    {
        /// Setting (command) name
        name: String,
        /// Rejected argument
        value: String,
    },

    /// No setting with that name exists
    #[error("Unknown setting: {0}")]
    UnknownSetting(String),

    /// A high-level representation is already registered for this type name
    #[error("High-level representation already registered for {0}")]
    DuplicateRepresentation(String),
}

impl InspectError
{
    /// Shorthand used by the decoder for layout failures.
    pub(crate) fn mismatch(message: impl Into<String>) -> Self
    {
        InspectError::TypeMismatch(message.into())
    }

    /// `true` for errors that must abort the whole top-level operation.
    #[must_use]
    pub fn is_interrupt(&self) -> bool
    {
        matches!(self, InspectError::Interrupted)
    }
}

/// Convenience type alias for `Result<T, InspectError>`
///
/// ```rust
/// use svmprobe_core::error::InspectResult;
/// fn foo() -> InspectResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type InspectResult<T> = std::result::Result<T, InspectError>;
