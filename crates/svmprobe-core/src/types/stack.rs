//! Stack frame types.

use std::fmt;

use super::symbols::SourceLocation;
use super::Address;

/// Identifier of an unwound frame: its stack pointer and program counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId
{
    /// Stack pointer of the frame
    pub sp: Address,
    /// Program counter of the frame
    pub pc: Address,
}

impl FrameId
{
    /// Build an identifier from the frame's key addresses.
    pub const fn new(sp: Address, pc: Address) -> Self
    {
        Self { sp, pc }
    }
}

impl fmt::Display for FrameId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{{sp={}, pc={}}}", self.sp, self.pc)
    }
}

/// Differentiates physical vs. inline frames as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameKind
{
    /// Actual stack frame that consumed stack memory.
    #[default]
    Physical,
    /// Inline instance sharing storage with its physical frame.
    Inlined,
}

/// Per-frame classification used by the unwinder and the decorator.
///
/// Stateless: a frame is deoptimized exactly when its program counter is the
/// deoptimization stub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameClass
{
    /// Regular frame, unwound with debug information.
    Normal,
    /// Frame parked in the deoptimization stub.
    Deoptimized,
}

/// Frame facts the host hands to the decorator.
#[derive(Debug, Clone, Default)]
pub struct FrameInfo
{
    /// Program counter
    pub pc: Address,
    /// Stack pointer
    pub sp: Address,
    /// Function name as the host prints it (may carry a parameter list)
    pub function: Option<String>,
    /// Physical or inline
    pub kind: FrameKind,
    /// Source position, when line info resolves
    pub location: Option<SourceLocation>,
}
