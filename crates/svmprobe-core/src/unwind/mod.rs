//! # Frame Unwinding
//!
//! Unwinding support for frames parked in the deoptimization stub.
//!
//! When optimized code is invalidated, the runtime parks the affected frame
//! in `Deoptimizer.deoptStub`. Such a frame has no usable CFI: its size is
//! only known at run time and stored in the `DeoptimizedFrame` object whose
//! address sits in the frame's first stack slot. [`DeoptUnwinder`] computes
//! the caller's registers from that object; every other frame is left to
//! the host's regular DWARF unwinder.
//!
//! ## Layout of a deoptimized frame (x86-64)
//!
//! ```text
//!            +--------------------------+
//! sp + F - 8 | return address (caller)  |
//!            |          ...             |
//! sp         | DeoptimizedFrame *       |
//!            +--------------------------+
//! F = DeoptimizedFrame.sourceTotalFrameSize
//! ```

use gimli::Register;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::error::{InspectError, InspectResult};
use crate::target::Target;
use crate::types::{Address, FrameClass, FrameId, ObjectHandle};

pub mod decorate;

pub use decorate::{DecoratedFrame, FrameDecorator, DEOPT_FRAME_LABEL, INLINE_PREFIX};

/// Symbol of the deoptimization stub.
pub const DEOPT_STUB_SYMBOL: &str = "com.oracle.svm.core.deopt.Deoptimizer.deoptStub";
/// Type of the object describing a deoptimized frame.
pub const DEOPT_FRAME_TYPE: &str = "com.oracle.svm.core.deopt.DeoptimizedFrame";
/// Field of [`DEOPT_FRAME_TYPE`] holding the frame size in bytes.
pub const FRAME_SIZE_FIELD: &str = "sourceTotalFrameSize";

/// DWARF number of the stack pointer.
pub const SP_REGISTER: Register = gimli::X86_64::RSP;
/// DWARF number of the program counter.
pub const PC_REGISTER: Register = gimli::X86_64::RA;

/// Register access for a frame the host is about to unwind.
pub trait PendingFrame
{
    /// Value of `register` in this frame.
    ///
    /// ## Errors
    ///
    /// Any error makes the unwinder decline the frame.
    fn read_register(&self, register: Register) -> InspectResult<u64>;
}

/// Identity of an unwound frame plus the caller's register values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnwindInfo
{
    /// The frame being unwound
    pub frame_id: FrameId,
    /// Caller register values, keyed by DWARF register number
    pub saved_registers: SmallVec<[(Register, u64); 2]>,
}

impl UnwindInfo
{
    fn new(frame_id: FrameId) -> Self
    {
        Self {
            frame_id,
            saved_registers: SmallVec::new(),
        }
    }

    fn add_saved_register(&mut self, register: Register, value: u64)
    {
        self.saved_registers.push((register, value));
    }

    /// Saved value of `register`, if reported.
    pub fn register(&self, register: Register) -> Option<u64>
    {
        self.saved_registers
            .iter()
            .find(|(saved, _)| *saved == register)
            .map(|(_, value)| *value)
    }

    /// Caller's stack pointer.
    pub fn caller_sp(&self) -> Option<Address>
    {
        self.register(SP_REGISTER).map(Address::from)
    }

    /// Caller's program counter.
    pub fn caller_pc(&self) -> Option<Address>
    {
        self.register(PC_REGISTER).map(Address::from)
    }
}

/// Unwinder for frames stopped in the deoptimization stub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeoptUnwinder
{
    stub: Address,
}

impl DeoptUnwinder
{
    /// Unwinder for a stub at a known address.
    pub const fn new(stub: Address) -> Self
    {
        Self { stub }
    }

    /// Find the stub in `target`. `None` when the symbol is absent, in which
    /// case no frame is ever treated as deoptimized.
    pub fn locate(target: &dyn Target) -> Option<Self>
    {
        let stub = target.resolve_symbol_address(DEOPT_STUB_SYMBOL)?;
        debug!(%stub, "located deoptimization stub");
        Some(Self::new(stub))
    }

    /// Stub address.
    pub const fn stub(&self) -> Address
    {
        self.stub
    }

    /// Classify a frame by its program counter.
    pub fn classify(&self, pc: Address) -> FrameClass
    {
        if pc == self.stub {
            FrameClass::Deoptimized
        } else {
            FrameClass::Normal
        }
    }

    /// Caller registers of `frame` when it is a deoptimized frame.
    ///
    /// `None` for every other frame and for any failed read, so the host
    /// falls back to its own unwinder.
    pub fn unwind(&self, target: &dyn Target, frame: &dyn PendingFrame) -> Option<UnwindInfo>
    {
        match self.try_unwind(target, frame) {
            Ok(info) => info,
            Err(err) => {
                trace!(error = %err, "deoptimized frame unwinding failed");
                None
            }
        }
    }

    fn try_unwind(&self, target: &dyn Target, frame: &dyn PendingFrame) -> InspectResult<Option<UnwindInfo>>
    {
        let sp = Address::from(frame.read_register(SP_REGISTER)?);
        let pc = Address::from(frame.read_register(PC_REGISTER)?);
        if self.classify(pc) != FrameClass::Deoptimized {
            return Ok(None);
        }

        let deopt_frame = ObjectHandle::new(Address::from(target.read_u64(sp)?), DEOPT_FRAME_TYPE);
        let size = target
            .read_field(&deopt_frame, FRAME_SIZE_FIELD)?
            .as_scalar()
            .and_then(|scalar| scalar.as_i64())
            .and_then(|size| u64::try_from(size).ok())
            .ok_or_else(|| InspectError::mismatch(format!("{FRAME_SIZE_FIELD} is not a frame size")))?;

        let caller_sp = sp
            .checked_add(size)
            .ok_or_else(|| InspectError::mismatch(format!("frame size {size} overflows {sp}")))?;
        let caller_pc = target.read_u64(caller_sp - 8)?;

        let mut info = UnwindInfo::new(FrameId::new(sp, pc));
        info.add_saved_register(SP_REGISTER, caller_sp.value());
        info.add_saved_register(PC_REGISTER, caller_pc);
        debug!(frame = %info.frame_id, %caller_sp, caller_pc = %Address::from(caller_pc), "unwound deoptimized frame");
        Ok(Some(info))
    }
}
