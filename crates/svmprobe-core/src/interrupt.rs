//! User interrupt flag.
//!
//! The host's signal handler (or UI thread) holds a clone of the handle and
//! raises it; the decoder polls it between steps and aborts the running
//! top-level operation with [`InspectError::Interrupted`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{InspectError, InspectResult};

/// Shared, cloneable interrupt flag.
#[derive(Debug, Clone, Default)]
pub struct InterruptHandle(Arc<AtomicBool>);

impl InterruptHandle
{
    /// New, lowered flag.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Request that the running operation stop.
    pub fn interrupt(&self)
    {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Lower the flag.
    pub fn clear(&self)
    {
        self.0.store(false, Ordering::SeqCst);
    }

    /// `true` while an interrupt is pending.
    #[must_use]
    pub fn is_raised(&self) -> bool
    {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Interrupted)` when the flag is raised.
    pub(crate) fn check(&self) -> InspectResult<()>
    {
        if self.is_raised() {
            Err(InspectError::Interrupted)
        } else {
            Ok(())
        }
    }
}
