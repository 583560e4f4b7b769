//! # svmprobe-core
//!
//! Heap decoding, debug-expression resolution and deoptimized-frame
//! unwinding for debugging SubstrateVM native images.
//!
//! This crate turns raw memory of a native-image process into readable
//! values. It provides:
//! - Runtime type discovery through object headers ([`hub`])
//! - Typed decoding of strings, arrays, enums and objects ([`visual`])
//! - Cycle-safe rendering of object graphs ([`cycles`])
//! - Resolution and completion of paths like `list.elementData[2].name`
//!   ([`expr`])
//! - Unwinding of frames parked in the deoptimization stub ([`unwind`])
//! - A searchable index of compiled methods ([`functions`])
//!
//! ## Cycle elision is approximate
//!
//! Rendering cuts a branch with ` = {...}` once [`cycles::CycleGuard`]
//! cannot prove it acyclic within `svm-print-depth-limit` hops. At the
//! default bound of 1 the third node of a plain linked list is cut exactly
//! like a node that closes a cycle, so the two look the same in output.
//! Raise the bound to see deeper acyclic chains. Expression resolution is
//! not affected: paths such as `head.next.next.value` always resolve.
//!
//! ## Host integration
//!
//! The core never touches a process itself. A host debugger bridge
//! implements [`Target`] (memory, types, symbols, variables) and drives a
//! [`Session`]:
//!
//! ```rust,ignore
//! let mut session = Session::new(InspectorConfig::from_env());
//! session.attach(&bridge);
//! println!("{}", session.evaluate(&bridge, "list.elementData[0]")?);
//! ```

pub mod config;
pub mod cycles;
pub mod error;
pub mod expr;
pub mod functions;
pub mod hub;
pub mod interrupt;
pub mod prelude;
pub mod session;
pub mod target;
pub mod types;
pub mod unwind;
pub mod visual;

pub use config::InspectorConfig;
// Re-export commonly used types
pub use error::{InspectError, InspectResult};
pub use interrupt::InterruptHandle;
pub use session::Session;
pub use target::{MemoryAccess, Target};
pub use types::{Address, ObjectHandle, Value};
