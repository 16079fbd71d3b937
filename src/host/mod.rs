//! Minimal host VM facade (SPEC_FULL.md §6.4-A).
//!
//! No external interpreter is linked into this crate; this module stands in
//! for the "fixed, opaque API" §6.4 says the core consumes — just
//! expressively enough to exercise every codec rule in §4 and every
//! testable property in §8. It carries no wire format of its own and is
//! never itself persisted or versioned.

pub mod closure;
pub mod collector;
pub mod prototype;
pub mod table;
pub mod thread;
pub mod userdata;
pub mod upvalue;
pub mod value;

pub use closure::{Closure, ClosureRef, HostFn, HostFnRef};
pub use collector::CollectorGuard;
pub use prototype::{DebugInfo, LocalVar, Prototype, PrototypeRef, UpvalDesc};
pub use table::{Table, TableRef};
pub use thread::{CallInfo, CallStatus, FrameKind, Thread, ThreadRef, ThreadStatus};
pub use userdata::{UserData, UserDataRef};
pub use upvalue::{UpvalRecord, UpvalRecordRef, Upvalue, UpvalueRef, UpvalueState};
pub use value::{structural_eq, RefKey, Value};
