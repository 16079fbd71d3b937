//! Heavy-duty object-graph persistence for a dynamically typed,
//! stack-based scripting runtime (SPEC_FULL.md §1-§2).
//!
//! `dump`/`persist` write a root [`Value`] and everything reachable from
//! it to a byte stream; `undump`/`unpersist` read it back, reconstructing
//! shared structure, cycles, and closure/upvalue sharing exactly (§4, §8).
//! Non-portable host objects (native functions, VM singletons) cross the
//! boundary through the caller-supplied permanents table (§4.3) rather
//! than being serialized.
//!
//! ```
//! use persist_core::{persist, unpersist, Config, ReadPerms, Value, WritePerms};
//!
//! let cfg = Config::default();
//! let bytes = persist(&WritePerms::new(), &cfg, &Value::str("hello")).unwrap();
//! let back = unpersist(&ReadPerms::new(), &cfg, &bytes).unwrap();
//! assert!(matches!(back, Value::Str(s) if &*s == b"hello"));
//! ```

mod api;
mod codec;
mod config;
mod error;
mod header;
pub mod host;
mod kind;
mod path;
mod perms;
mod primitive;
mod reftbl;

pub use api::{dump, persist, undump, unpersist};
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use path::{Path, PathSegment};
pub use perms::{PermKey, ReadPerms, WritePerms};

pub use host::{
    structural_eq, CallInfo, CallStatus, Closure, ClosureRef, CollectorGuard, DebugInfo,
    FrameKind, HostFn, HostFnRef, LocalVar, Prototype, PrototypeRef, RefKey, Table, TableRef,
    Thread, ThreadRef, ThreadStatus, UpvalDesc, UpvalRecord, UpvalRecordRef, Upvalue, UpvalueRef,
    UpvalueState, UserData, UserDataRef, Value,
};
