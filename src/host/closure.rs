//! Closures (§3.1 `Function(Host)` / `Function(Interpreted)`) and the
//! native functions a host closure wraps.

use std::cell::RefCell;
use std::rc::Rc;

use super::prototype::PrototypeRef;
use super::upvalue::UpvalueRef;
use super::value::Value;

/// A native function captured by a host closure. Persisted only via the
/// permanents table (§4.7): the core has no way to serialize machine code.
pub struct HostFn {
    pub name: String,
    pub func: Box<dyn Fn(&[Value]) -> Vec<Value>>,
}

pub type HostFnRef = Rc<HostFn>;

impl HostFn {
    pub fn new(name: impl Into<String>, func: impl Fn(&[Value]) -> Vec<Value> + 'static) -> HostFnRef {
        Rc::new(HostFn {
            name: name.into(),
            func: Box::new(func),
        })
    }
}

pub type ClosureRef = Rc<Closure>;

pub enum Closure {
    /// A native function closure. Upvalues are plain values: host-closure
    /// upvalues are never open or shared (§4.7).
    Host { func: HostFnRef, upvalues: Vec<Value> },
    /// An interpreted closure. Each upvalue slot holds a `RefCell` so the
    /// thread codec's upvalue-reopening pass (§4.9, §4.10) can patch which
    /// `Upvalue` a slot points at without needing raw pointers.
    Lua {
        proto: PrototypeRef,
        upvalues: Vec<RefCell<UpvalueRef>>,
    },
}

impl Closure {
    pub fn upvalue_count(&self) -> usize {
        match self {
            Closure::Host { upvalues, .. } => upvalues.len(),
            Closure::Lua { upvalues, .. } => upvalues.len(),
        }
    }
}
