//! Upvalues (§4.7, §4.9): not first-class values, identified only by
//! runtime (pointer) identity, and possibly shared across closures or
//! "open" onto a live coroutine stack slot.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::closure::ClosureRef;
use super::thread::ThreadRef;
use super::value::Value;

pub type UpvalueRef = Rc<Upvalue>;

pub struct Upvalue(RefCell<UpvalueState>);

pub enum UpvalueState {
    /// Owns its own storage.
    Closed(Value),
    /// Still points into a live coroutine's stack slot.
    Open { thread: Weak<RefCell<super::thread::Thread>>, index: usize },
}

impl Upvalue {
    pub fn closed(value: Value) -> UpvalueRef {
        Rc::new(Upvalue(RefCell::new(UpvalueState::Closed(value))))
    }

    pub fn open(thread: &ThreadRef, index: usize) -> UpvalueRef {
        Rc::new(Upvalue(RefCell::new(UpvalueState::Open {
            thread: Rc::downgrade(thread),
            index,
        })))
    }

    pub fn surrogate(this: &UpvalueRef) -> u64 {
        Rc::as_ptr(this) as usize as u64
    }

    /// Reads the current value, following into the thread's stack if open.
    pub fn get(&self) -> Value {
        match &*self.0.borrow() {
            UpvalueState::Closed(v) => v.clone(),
            UpvalueState::Open { thread, index } => thread
                .upgrade()
                .and_then(|t| t.borrow().stack.get(*index).cloned())
                .unwrap_or(Value::Nil),
        }
    }

    pub fn set_closed(&self, value: Value) {
        *self.0.borrow_mut() = UpvalueState::Closed(value);
    }

    pub fn is_closed(&self) -> bool {
        matches!(&*self.0.borrow(), UpvalueState::Closed(_))
    }
}

/// The three-slot intermediate record described in §4.9 / §9 "Shared
/// mutable upvalues": the first occurrence's *value*, the closed upvalue
/// object created for it once some closure claims it (`reopened`), and the
/// list of every closure slot that should be repointed if the thread codec
/// later rebinds this upvalue onto a reconstructed stack.
pub struct UpvalRecord {
    pub value: Value,
    pub reopened: Option<UpvalueRef>,
    pub back_pointers: Vec<(ClosureRef, usize)>,
}

pub type UpvalRecordRef = Rc<RefCell<UpvalRecord>>;

impl UpvalRecord {
    pub fn fresh(value: Value) -> UpvalRecordRef {
        Rc::new(RefCell::new(UpvalRecord {
            value,
            reopened: None,
            back_pointers: Vec::new(),
        }))
    }
}
