//! Coroutines (§4.10): a suspended call stack — value stack, call-info
//! frames, and the list of upvalues still open onto this thread's stack.

use std::cell::RefCell;
use std::rc::Rc;

use bitflags::bitflags;

use super::upvalue::UpvalueRef;
use super::value::Value;

pub type ThreadRef = Rc<RefCell<Thread>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThreadStatus {
    Suspended,
    Running,
    Normal,
    Dead,
}

bitflags! {
    /// Per-frame status bits, modeled the way a bitstream format like
    /// LLVM bitcode packs abbreviation/record flags into a single byte
    /// rather than as loose booleans.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct CallStatus: u8 {
        /// This frame is running interpreted (Lua) code, not a host call.
        const INTERPRETED = 0b0000_0001;
        /// A debug hook is active for this frame.
        const HOOKED      = 0b0000_0010;
        /// This is a `pcall`-style protected host call that may resume
        /// after a yield.
        const YIELDABLE_PCALL = 0b0000_0100;
        /// Tail-call frame.
        const TAIL        = 0b0000_1000;
    }
}

/// What's pending at a given call-info frame.
#[derive(Debug)]
pub enum FrameKind {
    Interpreted {
        base: usize,
        saved_pc: usize,
    },
    Host {
        /// Present only for a yielded protected/host call: the context
        /// word plus continuation function, persisted via permanents
        /// (§4.10).
        continuation: Option<(i64, Value)>,
    },
}

#[derive(Debug)]
pub struct CallInfo {
    pub func_index: usize,
    pub top: usize,
    pub nresults: i32,
    pub status: CallStatus,
    pub extra: i64,
    pub kind: FrameKind,
}

pub struct Thread {
    pub status: ThreadStatus,
    pub nresumes: u32,
    pub allow_hook: bool,
    pub stack: Vec<Value>,
    pub call_infos: Vec<CallInfo>,
    /// Open upvalues, kept sorted by stack index (ascending), mirroring the
    /// host's own open-upvalue list invariant.
    pub open_upvalues: Vec<(usize, UpvalueRef)>,
    /// Non-null error-jump buffer, in the source engine's terms: a forbidden
    /// case for persistence (§4.10).
    pub has_error_jump: bool,
    pub error_func: Option<usize>,
    /// Whether this thread yielded from within a debug hook: also forbidden
    /// to persist.
    pub yielded_in_hook: bool,
}

impl Thread {
    pub fn new() -> Self {
        Thread {
            status: ThreadStatus::Suspended,
            nresumes: 0,
            allow_hook: true,
            stack: Vec::new(),
            call_infos: Vec::new(),
            open_upvalues: Vec::new(),
            has_error_jump: false,
            error_func: None,
            yielded_in_hook: false,
        }
    }

    /// Find-or-create the open upvalue at `index` (the host's `nuv`
    /// primitive, §4.10 "Reopening upvalues").
    pub fn find_or_create_upvalue(this: &ThreadRef, index: usize) -> UpvalueRef {
        if let Some((_, uv)) = this
            .borrow()
            .open_upvalues
            .iter()
            .find(|(i, _)| *i == index)
        {
            return uv.clone();
        }
        let uv = super::upvalue::Upvalue::open(this, index);
        let mut t = this.borrow_mut();
        let pos = t.open_upvalues.partition_point(|(i, _)| *i < index);
        t.open_upvalues.insert(pos, (index, uv.clone()));
        uv
    }
}

impl Default for Thread {
    fn default() -> Self {
        Self::new()
    }
}
