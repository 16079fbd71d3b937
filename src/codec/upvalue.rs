//! Upvalue codec (§4.7, §4.8, §4.9). Upvalues are not first-class values,
//! so they're keyed by surrogate pointer identity like a prototype, and
//! the reader doesn't hand back a bare `UpvalueRef` but the three-slot
//! `UpvalRecord` that `function`/`thread` use to reconcile sharing across
//! closures and across a reopened coroutine stack.

use std::io::{Read, Write};

use crate::error::{Error, Result};
use crate::host::{Closure, ClosureRef, RefKey, ThreadRef, Upvalue, UpvalRecord, UpvalRecordRef, UpvalueRef, Value};
use crate::kind::{Kind, PERMANENT, REF_OFFSET};
use crate::primitive::read_i32;
use crate::reftbl::Slot;

use super::context::{Reader, Writer};
use super::dispatcher::{persist_value, unpersist_value};
use super::keyed::persist_keyed;

pub fn write_upvalue<W: Write>(w: &mut Writer<'_, W>, uv: &UpvalueRef) -> Result<()> {
    let key = RefKey::Upvalue(Upvalue::surrogate(uv) as usize);
    let value = uv.get();
    persist_keyed(w, key, Kind::Upvalue, |w| persist_value(w, &value))
}

/// Reads one upvalue slot and returns the shared [`UpvalRecord`] for it,
/// allocating a fresh one the first time this surrogate id is seen.
pub fn read_upvalue_record<R: Read>(r: &mut Reader<'_, R>) -> Result<UpvalRecordRef> {
    let framing = read_i32(r.src)?;

    if framing >= REF_OFFSET {
        let id = (framing - REF_OFFSET) as u32;
        return r.refs.get_upval_record(id);
    }
    if framing == PERMANENT {
        return Err(Error::unsupported(
            "permanent substitution is not supported for upvalues",
        ));
    }
    let kind = Kind::try_from(framing)?;
    if kind != Kind::Upvalue {
        return Err(Error::stream_corruption(format!(
            "expected upvalue kind tag, got {kind:?}"
        )));
    }

    let record = UpvalRecord::fresh(Value::Nil);
    let id = r.refs.register(Slot::UpvalRecord(record.clone()));
    let value = unpersist_value(r)?;
    record.borrow_mut().value = value;
    r.refs.rewrite(id, Slot::UpvalRecord(record.clone()));
    Ok(record)
}

/// Returns the closed [`UpvalueRef`] for a record, creating and caching it
/// the first time a closure claims this shared upvalue, and appending
/// `back_pointer` to the set that `thread::read_thread_body` walks if the
/// owning coroutine's stack later reopens it (§4.9, §4.10).
pub fn claim_upvalue(record: &UpvalRecordRef, back_pointer: (ClosureRef, usize)) -> UpvalueRef {
    let mut rec = record.borrow_mut();
    let current_value = rec.value.clone();
    let uv = rec
        .reopened
        .get_or_insert_with(|| Upvalue::closed(current_value.clone()))
        .clone();
    // Reconcile even on the already-shared path: an earlier claim may have
    // run through a cycle and installed this upvalue while `rec.value` was
    // still a placeholder nil, before the real value was decoded. Skip the
    // reconciliation once the upvalue has been reopened onto a coroutine's
    // live stack slot (`reopen_on_thread` already overwrote `reopened` with
    // the authoritative value for that slot).
    if uv.is_closed() {
        uv.set_closed(current_value);
    }
    rec.back_pointers.push(back_pointer);
    uv
}

/// Patches a record's closed upvalue into one open onto a reconstructed
/// coroutine's stack slot (§4.10 "Reopening upvalues"), repointing every
/// closure already claiming it so observable sharing survives regardless
/// of whether the thread or its closures were decoded first.
pub fn reopen_on_thread(record: &UpvalRecordRef, thread: &ThreadRef, index: usize) -> UpvalueRef {
    let open_uv = Upvalue::open(thread, index);
    let stale_back_pointers = {
        let mut rec = record.borrow_mut();
        let stale = std::mem::take(&mut rec.back_pointers);
        rec.reopened = Some(open_uv.clone());
        stale
    };
    for (closure, slot) in &stale_back_pointers {
        if let Closure::Lua { upvalues, .. } = closure.as_ref() {
            *upvalues[*slot].borrow_mut() = open_uv.clone();
        }
    }
    record.borrow_mut().back_pointers = stale_back_pointers;
    open_uv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::perms::{ReadPerms, WritePerms};
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::rc::Rc;

    #[test]
    fn shared_upvalue_decodes_to_one_record() {
        let uv = Upvalue::closed(Value::Number(5.0));
        let perms_w = WritePerms::new();
        let cfg = Config::default();
        let mut buf = Vec::new();
        {
            let mut w = Writer::new(&mut buf, &perms_w, &cfg);
            write_upvalue(&mut w, &uv).unwrap();
            write_upvalue(&mut w, &uv).unwrap();
        }

        let perms_r = ReadPerms::new();
        let mut cur = Cursor::new(buf);
        let mut r = Reader::new(&mut cur, &perms_r, &cfg);
        let a = read_upvalue_record(&mut r).unwrap();
        let b = read_upvalue_record(&mut r).unwrap();
        assert!(std::rc::Rc::ptr_eq(&a, &b));
        assert!(matches!(a.borrow().value, Value::Number(n) if n == 5.0));
    }

    fn dummy_closure(name: &'static str) -> ClosureRef {
        use crate::host::HostFn;
        Rc::new(Closure::Host {
            func: HostFn::new(name, |_| vec![]),
            upvalues: vec![],
        })
    }

    #[test]
    fn claim_reconciles_value_decoded_after_an_earlier_claim() {
        // Simulates a cycle: closure B claims the record while its value is
        // still the fresh placeholder `Nil`, and only afterward does the
        // record's real value get filled in (as `read_upvalue_record` does
        // once the nested recursion that held it unwinds).
        let record = UpvalRecord::fresh(Value::Nil);
        let uv_b = claim_upvalue(&record, (dummy_closure("b"), 0));
        assert!(matches!(uv_b.get(), Value::Nil));

        record.borrow_mut().value = Value::Number(9.0);

        let uv_a = claim_upvalue(&record, (dummy_closure("a"), 0));
        assert!(Rc::ptr_eq(&uv_a, &uv_b));
        assert!(matches!(uv_a.get(), Value::Number(n) if n == 9.0));
        assert!(matches!(uv_b.get(), Value::Number(n) if n == 9.0));
    }

    #[test]
    fn claim_does_not_clobber_an_already_reopened_upvalue() {
        use crate::host::Thread;
        let record = UpvalRecord::fresh(Value::Number(1.0));
        let thread: ThreadRef = Rc::new(RefCell::new(Thread::new()));
        thread.borrow_mut().stack.push(Value::Number(2.0));
        let opened = reopen_on_thread(&record, &thread, 0);
        assert!(!opened.is_closed());

        let claimed = claim_upvalue(&record, (dummy_closure("late"), 0));
        assert!(Rc::ptr_eq(&claimed, &opened));
        assert!(!claimed.is_closed());
        assert!(matches!(claimed.get(), Value::Number(n) if n == 2.0));
    }
}
