//! Coroutine codec (§4.10): stack, call-info frames, and the open-upvalue
//! list, plus the three forbidden cases that can't be reconstructed.

use std::cell::RefCell;
use std::io::{Read, Write};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::host::{CallInfo, CallStatus, FrameKind, Thread, ThreadRef, ThreadStatus, Value};
use crate::path::PathSegment;
use crate::primitive::{
    read_bool, read_i32, read_ioffset, read_size, read_u32, write_bool, write_i32, write_ioffset,
    write_size, write_u32,
};

use super::context::{Reader, Writer};
use super::dispatcher::{persist_value, unpersist_value};
use super::upvalue::{read_upvalue_record, reopen_on_thread, write_upvalue};

pub fn write_thread_body<W: Write>(w: &mut Writer<'_, W>, t: &ThreadRef) -> Result<()> {
    let thread = t.borrow();

    if thread.status == ThreadStatus::Running {
        return Err(Error::unsupported(
            "cannot persist a currently running coroutine",
        ));
    }
    if thread.has_error_jump || thread.error_func.is_some() {
        return Err(Error::unsupported(
            "cannot persist a coroutine with a pending error-jump buffer or error-function index",
        ));
    }
    if thread.yielded_in_hook {
        return Err(Error::unsupported(
            "cannot persist a coroutine that yielded from within a debug hook",
        ));
    }

    write_status(w.out, thread.status)?;
    write_u32(w.out, thread.nresumes)?;
    write_bool(w.out, thread.allow_hook)?;

    write_i32(w.out, thread.stack.len() as i32)?;
    for (i, v) in thread.stack.iter().enumerate() {
        let _g = w.enter(PathSegment::StackSlot(i))?;
        let r = persist_value(w, v);
        w.leave();
        r?;
    }

    for (i, ci) in thread.call_infos.iter().enumerate() {
        write_bool(w.out, true)?;
        let _g = w.enter(PathSegment::CallInfo(i))?;
        let r = write_call_info(w, ci);
        w.leave();
        r?;
    }
    write_bool(w.out, false)?;

    write_i32(w.out, thread.open_upvalues.len() as i32)?;
    for (index, uv) in &thread.open_upvalues {
        write_size(w.out, *index as u64)?;
        write_upvalue(w, uv)?;
    }

    Ok(())
}

fn write_call_info<W: Write>(w: &mut Writer<'_, W>, ci: &CallInfo) -> Result<()> {
    write_size(w.out, ci.func_index as u64)?;
    write_size(w.out, ci.top as u64)?;
    write_i32(w.out, ci.nresults)?;
    write_bool(w.out, ci.status.contains(CallStatus::INTERPRETED))?;
    write_bool(w.out, ci.status.contains(CallStatus::HOOKED))?;
    write_bool(w.out, ci.status.contains(CallStatus::YIELDABLE_PCALL))?;
    write_bool(w.out, ci.status.contains(CallStatus::TAIL))?;
    write_ioffset(w.out, ci.extra)?;

    match &ci.kind {
        FrameKind::Interpreted { base, saved_pc } => {
            write_bool(w.out, true)?;
            write_size(w.out, *base as u64)?;
            write_size(w.out, *saved_pc as u64)
        }
        FrameKind::Host { continuation } => {
            write_bool(w.out, false)?;
            match continuation {
                Some((ctx, func)) => {
                    write_bool(w.out, true)?;
                    write_ioffset(w.out, *ctx)?;
                    persist_value(w, func)
                }
                None => write_bool(w.out, false),
            }
        }
    }
}

pub fn read_thread_body<R: Read>(r: &mut Reader<'_, R>) -> Result<Value> {
    let shell: ThreadRef = Rc::new(RefCell::new(Thread::new()));
    let value = Value::Thread(shell.clone());
    r.refs.register(crate::reftbl::Slot::Value(value.clone()));

    let status = read_status(r.src)?;
    let nresumes = read_u32(r.src)?;
    let allow_hook = read_bool(r.src)?;

    let stack_len = read_i32(r.src)? as usize;
    let mut stack = Vec::with_capacity(stack_len);
    for i in 0..stack_len {
        let _g = r.enter(PathSegment::StackSlot(i))?;
        let v = unpersist_value(r);
        r.leave();
        stack.push(v?);
    }

    let mut call_infos = Vec::new();
    let mut i = 0;
    while read_bool(r.src)? {
        let _g = r.enter(PathSegment::CallInfo(i))?;
        let ci = read_call_info(r);
        r.leave();
        call_infos.push(ci?);
        i += 1;
    }

    let open_count = read_i32(r.src)? as usize;
    let mut open_upvalues = Vec::with_capacity(open_count);
    for _ in 0..open_count {
        let index = read_size(r.src)? as usize;
        let record = read_upvalue_record(r)?;
        let uv = reopen_on_thread(&record, &shell, index);
        open_upvalues.push((index, uv));
    }

    {
        let mut t = shell.borrow_mut();
        t.status = status;
        t.nresumes = nresumes;
        t.allow_hook = allow_hook;
        t.stack = stack;
        t.call_infos = call_infos;
        t.open_upvalues = open_upvalues;
    }

    Ok(value)
}

fn read_call_info<R: Read>(r: &mut Reader<'_, R>) -> Result<CallInfo> {
    let func_index = read_size(r.src)? as usize;
    let top = read_size(r.src)? as usize;
    let nresults = read_i32(r.src)?;

    let mut status = CallStatus::empty();
    status.set(CallStatus::INTERPRETED, read_bool(r.src)?);
    status.set(CallStatus::HOOKED, read_bool(r.src)?);
    status.set(CallStatus::YIELDABLE_PCALL, read_bool(r.src)?);
    status.set(CallStatus::TAIL, read_bool(r.src)?);

    let extra = read_ioffset(r.src)?;

    let kind = if read_bool(r.src)? {
        let base = read_size(r.src)? as usize;
        let saved_pc = read_size(r.src)? as usize;
        FrameKind::Interpreted { base, saved_pc }
    } else {
        let continuation = if read_bool(r.src)? {
            let ctx = read_ioffset(r.src)?;
            let func = unpersist_value(r)?;
            Some((ctx, func))
        } else {
            None
        };
        FrameKind::Host { continuation }
    };

    Ok(CallInfo {
        func_index,
        top,
        nresults,
        status,
        extra,
        kind,
    })
}

fn write_status<W: Write>(w: &mut W, status: ThreadStatus) -> Result<()> {
    let tag = match status {
        ThreadStatus::Suspended => 0,
        ThreadStatus::Running => 1,
        ThreadStatus::Normal => 2,
        ThreadStatus::Dead => 3,
    };
    write_i32(w, tag)
}

fn read_status<R: Read>(r: &mut R) -> Result<ThreadStatus> {
    Ok(match read_i32(r)? {
        0 => ThreadStatus::Suspended,
        1 => ThreadStatus::Running,
        2 => ThreadStatus::Normal,
        3 => ThreadStatus::Dead,
        other => {
            return Err(Error::stream_corruption(format!(
                "invalid thread status tag {other}"
            )))
        }
    })
}
