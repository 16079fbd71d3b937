//! Prototype codec (§4.6). A prototype is not a first-class value, so it
//! is keyed by surrogate pointer identity exactly like an upvalue (§4.8)
//! and goes through its own small framing-word switch rather than
//! `dispatcher::persist_value`/`unpersist_value` (see `codec::keyed`).

use std::io::{Read, Write};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::host::{DebugInfo, LocalVar, Prototype, PrototypeRef, RefKey, UpvalDesc};
use crate::kind::{Kind, PERMANENT, REF_OFFSET};
use crate::path::PathSegment;
use crate::primitive::{
    read_bool, read_bytes, read_i32, read_u8, write_bool, write_bytes, write_i32, write_u8,
};
use crate::reftbl::Slot;

use super::context::{Reader, Writer};
use super::dispatcher::{persist_value, unpersist_value};
use super::keyed::persist_keyed;

pub fn write_prototype<W: Write>(w: &mut Writer<'_, W>, proto: &PrototypeRef) -> Result<()> {
    let key = RefKey::Prototype(Prototype::surrogate(proto) as usize);
    persist_keyed(w, key, Kind::Prototype, |w| write_prototype_body(w, proto))
}

fn write_prototype_body<W: Write>(w: &mut Writer<'_, W>, proto: &PrototypeRef) -> Result<()> {
    write_i32(w.out, proto.line_defined)?;
    write_i32(w.out, proto.last_line_defined)?;
    write_u8(w.out, proto.num_params)?;
    write_bool(w.out, proto.is_vararg)?;
    write_u8(w.out, proto.max_stack_size)?;

    write_i32(w.out, proto.code.len() as i32)?;
    for instr in &proto.code {
        write_i32(w.out, *instr as i32)?;
    }

    write_i32(w.out, proto.constants.len() as i32)?;
    for c in &proto.constants {
        persist_value(w, c)?;
    }

    write_i32(w.out, proto.protos.len() as i32)?;
    for (i, child) in proto.protos.iter().enumerate() {
        let _g = w.enter(PathSegment::ChildPrototype(i))?;
        let r = write_prototype(w, child);
        w.leave();
        r?;
    }

    write_i32(w.out, proto.upvalues.len() as i32)?;
    for uv in &proto.upvalues {
        write_bool(w.out, uv.in_stack)?;
        write_u8(w.out, uv.index)?;
        match &uv.name {
            Some(n) => {
                write_bool(w.out, true)?;
                write_bytes(w.out, n.as_bytes())?;
            }
            None => write_bool(w.out, false)?,
        }
    }

    match &proto.debug {
        Some(d) if w.config.debug => {
            write_bool(w.out, true)?;
            write_debug_info(w, d)
        }
        _ => write_bool(w.out, false),
    }
}

fn write_debug_info<W: Write>(w: &mut Writer<'_, W>, d: &DebugInfo) -> Result<()> {
    match &d.source {
        Some(s) => {
            write_bool(w.out, true)?;
            write_bytes(w.out, s.as_bytes())?;
        }
        None => write_bool(w.out, false)?,
    }
    write_i32(w.out, d.lines.len() as i32)?;
    for l in &d.lines {
        write_i32(w.out, *l)?;
    }
    write_i32(w.out, d.locals.len() as i32)?;
    for local in &d.locals {
        write_bytes(w.out, local.name.as_bytes())?;
        write_i32(w.out, local.start_pc as i32)?;
        write_i32(w.out, local.end_pc as i32)?;
    }
    Ok(())
}

pub fn read_prototype<R: Read>(r: &mut Reader<'_, R>) -> Result<PrototypeRef> {
    let framing = read_i32(r.src)?;

    if framing >= REF_OFFSET {
        let id = (framing - REF_OFFSET) as u32;
        return r.refs.get_prototype(id);
    }
    if framing == PERMANENT {
        return Err(Error::unsupported(
            "permanent substitution is not supported for prototypes",
        ));
    }
    let kind = Kind::try_from(framing)?;
    if kind != Kind::Prototype {
        return Err(Error::stream_corruption(format!(
            "expected prototype kind tag, got {kind:?}"
        )));
    }
    read_prototype_body(r)
}

fn read_prototype_body<R: Read>(r: &mut Reader<'_, R>) -> Result<PrototypeRef> {
    let line_defined = read_i32(r.src)?;
    let last_line_defined = read_i32(r.src)?;
    let num_params = read_u8(r.src)?;
    let is_vararg = read_bool(r.src)?;
    let max_stack_size = read_u8(r.src)?;

    let code_len = read_i32(r.src)? as usize;
    let mut code = Vec::with_capacity(code_len);
    for _ in 0..code_len {
        code.push(read_i32(r.src)? as u32);
    }

    let const_len = read_i32(r.src)? as usize;
    let mut constants = Vec::with_capacity(const_len);
    for _ in 0..const_len {
        constants.push(unpersist_value(r)?);
    }

    // Registered before reading children so a prototype graph with a
    // cycle through its own `protos` list resolves to this id instead of
    // recursing forever (Invariant R2, applied to the prototype's own
    // reftbl slot rather than to the fields above).
    let shell = Rc::new(Prototype {
        line_defined,
        last_line_defined,
        num_params,
        is_vararg,
        max_stack_size,
        code,
        constants,
        protos: Vec::new(),
        upvalues: Vec::new(),
        debug: None,
    });
    let id = r.refs.register(Slot::Prototype(shell.clone()));

    let proto_len = read_i32(r.src)? as usize;
    let mut protos = Vec::with_capacity(proto_len);
    for i in 0..proto_len {
        let _g = r.enter(PathSegment::ChildPrototype(i))?;
        let child = read_prototype(r);
        r.leave();
        protos.push(child?);
    }

    let upval_len = read_i32(r.src)? as usize;
    let mut upvalues = Vec::with_capacity(upval_len);
    for _ in 0..upval_len {
        let in_stack = read_bool(r.src)?;
        let index = read_u8(r.src)?;
        let name = if read_bool(r.src)? {
            Some(String::from_utf8_lossy(&read_bytes(r.src)?).into_owned())
        } else {
            None
        };
        upvalues.push(UpvalDesc { in_stack, index, name });
    }

    let debug = if read_bool(r.src)? {
        Some(read_debug_info(r)?)
    } else {
        None
    };

    let complete = Rc::new(Prototype {
        line_defined: shell.line_defined,
        last_line_defined: shell.last_line_defined,
        num_params: shell.num_params,
        is_vararg: shell.is_vararg,
        max_stack_size: shell.max_stack_size,
        code: shell.code.clone(),
        constants: shell.constants.clone(),
        protos,
        upvalues,
        debug,
    });
    r.refs.rewrite(id, Slot::Prototype(complete.clone()));
    Ok(complete)
}

fn read_debug_info<R: Read>(r: &mut Reader<'_, R>) -> Result<DebugInfo> {
    let source = if read_bool(r.src)? {
        Some(String::from_utf8_lossy(&read_bytes(r.src)?).into_owned())
    } else {
        None
    };
    let line_len = read_i32(r.src)? as usize;
    let mut lines = Vec::with_capacity(line_len);
    for _ in 0..line_len {
        lines.push(read_i32(r.src)?);
    }
    let local_len = read_i32(r.src)? as usize;
    let mut locals = Vec::with_capacity(local_len);
    for _ in 0..local_len {
        let name = String::from_utf8_lossy(&read_bytes(r.src)?).into_owned();
        let start_pc = read_i32(r.src)? as u32;
        let end_pc = read_i32(r.src)? as u32;
        locals.push(LocalVar { name, start_pc, end_pc });
    }
    Ok(DebugInfo { source, lines, locals })
}
