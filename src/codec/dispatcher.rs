//! The top-level type dispatcher (§4.11): writes a value's tag and body,
//! or reads a framing word and dispatches to the matching body reader.

use std::io::{Read, Write};

use crate::error::{Error, Result};
use crate::host::Value;
use crate::kind::{Kind, PERMANENT, REF_OFFSET};
use crate::path::PathSegment;
use crate::perms::PermKey;
use crate::primitive::{read_bool, read_f64, read_i32, read_ptr, write_bool, write_f64, write_i32, write_ptr};
use crate::reftbl::Slot;

use super::context::{Reader, Writer};
use super::keyed::persist_keyed;
use super::{function, simple, table, thread, userdata};

pub fn persist_value<W: Write>(w: &mut Writer<'_, W>, v: &Value) -> Result<()> {
    match v {
        Value::Nil => write_i32(w.out, Kind::Nil.as_i32()),
        Value::Bool(b) => {
            write_i32(w.out, Kind::Bool.as_i32())?;
            write_bool(w.out, *b)
        }
        Value::LightPtr(p) => {
            write_i32(w.out, Kind::LightPtr.as_i32())?;
            write_ptr(w.out, *p)
        }
        Value::Number(n) => {
            write_i32(w.out, Kind::Number.as_i32())?;
            write_f64(w.out, *n)
        }
        Value::Str(bytes) => {
            let key = v.identity().expect("strings have identity");
            persist_keyed(w, key, Kind::Str, |w| simple::write_string_body(w, bytes))
        }
        Value::Table(t) => {
            let key = v.identity().expect("tables have identity");
            persist_keyed(w, key, Kind::Table, |w| table::write_table_body(w, t))
        }
        Value::UserData(u) => {
            let key = v.identity().expect("userdata has identity");
            persist_keyed(w, key, Kind::UserData, |w| userdata::write_userdata_body(w, u))
        }
        Value::Closure(c) => {
            let key = v.identity().expect("closures have identity");
            let kind = function::closure_kind(c);
            persist_keyed(w, key, kind, |w| function::write_closure_body(w, c))
        }
        Value::Thread(t) => {
            let key = v.identity().expect("threads have identity");
            persist_keyed(w, key, Kind::Thread, |w| thread::write_thread_body(w, t))
        }
    }
}

pub fn unpersist_value<R: Read>(r: &mut Reader<'_, R>) -> Result<Value> {
    let framing = read_i32(r.src)?;

    if framing >= REF_OFFSET {
        let id = (framing - REF_OFFSET) as u32;
        return r.refs.get_value(id);
    }

    if framing == PERMANENT {
        return read_permanent_value(r);
    }

    let kind = Kind::try_from(framing)?;
    match kind {
        Kind::Nil => Ok(Value::Nil),
        Kind::Bool => Ok(Value::Bool(read_bool(r.src)?)),
        Kind::LightPtr => Ok(Value::LightPtr(read_ptr(r.src)?)),
        Kind::Number => Ok(Value::Number(read_f64(r.src)?)),
        Kind::Str => simple::read_string_body(r),
        Kind::Table => table::read_table_body(r),
        Kind::UserData => userdata::read_userdata_body(r),
        Kind::ClosureHost => function::read_host_closure_body(r),
        Kind::ClosureLua => function::read_lua_closure_body(r),
        Kind::Thread => thread::read_thread_body(r),
        Kind::Prototype | Kind::Upvalue => Err(Error::stream_corruption(
            "prototype/upvalue kind tag encountered at value position",
        )),
    }
}

fn read_permanent_value<R: Read>(r: &mut Reader<'_, R>) -> Result<Value> {
    let _guard = r.enter(PathSegment::PermanentKey)?;
    let id = r.refs.register(Slot::Value(Value::Nil));
    let original_kind = Kind::try_from(read_i32(r.src)?)?;
    let key_value = unpersist_value(r);
    r.leave();
    let key_value = key_value?;

    let perm_key = PermKey::from_value(&key_value)?;
    let resolved = r
        .perms
        .lookup(&perm_key)
        .cloned()
        .ok_or_else(|| Error::perms_violation(format!("permanent key {perm_key:?} absent on read")))?;
    check_kind(&resolved, original_kind)?;
    r.refs.rewrite(id, Slot::Value(resolved.clone()));
    Ok(resolved)
}

/// Type-checks a permanent's resolved value against the kind tag recorded
/// at write time (§4.3 "fails if the result is missing or of the wrong
/// kind").
pub(crate) fn check_kind(v: &Value, expected: Kind) -> Result<()> {
    let actual = match v {
        Value::Nil => Kind::Nil,
        Value::Bool(_) => Kind::Bool,
        Value::LightPtr(_) => Kind::LightPtr,
        Value::Number(_) => Kind::Number,
        Value::Str(_) => Kind::Str,
        Value::Table(_) => Kind::Table,
        Value::UserData(_) => Kind::UserData,
        Value::Closure(c) => function::closure_kind(c),
        Value::Thread(_) => Kind::Thread,
    };
    if actual != expected {
        return Err(Error::perms_violation(format!(
            "permanent key resolved to a {actual:?} value, expected {expected:?}"
        )));
    }
    Ok(())
}
