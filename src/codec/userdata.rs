//! Userdata codec (§4.5). Unlike tables, literal persistence is forbidden
//! by default: an opaque payload can't be reconstructed without the
//! owner's cooperation. `__persist = true` opts a userdata into literal
//! persistence (a size-prefixed raw payload followed by a metatable slot,
//! mirroring the table literal body) the same way `false`/a function opt
//! it into forbidden/special handling.

use std::cell::RefCell;
use std::io::{Read, Write};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::host::{UserData, UserDataRef, Value};
use crate::kind::Kind;
use crate::primitive::{read_bool, read_bytes, write_bool, write_bytes};
use crate::reftbl::Slot;

use super::context::{Reader, Writer};
use super::dispatcher::{check_kind, persist_value, unpersist_value};
use super::special::{invoke_closure, invoke_reconstruct, resolve_persist_field, PersistField};

pub fn write_userdata_body<W: Write>(w: &mut Writer<'_, W>, u: &UserDataRef) -> Result<()> {
    match resolve_persist_field(&u.borrow().metatable, &w.config.persist_key)? {
        PersistField::Absent => Err(Error::forbidden(
            "userdata has no '__persist' metafield; literal userdata is forbidden",
        )),
        PersistField::Literal => {
            write_bool(w.out, false)?;
            write_literal_userdata(w, u)
        }
        PersistField::Forbidden => Err(Error::forbidden(
            "userdata marked non-persistable via __persist = false",
        )),
        PersistField::Special(callback) => {
            write_bool(w.out, true)?;
            let reconstruct = invoke_closure(&callback, &[Value::UserData(u.clone())])?;
            persist_value(w, &reconstruct)
        }
    }
}

fn write_literal_userdata<W: Write>(w: &mut Writer<'_, W>, u: &UserDataRef) -> Result<()> {
    let payload = u.borrow().payload.clone();
    write_bytes(w.out, &payload)?;

    let meta = u.borrow().metatable.clone();
    match meta {
        Some(m) => persist_value(w, &Value::Table(m)),
        None => persist_value(w, &Value::Nil),
    }
}

pub fn read_userdata_body<R: Read>(r: &mut Reader<'_, R>) -> Result<Value> {
    let special = read_bool(r.src)?;
    if special {
        let id = r.refs.register(Slot::Value(Value::Nil));
        let reconstruct = unpersist_value(r)?;
        let result = invoke_reconstruct(&reconstruct)?;
        check_kind(&result, Kind::UserData)?;
        r.refs.rewrite(id, Slot::Value(result.clone()));
        return Ok(result);
    }
    read_literal_userdata_body(r)
}

fn read_literal_userdata_body<R: Read>(r: &mut Reader<'_, R>) -> Result<Value> {
    let payload = read_bytes(r.src)?;
    let ud: UserDataRef = Rc::new(RefCell::new(UserData::new(payload)));
    let value = Value::UserData(ud.clone());
    r.refs.register(Slot::Value(value.clone()));

    let meta = unpersist_value(r)?;
    if let Value::Table(m) = meta {
        ud.borrow_mut().metatable = Some(m);
    }

    Ok(value)
}

/// Helper for tests and host embedders: wraps a raw payload as userdata
/// with a `__persist` hook that re-wraps the payload bytes on the way
/// back in, exercised by `tests/roundtrip.rs`.
pub fn userdata_with_payload_hook(payload: Vec<u8>) -> UserDataRef {
    let ud = Rc::new(RefCell::new(UserData::new(payload.clone())));
    let meta: crate::host::TableRef = Rc::new(RefCell::new(crate::host::Table::new()));
    let bytes = payload;
    let hook = crate::host::Closure::Host {
        func: crate::host::HostFn::new("__persist", move |_args| {
            let bytes = bytes.clone();
            let rebuild = crate::host::Closure::Host {
                func: crate::host::HostFn::new("__rebuild", move |_| {
                    vec![Value::UserData(Rc::new(RefCell::new(UserData::new(bytes.clone()))))]
                }),
                upvalues: vec![],
            };
            vec![Value::Closure(Rc::new(rebuild))]
        }),
        upvalues: vec![],
    };
    meta.borrow_mut()
        .set(Value::str("__persist"), Value::Closure(Rc::new(hook)));
    ud.borrow_mut().metatable = Some(meta);
    ud
}
