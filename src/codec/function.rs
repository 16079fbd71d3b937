//! Closure codec (§4.7, §4.9).
//!
//! A host closure wraps a native function and can only survive a round
//! trip via the permanents table (§4.3): [`write_closure_body`] is only
//! ever reached for a host closure when the writer found no permanent key
//! for it, which is always an error. An interpreted closure persists its
//! prototype (by surrogate, §4.6/§4.8) and its upvalues, reconstructing
//! shared upvalues through the [`super::upvalue::UpvalRecord`] protocol:
//! the closure is allocated with nil upvalue slots and registered in the
//! reference table *before* its upvalues are read, so a closure that
//! captures itself (a classic `local f; f = function() return f() end`)
//! resolves the cycle instead of recursing forever.

use std::cell::RefCell;
use std::io::{Read, Write};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::host::{Closure, ClosureRef, Upvalue, Value};
use crate::kind::Kind;
use crate::path::PathSegment;
use crate::primitive::{read_u8, write_u8};
use crate::reftbl::Slot;

use super::context::{Reader, Writer};
use super::prototype::{read_prototype, write_prototype};
use super::upvalue::{claim_upvalue, read_upvalue_record, write_upvalue};

pub fn closure_kind(c: &Closure) -> Kind {
    match c {
        Closure::Host { .. } => Kind::ClosureHost,
        Closure::Lua { .. } => Kind::ClosureLua,
    }
}

pub fn write_closure_body<W: Write>(w: &mut Writer<'_, W>, c: &Closure) -> Result<()> {
    match c {
        Closure::Host { func, .. } => Err(Error::unsupported(format!(
            "host closure '{}' has no permanent key",
            func.name
        ))),
        Closure::Lua { proto, upvalues } => {
            write_prototype(w, proto)?;
            write_u8(w.out, upvalues.len() as u8)?;
            for (i, slot) in upvalues.iter().enumerate() {
                let _g = w.enter(PathSegment::Upvalue(i))?;
                let r = write_upvalue(w, &slot.borrow());
                w.leave();
                r?;
            }
            Ok(())
        }
    }
}

pub fn read_host_closure_body<R: Read>(_r: &mut Reader<'_, R>) -> Result<Value> {
    Err(Error::unsupported(
        "host closures can only be persisted through the permanents table",
    ))
}

pub fn read_lua_closure_body<R: Read>(r: &mut Reader<'_, R>) -> Result<Value> {
    let proto = read_prototype(r)?;
    let count = read_u8(r.src)? as usize;

    let shell: ClosureRef = Rc::new(Closure::Lua {
        proto,
        upvalues: (0..count)
            .map(|_| RefCell::new(Upvalue::closed(Value::Nil)))
            .collect(),
    });
    r.refs.register(Slot::Value(Value::Closure(shell.clone())));

    let upvalues = match shell.as_ref() {
        Closure::Lua { upvalues, .. } => upvalues,
        Closure::Host { .. } => unreachable!(),
    };

    for i in 0..count {
        let _g = r.enter(PathSegment::Upvalue(i))?;
        let record = read_upvalue_record(r);
        r.leave();
        let record = record?;
        let claimed = claim_upvalue(&record, (shell.clone(), i));
        *upvalues[i].borrow_mut() = claimed;
    }

    Ok(Value::Closure(shell))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::host::{Prototype, PrototypeRef};
    use crate::perms::{ReadPerms, WritePerms};
    use std::io::Cursor;

    fn trivial_proto() -> PrototypeRef {
        Rc::new(Prototype {
            line_defined: 0,
            last_line_defined: 0,
            num_params: 0,
            is_vararg: false,
            max_stack_size: 1,
            code: vec![],
            constants: vec![],
            protos: vec![],
            upvalues: vec![],
            debug: None,
        })
    }

    #[test]
    fn closure_sharing_an_upvalue_round_trips_to_one_record() {
        let counter = Upvalue::closed(Value::Number(0.0));
        let f1 = Rc::new(Closure::Lua {
            proto: trivial_proto(),
            upvalues: vec![RefCell::new(counter.clone())],
        });
        let f2 = Rc::new(Closure::Lua {
            proto: trivial_proto(),
            upvalues: vec![RefCell::new(counter)],
        });

        let perms_w = WritePerms::new();
        let cfg = Config::default();
        let mut buf = Vec::new();
        {
            let mut w = Writer::new(&mut buf, &perms_w, &cfg);
            super::super::dispatcher::persist_value(&mut w, &Value::Closure(f1)).unwrap();
            super::super::dispatcher::persist_value(&mut w, &Value::Closure(f2)).unwrap();
        }

        let perms_r = ReadPerms::new();
        let mut cur = Cursor::new(buf);
        let mut r = Reader::new(&mut cur, &perms_r, &cfg);
        let v1 = super::super::dispatcher::unpersist_value(&mut r).unwrap();
        let v2 = super::super::dispatcher::unpersist_value(&mut r).unwrap();

        let uv1 = match &v1 {
            Value::Closure(c) => match c.as_ref() {
                Closure::Lua { upvalues, .. } => upvalues[0].borrow().clone(),
                _ => panic!("expected lua closure"),
            },
            _ => panic!("expected closure"),
        };
        let uv2 = match &v2 {
            Value::Closure(c) => match c.as_ref() {
                Closure::Lua { upvalues, .. } => upvalues[0].borrow().clone(),
                _ => panic!("expected lua closure"),
            },
            _ => panic!("expected closure"),
        };
        assert!(Rc::ptr_eq(&uv1, &uv2));
    }

    #[test]
    fn host_closure_without_permanent_is_an_error() {
        use crate::host::HostFn;
        let c = Closure::Host {
            func: HostFn::new("orphan", |_| vec![]),
            upvalues: vec![],
        };
        let perms_w = WritePerms::new();
        let cfg = Config::default();
        let mut buf = Vec::new();
        let mut w = Writer::new(&mut buf, &perms_w, &cfg);
        assert!(super::super::dispatcher::persist_value(&mut w, &Value::Closure(Rc::new(c))).is_err());
    }
}
