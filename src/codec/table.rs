//! Table codec with special persistence (§4.5).

use std::cell::RefCell;
use std::io::{Read, Write};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::host::{Table, TableRef, Value};
use crate::kind::Kind;
use crate::path::PathSegment;
use crate::primitive::{read_bool, write_bool};
use crate::reftbl::Slot;

use super::context::{Reader, Writer};
use super::dispatcher::{check_kind, persist_value, unpersist_value};
use super::special::{invoke_closure, invoke_reconstruct, resolve_persist_field, PersistField};

pub fn write_table_body<W: Write>(w: &mut Writer<'_, W>, t: &TableRef) -> Result<()> {
    match resolve_persist_field(&t.borrow().metatable, &w.config.persist_key)? {
        PersistField::Absent | PersistField::Literal => {
            write_bool(w.out, false)?;
            write_literal_table(w, t)
        }
        PersistField::Forbidden => Err(Error::forbidden(
            "table marked non-persistable via __persist = false",
        )),
        PersistField::Special(callback) => {
            write_bool(w.out, true)?;
            let reconstruct = invoke_closure(&callback, &[Value::Table(t.clone())])?;
            persist_value(w, &reconstruct)
        }
    }
}

fn write_literal_table<W: Write>(w: &mut Writer<'_, W>, t: &TableRef) -> Result<()> {
    let pairs = t.borrow().pairs.clone();
    for (k, v) in &pairs {
        {
            let _g = w.enter(PathSegment::TableKey(format!("{k:?}")))?;
            persist_value(w, k)?;
            persist_value(w, v)?;
            w.leave();
        }
    }
    persist_value(w, &Value::Nil)?;

    let meta = t.borrow().metatable.clone();
    let _g = w.enter(PathSegment::Metatable)?;
    let result = match meta {
        Some(m) => persist_value(w, &Value::Table(m)),
        None => persist_value(w, &Value::Nil),
    };
    w.leave();
    result
}

pub fn read_table_body<R: Read>(r: &mut Reader<'_, R>) -> Result<Value> {
    let special = read_bool(r.src)?;
    if special {
        let id = r.refs.register(Slot::Value(Value::Nil));
        let reconstruct = unpersist_value(r)?;
        let result = invoke_reconstruct(&reconstruct)?;
        check_kind(&result, Kind::Table)?;
        r.refs.rewrite(id, Slot::Value(result.clone()));
        return Ok(result);
    }

    let table: TableRef = Rc::new(RefCell::new(Table::new()));
    let value = Value::Table(table.clone());
    r.refs.register(Slot::Value(value.clone()));

    loop {
        let key = unpersist_value(r)?;
        if key.is_nil() {
            break;
        }
        let val = unpersist_value(r)?;
        if val.is_nil() {
            return Err(Error::stream_corruption(
                "nil value in literal table body",
            ));
        }
        table.borrow_mut().set(key, val);
    }

    let meta = unpersist_value(r)?;
    if let Value::Table(m) = meta {
        table.borrow_mut().metatable = Some(m);
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::perms::{ReadPerms, WritePerms};
    use std::io::Cursor;

    fn round_trip(v: Value) -> Value {
        let perms_w = WritePerms::new();
        let cfg = Config::default();
        let mut buf = Vec::new();
        {
            let mut w = Writer::new(&mut buf, &perms_w, &cfg);
            persist_value(&mut w, &v).unwrap();
        }
        let perms_r = ReadPerms::new();
        let mut cur = Cursor::new(buf);
        let mut r = Reader::new(&mut cur, &perms_r, &cfg);
        unpersist_value(&mut r).unwrap()
    }

    #[test]
    fn array_like_table_round_trips() {
        let t = Rc::new(RefCell::new(Table::new()));
        t.borrow_mut().set(Value::Number(1.0), Value::Number(10.0));
        t.borrow_mut().set(Value::Number(2.0), Value::Number(20.0));
        t.borrow_mut().set(Value::Number(3.0), Value::Number(30.0));
        let v2 = round_trip(Value::Table(t));
        if let Value::Table(t2) = &v2 {
            assert_eq!(t2.borrow().get(&Value::Number(2.0)).type_name(), "number");
        } else {
            panic!("expected table");
        }
    }

    #[test]
    fn self_referential_table_round_trips() {
        let t: TableRef = Rc::new(RefCell::new(Table::new()));
        t.borrow_mut().set(Value::str("me"), Value::Table(t.clone()));
        let v2 = round_trip(Value::Table(t));
        if let Value::Table(t2) = &v2 {
            let me = t2.borrow().get(&Value::str("me"));
            if let Value::Table(inner) = me {
                assert!(Rc::ptr_eq(&inner, t2));
            } else {
                panic!("expected self-reference");
            }
        } else {
            panic!("expected table");
        }
    }
}
