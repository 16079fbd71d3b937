//! The `__persist` metafield protocol shared by tables and userdata (§4.5).
//!
//! A metatable's `__persist` field selects how its owner is written:
//! absent/`nil` and explicit `true` are both "literal persistence", `false`
//! forbids persistence outright, and a function is called with the object
//! and must return a *reconstruction function* which is persisted in the
//! object's place and invoked with no arguments on the way back in.
//!
//! Absent and explicit-`true` are kept as distinct [`PersistField`] variants
//! rather than collapsed into one: tables default to literal persistence
//! when the field is absent, but userdata's default is the opposite
//! (literal userdata is forbidden unless `__persist = true` opts in), so
//! the two callers need to tell "no field" and "field explicitly true"
//! apart.
//!
//! Only [`Closure::Host`] values can actually be called here: this facade
//! has no bytecode interpreter, so an interpreted `__persist` or
//! reconstruction closure can't be run. Real persistable objects built for
//! this crate use host closures for their `__persist` hooks.

use crate::error::{Error, Result};
use crate::host::{Closure, ClosureRef, TableRef, Value};

pub enum PersistField {
    /// No `__persist` field at all (absent metatable, or `nil` field).
    Absent,
    /// `__persist = true`: literal persistence explicitly enabled.
    Literal,
    Forbidden,
    Special(ClosureRef),
}

pub fn resolve_persist_field(metatable: &Option<TableRef>, persist_key: &str) -> Result<PersistField> {
    let Some(mt) = metatable else {
        return Ok(PersistField::Absent);
    };
    let field = mt.borrow().get(&Value::str(persist_key.as_bytes().to_vec()));
    match field {
        Value::Nil => Ok(PersistField::Absent),
        Value::Bool(true) => Ok(PersistField::Literal),
        Value::Bool(false) => Ok(PersistField::Forbidden),
        Value::Closure(c) => Ok(PersistField::Special(c)),
        other => Err(Error::invalid_special_callback(format!(
            "'__persist' must be a boolean or a function, got {}",
            other.type_name()
        ))),
    }
}

pub fn invoke_closure(callback: &ClosureRef, args: &[Value]) -> Result<Value> {
    match callback.as_ref() {
        Closure::Host { func, .. } => Ok((func.func)(args).into_iter().next().unwrap_or(Value::Nil)),
        Closure::Lua { .. } => Err(Error::invalid_special_callback(
            "'__persist' hook is an interpreted closure; only host closures can be invoked",
        )),
    }
}

pub fn invoke_reconstruct(reconstruct: &Value) -> Result<Value> {
    match reconstruct {
        Value::Closure(c) => invoke_closure(c, &[]),
        other => Err(Error::stream_corruption(format!(
            "special-persisted reconstruction value must be a function, got {}",
            other.type_name()
        ))),
    }
}
