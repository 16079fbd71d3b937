//! The tagged union of persistable kinds (§3.1), and identity helpers.
//!
//! No external VM is linked into this crate (see SPEC_FULL.md §6.4-A), so
//! `Value` plays the role the spec describes as "a fixed, opaque API"
//! consumed by the core: `Rc`'s pointer *is* host object identity, and
//! `Rc::as_ptr` doubles as the surrogate light pointer used for prototypes
//! and upvalues, which are not first-class values.

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use super::closure::ClosureRef;
use super::table::TableRef;
use super::thread::ThreadRef;
use super::userdata::UserDataRef;

/// A persistable host value.
#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    LightPtr(u64),
    Number(f64),
    Str(Rc<[u8]>),
    Table(TableRef),
    UserData(UserDataRef),
    Closure(ClosureRef),
    Thread(ThreadRef),
}

impl Value {
    pub fn str(bytes: impl Into<Vec<u8>>) -> Value {
        Value::Str(Rc::from(bytes.into().into_boxed_slice()))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::LightPtr(_) => "light pointer",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Table(_) => "table",
            Value::UserData(_) => "userdata",
            Value::Closure(_) => "function",
            Value::Thread(_) => "thread",
        }
    }

    /// Identity key used by the writer's reference table and permanents
    /// lookup for the reference-typed kinds (§4.2). Trivially-small kinds
    /// have no identity of their own: they are always inlined.
    pub fn identity(&self) -> Option<RefKey> {
        match self {
            Value::Nil | Value::Bool(_) | Value::LightPtr(_) | Value::Number(_) => None,
            Value::Str(s) => Some(RefKey::Str(Rc::as_ptr(s) as *const u8 as usize)),
            Value::Table(t) => Some(RefKey::Table(Rc::as_ptr(t) as usize)),
            Value::UserData(u) => Some(RefKey::UserData(Rc::as_ptr(u) as usize)),
            Value::Closure(c) => Some(RefKey::Closure(Rc::as_ptr(c) as usize)),
            Value::Thread(t) => Some(RefKey::Thread(Rc::as_ptr(t) as usize)),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::LightPtr(p) => write!(f, "lightptr(0x{p:x})"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{:?}", String::from_utf8_lossy(s)),
            Value::Table(t) => write!(f, "table({:p})", Rc::as_ptr(t)),
            Value::UserData(u) => write!(f, "userdata({:p})", Rc::as_ptr(u)),
            Value::Closure(c) => write!(f, "function({:p})", Rc::as_ptr(c)),
            Value::Thread(t) => write!(f, "thread({:p})", Rc::as_ptr(t)),
        }
    }
}

/// A reftbl / permanents key: either the identity of a first-class value,
/// or a surrogate pointer standing in for a prototype or upvalue (§4.2,
/// §9 "Object identity without hashable handles").
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum RefKey {
    Str(usize),
    Table(usize),
    UserData(usize),
    Closure(usize),
    Thread(usize),
    Prototype(usize),
    Upvalue(usize),
}

/// Recursive structural equality under identity-folding (§8): two
/// occurrences of the same table/userdata/closure/thread/upvalue are equal
/// without re-descending into them, which is what makes this terminate on
/// cyclic graphs.
pub fn structural_eq(a: &Value, b: &Value) -> bool {
    let mut seen = HashSet::new();
    eq_inner(a, b, &mut seen)
}

fn eq_inner(a: &Value, b: &Value, seen: &mut HashSet<(usize, usize)>) -> bool {
    match (a, b) {
        (Value::Nil, Value::Nil) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::LightPtr(x), Value::LightPtr(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y || (x.is_nan() && y.is_nan()),
        (Value::Str(x), Value::Str(y)) => x.as_ref() == y.as_ref(),
        (Value::Table(x), Value::Table(y)) => {
            let key = (Rc::as_ptr(x) as usize, Rc::as_ptr(y) as usize);
            if !seen.insert(key) {
                return true;
            }
            let (xb, yb) = (x.borrow(), y.borrow());
            if xb.pairs.len() != yb.pairs.len() {
                return false;
            }
            for (k, v) in xb.pairs.iter() {
                let found = yb
                    .pairs
                    .iter()
                    .find(|(k2, _)| eq_inner(k, k2, seen))
                    .map(|(_, v2)| eq_inner(v, v2, seen))
                    .unwrap_or(false);
                if !found {
                    return false;
                }
            }
            match (&xb.metatable, &yb.metatable) {
                (None, None) => true,
                (Some(mx), Some(my)) => {
                    eq_inner(&Value::Table(mx.clone()), &Value::Table(my.clone()), seen)
                }
                _ => false,
            }
        }
        (Value::UserData(x), Value::UserData(y)) => {
            let key = (Rc::as_ptr(x) as usize, Rc::as_ptr(y) as usize);
            if !seen.insert(key) {
                return true;
            }
            let (xb, yb) = (x.borrow(), y.borrow());
            xb.payload == yb.payload
        }
        (Value::Closure(_), Value::Closure(_)) => {
            // Closures are compared by identity only: this helper is used to
            // assert round-trip shape, not to diff function bodies.
            true
        }
        (Value::Thread(x), Value::Thread(y)) => Rc::as_ptr(x) as usize == Rc::as_ptr(y) as usize,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::table::Table;
    use std::cell::RefCell;

    #[test]
    fn numbers_and_strings_compare_by_value() {
        assert!(structural_eq(&Value::Number(1.0), &Value::Number(1.0)));
        assert!(structural_eq(&Value::str("a"), &Value::str("a")));
        assert!(!structural_eq(&Value::str("a"), &Value::str("b")));
    }

    #[test]
    fn self_referential_table_compares_equal_to_itself() {
        let t: TableRef = Rc::new(RefCell::new(Table::new()));
        t.borrow_mut()
            .set(Value::str("self"), Value::Table(t.clone()));
        let v = Value::Table(t);
        assert!(structural_eq(&v, &v.clone()));
    }
}
