//! The table kind (§4.5): an unordered bag of key/value pairs plus an
//! optional metatable.
//!
//! Lua-style tables hash on arbitrary values; this facade keeps pairs in an
//! insertion-ordered `Vec` instead of a `HashMap`; `Value` mixes by-content
//! kinds (numbers, strings) with by-identity kinds (tables, closures, ...)
//! and isn't `Hash`, and insertion order gives the writer a single,
//! deterministic traversal order (§8 "Persist is deterministic").

use std::cell::RefCell;
use std::rc::Rc;

use super::value::Value;

pub type TableRef = Rc<RefCell<Table>>;

#[derive(Default)]
pub struct Table {
    pub pairs: Vec<(Value, Value)>,
    pub metatable: Option<TableRef>,
}

impl Table {
    pub fn new() -> Self {
        Table::default()
    }

    /// Raw get, by content-or-identity equality as implemented by
    /// [`super::value::structural_eq`]'s shallow cousin: here we only need
    /// equality for hashable-ish keys (numbers, strings, identity of
    /// reference kinds), so a direct match suffices.
    pub fn get(&self, key: &Value) -> Value {
        for (k, v) in &self.pairs {
            if raw_eq(k, key) {
                return v.clone();
            }
        }
        Value::Nil
    }

    /// Raw set. Setting a key to `Nil` removes the pair, matching Lua's
    /// `t[k] = nil` semantics and the writer's own "nil sentinel key"
    /// termination convention for the literal-table body.
    pub fn set(&mut self, key: Value, value: Value) {
        if let Some(pos) = self.pairs.iter().position(|(k, _)| raw_eq(k, &key)) {
            if value.is_nil() {
                self.pairs.remove(pos);
            } else {
                self.pairs[pos].1 = value;
            }
            return;
        }
        if !value.is_nil() {
            self.pairs.push((key, value));
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

fn raw_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Nil, Value::Nil) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::LightPtr(x), Value::LightPtr(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x.as_ref() == y.as_ref(),
        (Value::Table(x), Value::Table(y)) => Rc::ptr_eq(x, y),
        (Value::UserData(x), Value::UserData(y)) => Rc::ptr_eq(x, y),
        (Value::Closure(x), Value::Closure(y)) => Rc::ptr_eq(x, y),
        (Value::Thread(x), Value::Thread(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_nil_removes_pair() {
        let mut t = Table::new();
        t.set(Value::str("x"), Value::Number(1.0));
        assert_eq!(t.len(), 1);
        t.set(Value::str("x"), Value::Nil);
        assert!(t.is_empty());
    }

    #[test]
    fn overwrite_keeps_single_pair() {
        let mut t = Table::new();
        t.set(Value::Number(1.0), Value::str("a"));
        t.set(Value::Number(1.0), Value::str("b"));
        assert_eq!(t.len(), 1);
        if let Value::Str(s) = t.get(&Value::Number(1.0)) {
            assert_eq!(&*s, b"b");
        } else {
            panic!("expected string");
        }
    }
}
