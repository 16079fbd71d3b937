//! Permanents lookup (§4.3): caller-supplied substitution of non-portable
//! objects (native functions, singletons) for arbitrary persistable keys.
//!
//! The distilled spec allows "any persistable value" as a permanent key.
//! Since the writer direction needs a `HashMap` keyed by the *replacement
//! key* on read, the key type has to be `Hash + Eq`; this implementation
//! restricts permanent keys to [`PermKey`] — booleans, integral numbers,
//! and strings by content — which is enough to express every testable
//! property in §8 (see DESIGN.md, "Open Question: permanent-key
//! hashability").

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::host::{RefKey, Value};

/// A hashable permanent key.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum PermKey {
    Bool(bool),
    Int(i64),
    Str(Vec<u8>),
}

impl PermKey {
    pub fn str(s: impl Into<String>) -> PermKey {
        PermKey::Str(s.into().into_bytes())
    }

    /// Converts a decoded [`Value`] into a `PermKey`, for the reader side
    /// of the `PERMANENT` path (§4.3, §4.11): the key itself is persisted
    /// as an ordinary value and has to be turned back into something
    /// hashable to look up in [`ReadPerms`].
    pub fn from_value(v: &Value) -> Result<PermKey> {
        match v {
            Value::Bool(b) => Ok(PermKey::Bool(*b)),
            Value::Number(n) if n.fract() == 0.0 => Ok(PermKey::Int(*n as i64)),
            Value::Str(s) => Ok(PermKey::Str(s.to_vec())),
            other => Err(Error::perms_violation(format!(
                "permanent key of type {} is not a supported hashable key",
                other.type_name()
            ))),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            PermKey::Bool(b) => Value::Bool(*b),
            PermKey::Int(i) => Value::Number(*i as f64),
            PermKey::Str(s) => Value::str(s.clone()),
        }
    }
}

/// The writer-direction permanents table: live object identity → key.
#[derive(Default)]
pub struct WritePerms {
    map: HashMap<RefKey, PermKey>,
}

impl WritePerms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, identity: RefKey, key: PermKey) {
        self.map.insert(identity, key);
    }

    pub fn lookup(&self, identity: &RefKey) -> Option<&PermKey> {
        self.map.get(identity)
    }
}

/// The reader-direction permanents table: key → live object.
#[derive(Default)]
pub struct ReadPerms {
    map: HashMap<PermKey, Value>,
}

impl ReadPerms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: PermKey, value: Value) {
        self.map.insert(key, value);
    }

    pub fn lookup(&self, key: &PermKey) -> Option<&Value> {
        self.map.get(key)
    }
}
