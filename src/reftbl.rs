//! The reference table (§3.2, §4.2): a dense, monotonically-allocated
//! integer index shared by every non-trivial value *and* by prototypes and
//! upvalues (which are not `Value`s but still consume ids, since §4.2 says
//! ids are "allocated monotonically from 1" across the whole graph).

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::host::{PrototypeRef, RefKey, UpvalRecordRef, Value};

/// Writer-side: identity → already-assigned id (Invariant R1, §3.2).
#[derive(Default)]
pub struct WriteRefTable {
    ids: HashMap<RefKey, u32>,
    next_id: u32,
}

impl WriteRefTable {
    pub fn new() -> Self {
        WriteRefTable {
            ids: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn lookup(&self, key: &RefKey) -> Option<u32> {
        self.ids.get(key).copied()
    }

    /// Allocates a fresh id and binds `key` to it. Must be called before
    /// recursing into the value's body (Invariant R2).
    pub fn bind(&mut self, key: RefKey) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.ids.insert(key, id);
        log::trace!("writer: bound ref id {id} to {key:?}");
        id
    }
}

/// What a reader-side reftbl slot holds. Most slots are ordinary values;
/// prototypes and upvalue records are kept distinct so a dangling or
/// wrong-kind reference is caught instead of silently reinterpreted.
#[derive(Clone)]
pub enum Slot {
    Value(Value),
    Prototype(PrototypeRef),
    UpvalRecord(UpvalRecordRef),
}

/// Reader-side: dense `id → slot`, 1-based (Invariant R2).
pub struct ReadRefTable {
    slots: Vec<Slot>,
}

impl ReadRefTable {
    pub fn new() -> Self {
        // Slot 0 is never addressed; keeps ids 1-based without an offset.
        ReadRefTable {
            slots: vec![Slot::Value(Value::Nil)],
        }
    }

    pub fn register(&mut self, slot: Slot) -> u32 {
        self.slots.push(slot);
        let id = (self.slots.len() - 1) as u32;
        log::trace!("reader: registered ref id {id}");
        id
    }

    pub fn rewrite(&mut self, id: u32, slot: Slot) {
        self.slots[id as usize] = slot;
    }

    pub fn get_value(&self, id: u32) -> Result<Value> {
        match self.slots.get(id as usize) {
            Some(Slot::Value(v)) => Ok(v.clone()),
            Some(_) => Err(Error::stream_corruption(format!(
                "reference {id} does not refer to a value"
            ))),
            None => Err(Error::stream_corruption(format!(
                "dangling reference id {id}"
            ))),
        }
    }

    pub fn get_prototype(&self, id: u32) -> Result<PrototypeRef> {
        match self.slots.get(id as usize) {
            Some(Slot::Prototype(p)) => Ok(p.clone()),
            Some(_) => Err(Error::stream_corruption(format!(
                "reference {id} does not refer to a prototype"
            ))),
            None => Err(Error::stream_corruption(format!(
                "dangling reference id {id}"
            ))),
        }
    }

    pub fn get_upval_record(&self, id: u32) -> Result<UpvalRecordRef> {
        match self.slots.get(id as usize) {
            Some(Slot::UpvalRecord(r)) => Ok(r.clone()),
            Some(_) => Err(Error::stream_corruption(format!(
                "reference {id} does not refer to an upvalue"
            ))),
            None => Err(Error::stream_corruption(format!(
                "dangling reference id {id}"
            ))),
        }
    }
}

impl Default for ReadRefTable {
    fn default() -> Self {
        Self::new()
    }
}
