//! Generalized keyed persistence (§4.8): the writer-side protocol shared by
//! ordinary reference-typed values, prototypes, and upvalues, all of which
//! are identified in the reference table by some [`RefKey`] rather than
//! being written inline.
//!
//! The reader side isn't generalized the same way: each of `dispatcher`,
//! `prototype`, and `upvalue` decode to a different Rust type (`Value`,
//! `PrototypeRef`, `UpvalRecordRef`), so each implements its own small
//! framing-word switch rather than going through one generic function.

use std::io::Write;

use crate::error::Result;
use crate::host::RefKey;
use crate::kind::{Kind, REF_OFFSET};
use crate::primitive::write_i32;

use super::context::Writer;
use super::dispatcher::persist_value;

/// Implements §4.8 steps 1-4: emit a reference if `key` was already seen,
/// otherwise bind a fresh id, consult permanents under `key`, and
/// otherwise fall through to `body` to write the kind tag and payload.
pub fn persist_keyed<W: Write>(
    w: &mut Writer<'_, W>,
    key: RefKey,
    kind: Kind,
    body: impl FnOnce(&mut Writer<'_, W>) -> Result<()>,
) -> Result<()> {
    if let Some(id) = w.refs.lookup(&key) {
        return write_i32(w.out, REF_OFFSET + id as i32);
    }

    w.refs.bind(key);

    if let Some(perm_key) = w.perms.lookup(&key).cloned() {
        log::debug!("writer: substituting permanent key for {key:?}");
        write_i32(w.out, crate::kind::PERMANENT)?;
        write_i32(w.out, kind.as_i32())?;
        return persist_value(w, &perm_key.to_value());
    }

    write_i32(w.out, kind.as_i32())?;
    body(w)
}
