//! The four caller-facing operations (§6.2): two that work against an
//! arbitrary sink/source and two convenience wrappers over an in-memory
//! byte buffer.

use std::io::{Read, Write};

use crate::codec::{persist_value, unpersist_value, Reader, Writer};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::header;
use crate::host::Value;
use crate::path::Path;
use crate::perms::{ReadPerms, WritePerms};

/// Writes `value` and everything reachable from it to `out`, consulting
/// `perms` for non-portable objects.
pub fn dump<W: Write>(perms: &WritePerms, config: &Config, value: &Value, out: &mut W) -> Result<()> {
    header::write_header(out)?;
    let mut w = Writer::new(out, perms, config);
    persist_value(&mut w, value).map_err(|e| attach_path(e, &w.path))
}

/// Reads a value previously written by [`dump`], consulting `perms` to
/// resolve permanent-key indirections.
pub fn undump<R: Read>(perms: &ReadPerms, config: &Config, src: &mut R) -> Result<Value> {
    header::read_header(src)?;
    let mut r = Reader::new(src, perms, config);
    unpersist_value(&mut r).map_err(|e| attach_path(e, &r.path))
}

/// [`dump`] into a freshly allocated buffer.
pub fn persist(perms: &WritePerms, config: &Config, value: &Value) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    dump(perms, config, value, &mut buf)?;
    Ok(buf)
}

/// [`undump`] from a byte slice.
pub fn unpersist(perms: &ReadPerms, config: &Config, bytes: &[u8]) -> Result<Value> {
    let mut cursor = std::io::Cursor::new(bytes);
    undump(perms, config, &mut cursor)
}

fn attach_path(e: Error, path: &Path) -> Error {
    e.with_path(path)
}
