//! Codecs for the kinds simple enough not to need their own file: strings
//! (§4.4). Booleans, light pointers and numbers are inlined directly in
//! `dispatcher` since they never get a reference id.

use std::io::{Read, Write};
use std::rc::Rc;

use crate::error::Result;
use crate::host::Value;
use crate::primitive::{read_bytes, write_bytes};

use super::context::{Reader, Writer};

pub fn write_string_body<W: Write>(w: &mut Writer<'_, W>, bytes: &Rc<[u8]>) -> Result<()> {
    write_bytes(w.out, bytes)
}

pub fn read_string_body<R: Read>(r: &mut Reader<'_, R>) -> Result<Value> {
    let bytes = read_bytes(r.src)?;
    let value = Value::Str(Rc::from(bytes.into_boxed_slice()));
    r.refs
        .register(crate::reftbl::Slot::Value(value.clone()));
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::perms::{ReadPerms, WritePerms};
    use std::io::Cursor;

    #[test]
    fn string_round_trips_and_shares_reference() {
        let perms_w = WritePerms::new();
        let cfg = Config::default();
        let mut buf = Vec::new();
        {
            let mut w = Writer::new(&mut buf, &perms_w, &cfg);
            let s = Value::str("hello");
            super::super::dispatcher::persist_value(&mut w, &s).unwrap();
            super::super::dispatcher::persist_value(&mut w, &s).unwrap();
        }

        let perms_r = ReadPerms::new();
        let mut cur = Cursor::new(buf);
        let mut r = Reader::new(&mut cur, &perms_r, &cfg);
        let a = super::super::dispatcher::unpersist_value(&mut r).unwrap();
        let b = super::super::dispatcher::unpersist_value(&mut r).unwrap();
        assert!(crate::host::structural_eq(&a, &b));
    }
}
