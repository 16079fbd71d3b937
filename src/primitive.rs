//! Fixed-width primitive codec.
//!
//! Unlike a wire format built on variable-length integers, this engine's
//! framing words and scalar payloads are native-width machine words with no
//! endianness translation (§4.1): the stream is only ever read back by a
//! process with matching widths, and the [`crate::header`] module is what
//! catches a mismatch, not per-value conversion.

use std::io::{self, Read, Write};

use crate::error::{Error, Result};

#[inline]
fn wrap_io<T>(r: io::Result<T>) -> Result<T> {
    r.map_err(Error::from)
}

pub fn write_u8<W: Write>(w: &mut W, v: u8) -> Result<()> {
    wrap_io(w.write_all(&[v]))
}

pub fn read_u8<R: Read>(r: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    wrap_io(r.read_exact(&mut buf))?;
    Ok(buf[0])
}

pub fn write_bool<W: Write>(w: &mut W, v: bool) -> Result<()> {
    write_u8(w, v as u8)
}

pub fn read_bool<R: Read>(r: &mut R) -> Result<bool> {
    match read_u8(r)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(Error::stream_corruption(format!(
            "invalid boolean byte: {other}"
        ))),
    }
}

pub fn write_i32<W: Write>(w: &mut W, v: i32) -> Result<()> {
    wrap_io(w.write_all(&v.to_ne_bytes()))
}

pub fn read_i32<R: Read>(r: &mut R) -> Result<i32> {
    let mut buf = [0u8; 4];
    wrap_io(r.read_exact(&mut buf))?;
    Ok(i32::from_ne_bytes(buf))
}

pub fn write_u32<W: Write>(w: &mut W, v: u32) -> Result<()> {
    wrap_io(w.write_all(&v.to_ne_bytes()))
}

pub fn read_u32<R: Read>(r: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    wrap_io(r.read_exact(&mut buf))?;
    Ok(u32::from_ne_bytes(buf))
}

/// Pointer-sized unsigned size (table/string/userdata/stack lengths).
pub fn write_size<W: Write>(w: &mut W, v: u64) -> Result<()> {
    wrap_io(w.write_all(&v.to_ne_bytes()))
}

pub fn read_size<R: Read>(r: &mut R) -> Result<u64> {
    let mut buf = [0u8; 8];
    wrap_io(r.read_exact(&mut buf))?;
    Ok(u64::from_ne_bytes(buf))
}

/// Pointer-sized signed offset (call-info `extra`, continuation context).
pub fn write_ioffset<W: Write>(w: &mut W, v: i64) -> Result<()> {
    wrap_io(w.write_all(&v.to_ne_bytes()))
}

pub fn read_ioffset<R: Read>(r: &mut R) -> Result<i64> {
    let mut buf = [0u8; 8];
    wrap_io(r.read_exact(&mut buf))?;
    Ok(i64::from_ne_bytes(buf))
}

/// A raw pointer-sized word: a light pointer value, or a surrogate identity
/// key for a prototype/upvalue. Never dereferenced by this crate.
pub fn write_ptr<W: Write>(w: &mut W, v: u64) -> Result<()> {
    write_size(w, v)
}

pub fn read_ptr<R: Read>(r: &mut R) -> Result<u64> {
    read_size(r)
}

/// One VM-native floating-point word.
pub fn write_f64<W: Write>(w: &mut W, v: f64) -> Result<()> {
    wrap_io(w.write_all(&v.to_ne_bytes()))
}

pub fn read_f64<R: Read>(r: &mut R) -> Result<f64> {
    let mut buf = [0u8; 8];
    wrap_io(r.read_exact(&mut buf))?;
    Ok(f64::from_ne_bytes(buf))
}

pub fn write_bytes<W: Write>(w: &mut W, bytes: &[u8]) -> Result<()> {
    write_size(w, bytes.len() as u64)?;
    wrap_io(w.write_all(bytes))
}

pub fn read_bytes<R: Read>(r: &mut R) -> Result<Vec<u8>> {
    let len = read_size(r)? as usize;
    let mut buf = vec![0u8; len];
    wrap_io(r.read_exact(&mut buf))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trip_scalars() {
        let mut buf = Vec::new();
        write_i32(&mut buf, -7).unwrap();
        write_bool(&mut buf, true).unwrap();
        write_size(&mut buf, 0xdead_beef_u64).unwrap();
        write_f64(&mut buf, 3.5).unwrap();

        let mut cur = Cursor::new(buf);
        assert_eq!(read_i32(&mut cur).unwrap(), -7);
        assert!(read_bool(&mut cur).unwrap());
        assert_eq!(read_size(&mut cur).unwrap(), 0xdead_beef_u64);
        assert_eq!(read_f64(&mut cur).unwrap(), 3.5);
    }

    #[test]
    fn round_trip_bytes() {
        let mut buf = Vec::new();
        write_bytes(&mut buf, b"hello").unwrap();
        let mut cur = Cursor::new(buf);
        assert_eq!(read_bytes(&mut cur).unwrap(), b"hello");
    }

    #[test]
    fn short_read_is_io_error() {
        let mut cur = Cursor::new(vec![0u8; 2]);
        let err = read_i32(&mut cur).unwrap_err();
        assert!(matches!(err.kind(), crate::error::ErrorKind::Io(_)));
    }

    #[test]
    fn invalid_bool_byte_is_stream_corruption() {
        let mut cur = Cursor::new(vec![7u8]);
        let err = read_bool(&mut cur).unwrap_err();
        assert!(matches!(
            err.kind(),
            crate::error::ErrorKind::StreamCorruption(_)
        ));
    }
}
