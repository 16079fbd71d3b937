//! Entry-level stream container: magic bytes, local word widths, and a
//! canary float, checked before the recursive format (§6.1) begins.
//!
//! This is not itself part of the recursive value format; it exists purely
//! so a reader can refuse a payload written by an incompatible process
//! before attempting to interpret it as a graph.

use std::io::{Read, Write};
use std::mem::size_of;

use crate::error::{Error, Result};
use crate::primitive::{read_f64, read_u8, write_f64, write_u8};

const MAGIC: [u8; 4] = *b"PST1";

/// Sentinel float used to detect an incompatible floating-point
/// representation between writer and reader, the way `luac` bytecode
/// headers embed a canary number for the same purpose.
const CANARY: f64 = 370.5;

pub fn write_header<W: Write>(w: &mut W) -> Result<()> {
    for byte in MAGIC {
        write_u8(w, byte)?;
    }
    write_u8(w, size_of::<i32>() as u8)?;
    write_u8(w, size_of::<u64>() as u8)?;
    write_u8(w, size_of::<f64>() as u8)?;
    write_f64(w, CANARY)?;
    Ok(())
}

pub fn read_header<R: Read>(r: &mut R) -> Result<()> {
    let mut magic = [0u8; 4];
    for slot in &mut magic {
        *slot = read_u8(r)?;
    }
    if magic != MAGIC {
        return Err(Error::stream_corruption("bad magic bytes"));
    }

    let int_width = read_u8(r)?;
    if int_width as usize != size_of::<i32>() {
        return Err(Error::unsupported(format!(
            "incompatible int width: {int_width}"
        )));
    }

    let size_width = read_u8(r)?;
    if size_width as usize != size_of::<u64>() {
        return Err(Error::unsupported(format!(
            "incompatible size width: {size_width}"
        )));
    }

    let float_width = read_u8(r)?;
    if float_width as usize != size_of::<f64>() {
        return Err(Error::unsupported(format!(
            "incompatible float width: {float_width}"
        )));
    }

    let canary = read_f64(r)?;
    if canary != CANARY {
        return Err(Error::unsupported(
            "incompatible floating-point representation (canary mismatch)",
        ));
    }

    Ok(())
}
