//! The kind-tag space and framing-word encoding (§3.3).
//!
//! A framing word is either a small kind tag, the dedicated `PERMANENT`
//! tag, or (at or above `REF_OFFSET`) a reference id. `Upvalue` has a tag
//! here even though it is never reached from the top-level value
//! dispatcher (§4.7): it is still one of the kinds the keyed-persistence
//! path (§4.8) delegates to, alongside `Prototype`.

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum Kind {
    Nil = 0,
    Bool = 1,
    LightPtr = 2,
    Number = 3,
    Str = 4,
    Table = 5,
    UserData = 6,
    ClosureHost = 7,
    ClosureLua = 8,
    Prototype = 9,
    Upvalue = 10,
    Thread = 11,
}

/// Marks a value replaced by its permanent-key indirection (§3.3, §4.3).
pub const PERMANENT: i32 = 12;

/// Framing words at or above this are reference ids, not kind tags.
pub const REF_OFFSET: i32 = 13;

impl Kind {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for Kind {
    type Error = Error;

    fn try_from(v: i32) -> Result<Kind> {
        Ok(match v {
            0 => Kind::Nil,
            1 => Kind::Bool,
            2 => Kind::LightPtr,
            3 => Kind::Number,
            4 => Kind::Str,
            5 => Kind::Table,
            6 => Kind::UserData,
            7 => Kind::ClosureHost,
            8 => Kind::ClosureLua,
            9 => Kind::Prototype,
            10 => Kind::Upvalue,
            11 => Kind::Thread,
            other => {
                return Err(Error::unsupported(format!(
                    "unknown type id {other} in stream"
                )))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permanent_and_ref_offset_above_every_kind_tag() {
        for tag in [
            Kind::Nil,
            Kind::Bool,
            Kind::LightPtr,
            Kind::Number,
            Kind::Str,
            Kind::Table,
            Kind::UserData,
            Kind::ClosureHost,
            Kind::ClosureLua,
            Kind::Prototype,
            Kind::Upvalue,
            Kind::Thread,
        ] {
            assert!(tag.as_i32() < PERMANENT);
        }
        assert!(PERMANENT < REF_OFFSET);
    }

    #[test]
    fn unknown_tag_is_unsupported_error() {
        assert!(Kind::try_from(999).is_err());
    }
}
