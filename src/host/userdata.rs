//! The userdata kind (§4.5): a raw, user-controlled payload plus an
//! optional metatable. Unlike tables, literal (non-`__persist`) userdata is
//! forbidden by default — the source engine has no way to know how to
//! reconstruct an opaque blob without the owner's cooperation.

use std::cell::RefCell;
use std::rc::Rc;

use super::table::TableRef;

pub type UserDataRef = Rc<RefCell<UserData>>;

#[derive(Default)]
pub struct UserData {
    pub payload: Vec<u8>,
    pub metatable: Option<TableRef>,
}

impl UserData {
    pub fn new(payload: Vec<u8>) -> Self {
        UserData {
            payload,
            metatable: None,
        }
    }
}
