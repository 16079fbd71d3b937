//! Function prototypes (§4.6): the compiled, shareable body of an
//! interpreted closure. Not a first-class [`super::value::Value`] — only
//! reachable through a closure's `proto` field or another prototype's
//! `protos` list — hence the surrogate-pointer identity used by reftbl/perms.

use std::rc::Rc;

use super::value::Value;

pub type PrototypeRef = Rc<Prototype>;

/// One entry of a prototype's upvalue descriptor vector: where the
/// enclosing closure finds the value to capture when this prototype is
/// instantiated — a slot on the *defining* function's stack, or one of the
/// defining function's own upvalues.
#[derive(Clone, Debug)]
pub struct UpvalDesc {
    /// `true`: capture from the enclosing function's stack (`index` is a
    /// stack slot). `false`: capture from the enclosing function's own
    /// upvalue list (`index` is an upvalue slot).
    pub in_stack: bool,
    pub index: u8,
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LocalVar {
    pub name: String,
    pub start_pc: u32,
    pub end_pc: u32,
}

#[derive(Clone, Debug, Default)]
pub struct DebugInfo {
    pub source: Option<String>,
    pub lines: Vec<i32>,
    pub locals: Vec<LocalVar>,
}

#[derive(Debug)]
pub struct Prototype {
    pub line_defined: i32,
    pub last_line_defined: i32,
    pub num_params: u8,
    pub is_vararg: bool,
    pub max_stack_size: u8,
    pub code: Vec<u32>,
    pub constants: Vec<Value>,
    pub protos: Vec<PrototypeRef>,
    pub upvalues: Vec<UpvalDesc>,
    pub debug: Option<DebugInfo>,
}

impl Clone for Prototype {
    fn clone(&self) -> Self {
        Prototype {
            line_defined: self.line_defined,
            last_line_defined: self.last_line_defined,
            num_params: self.num_params,
            is_vararg: self.is_vararg,
            max_stack_size: self.max_stack_size,
            code: self.code.clone(),
            constants: self.constants.clone(),
            protos: self.protos.clone(),
            upvalues: self.upvalues.clone(),
            debug: self.debug.clone(),
        }
    }
}

impl Prototype {
    pub fn surrogate(this: &PrototypeRef) -> u64 {
        Rc::as_ptr(this) as usize as u64
    }
}
