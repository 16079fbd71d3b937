use std::cell::RefCell;
use std::rc::Rc;

use persist_core::{
    persist, structural_eq, unpersist, CallInfo, CallStatus, Closure, Config, FrameKind, HostFn,
    PermKey, Prototype, ReadPerms, Table, Thread, ThreadStatus, Upvalue, UserData, Value,
    WritePerms,
};

fn cfg() -> Config {
    Config::default()
}

#[test]
fn string_round_trips() {
    let v = Value::str("hello, world");
    let bytes = persist(&WritePerms::new(), &cfg(), &v).unwrap();
    let back = unpersist(&ReadPerms::new(), &cfg(), &bytes).unwrap();
    assert!(structural_eq(&v, &back));
}

#[test]
fn cyclic_table_round_trips() {
    let t = Rc::new(RefCell::new(Table::new()));
    t.borrow_mut().set(Value::str("self"), Value::Table(t.clone()));
    t.borrow_mut().set(Value::str("n"), Value::Number(7.0));

    let bytes = persist(&WritePerms::new(), &cfg(), &Value::Table(t)).unwrap();
    let back = unpersist(&ReadPerms::new(), &cfg(), &bytes).unwrap();

    let Value::Table(t2) = back else { panic!("expected table") };
    assert!(matches!(t2.borrow().get(&Value::str("n")), Value::Number(n) if n == 7.0));
    let inner = t2.borrow().get(&Value::str("self"));
    let Value::Table(back_ref) = inner else { panic!("expected self-reference") };
    assert!(Rc::ptr_eq(&back_ref, &t2));
}

#[test]
fn special_persisted_table_reconstructs_via_hook_not_literal_shape() {
    let mt = Rc::new(RefCell::new(Table::new()));
    let hook = Closure::Host {
        func: HostFn::new("__persist", |args| {
            let Some(Value::Table(orig)) = args.first() else {
                return vec![];
            };
            let tag = orig.borrow().get(&Value::str("tag"));
            let rebuild = Closure::Host {
                func: HostFn::new("__rebuild", move |_| {
                    let t = Rc::new(RefCell::new(Table::new()));
                    t.borrow_mut().set(Value::str("tag"), tag.clone());
                    t.borrow_mut().set(Value::str("rebuilt"), Value::Bool(true));
                    vec![Value::Table(t)]
                }),
                upvalues: vec![],
            };
            vec![Value::Closure(Rc::new(rebuild))]
        }),
        upvalues: vec![],
    };
    mt.borrow_mut().set(Value::str("__persist"), Value::Closure(Rc::new(hook)));

    let t = Rc::new(RefCell::new(Table::new()));
    t.borrow_mut().set(Value::str("tag"), Value::str("original"));
    t.borrow_mut().metatable = Some(mt);

    let bytes = persist(&WritePerms::new(), &cfg(), &Value::Table(t)).unwrap();
    let back = unpersist(&ReadPerms::new(), &cfg(), &bytes).unwrap();

    let Value::Table(t2) = back else { panic!("expected table") };
    assert!(matches!(t2.borrow().get(&Value::str("rebuilt")), Value::Bool(true)));
    assert!(matches!(t2.borrow().get(&Value::str("tag")), Value::Str(s) if &*s == b"original"));
    // The reconstruction hook never set a metatable on the rebuilt table.
    assert!(t2.borrow().metatable.is_none());
}

fn trivial_proto() -> Rc<Prototype> {
    Rc::new(Prototype {
        line_defined: 0,
        last_line_defined: 0,
        num_params: 0,
        is_vararg: false,
        max_stack_size: 1,
        code: vec![],
        constants: vec![],
        protos: vec![],
        upvalues: vec![],
        debug: None,
    })
}

#[test]
fn two_closures_sharing_an_upvalue_keep_counter_semantics_after_round_trip() {
    let counter = Upvalue::closed(Value::Number(0.0));
    let incrementer = Rc::new(Closure::Lua {
        proto: trivial_proto(),
        upvalues: vec![RefCell::new(counter.clone())],
    });
    let reader = Rc::new(Closure::Lua {
        proto: trivial_proto(),
        upvalues: vec![RefCell::new(counter)],
    });

    let holder = Rc::new(RefCell::new(Table::new()));
    holder.borrow_mut().set(Value::str("inc"), Value::Closure(incrementer));
    holder.borrow_mut().set(Value::str("get"), Value::Closure(reader));

    let bytes = persist(&WritePerms::new(), &cfg(), &Value::Table(holder)).unwrap();
    let back = unpersist(&ReadPerms::new(), &cfg(), &bytes).unwrap();

    let Value::Table(t2) = back else { panic!("expected table") };
    let Value::Closure(inc2) = t2.borrow().get(&Value::str("inc")) else {
        panic!("expected closure")
    };
    let Value::Closure(get2) = t2.borrow().get(&Value::str("get")) else {
        panic!("expected closure")
    };

    let Closure::Lua { upvalues: inc_up, .. } = inc2.as_ref() else {
        panic!("expected lua closure")
    };
    let Closure::Lua { upvalues: get_up, .. } = get2.as_ref() else {
        panic!("expected lua closure")
    };

    // Mutating through one closure's upvalue is observable through the
    // other: they still share the same underlying `Upvalue`.
    inc_up[0].borrow().set_closed(Value::Number(41.0));
    assert!(matches!(get_up[0].borrow().get(), Value::Number(n) if n == 41.0));
}

#[test]
fn native_function_round_trips_through_permanents_table() {
    let native = Rc::new(Closure::Host {
        func: HostFn::new("print", |args| args.to_vec()),
        upvalues: vec![],
    });
    let value = Value::Closure(native.clone());

    let mut write_perms = WritePerms::new();
    write_perms.register(value.identity().unwrap(), PermKey::str("print"));
    let bytes = persist(&write_perms, &cfg(), &value).unwrap();

    let mut read_perms = ReadPerms::new();
    read_perms.register(PermKey::str("print"), value.clone());
    let back = unpersist(&read_perms, &cfg(), &bytes).unwrap();

    let Value::Closure(c2) = back else { panic!("expected closure") };
    assert!(Rc::ptr_eq(&c2, &native));
}

#[test]
fn native_function_without_permanent_key_is_rejected() {
    let native = Rc::new(Closure::Host {
        func: HostFn::new("orphan", |_| vec![]),
        upvalues: vec![],
    });
    let result = persist(&WritePerms::new(), &cfg(), &Value::Closure(native));
    assert!(result.is_err());
}

#[test]
fn suspended_coroutine_round_trips_with_yielded_continuation_via_permanents() {
    let cont_fn = Rc::new(Closure::Host {
        func: HostFn::new("resume_cont", |_| vec![Value::str("resumed")]),
        upvalues: vec![],
    });
    let cont_value = Value::Closure(cont_fn.clone());

    let thread = Rc::new(RefCell::new(Thread::new()));
    thread.borrow_mut().status = ThreadStatus::Suspended;
    thread.borrow_mut().stack.push(Value::Number(1.0));
    thread.borrow_mut().call_infos.push(CallInfo {
        func_index: 0,
        top: 1,
        nresults: 1,
        status: CallStatus::YIELDABLE_PCALL,
        extra: 42,
        kind: FrameKind::Host {
            continuation: Some((7, cont_value.clone())),
        },
    });

    let mut write_perms = WritePerms::new();
    write_perms.register(cont_value.identity().unwrap(), PermKey::str("resume_cont"));
    let bytes = persist(&write_perms, &cfg(), &Value::Thread(thread)).unwrap();

    let mut read_perms = ReadPerms::new();
    read_perms.register(PermKey::str("resume_cont"), cont_value);
    let back = unpersist(&read_perms, &cfg(), &bytes).unwrap();

    let Value::Thread(t2) = back else { panic!("expected thread") };
    let t2 = t2.borrow();
    assert_eq!(t2.status, ThreadStatus::Suspended);
    assert_eq!(t2.call_infos.len(), 1);
    match &t2.call_infos[0].kind {
        FrameKind::Host { continuation: Some((ctx, func)) } => {
            assert_eq!(*ctx, 7);
            if let Value::Closure(c) = func {
                assert!(Rc::ptr_eq(c, &cont_fn));
            } else {
                panic!("expected closure continuation");
            }
        }
        other => panic!("expected host frame with continuation, got {other:?}"),
    }
}

#[test]
fn running_thread_cannot_be_persisted() {
    let thread = Rc::new(RefCell::new(Thread::new()));
    thread.borrow_mut().status = ThreadStatus::Running;
    let result = persist(&WritePerms::new(), &cfg(), &Value::Thread(thread));
    assert!(result.is_err());
}

#[test]
fn literal_userdata_cannot_be_persisted() {
    let ud = Rc::new(RefCell::new(UserData::new(vec![1, 2, 3])));
    let result = persist(&WritePerms::new(), &cfg(), &Value::UserData(ud));
    assert!(result.is_err());
}

#[test]
fn persist_true_opts_userdata_into_literal_persistence() {
    let ud = Rc::new(RefCell::new(UserData::new(vec![4, 5, 6])));
    let meta = Rc::new(RefCell::new(Table::new()));
    meta.borrow_mut().set(Value::str("__persist"), Value::Bool(true));
    ud.borrow_mut().metatable = Some(meta);

    let bytes = persist(&WritePerms::new(), &cfg(), &Value::UserData(ud)).unwrap();
    let back = unpersist(&ReadPerms::new(), &cfg(), &bytes).unwrap();
    let Value::UserData(u2) = back else { panic!("expected userdata") };
    assert_eq!(u2.borrow().payload, vec![4, 5, 6]);
}

#[test]
fn custom_persist_key_is_honored_end_to_end() {
    let t = Rc::new(RefCell::new(Table::new()));
    t.borrow_mut().set(Value::str("__save"), Value::Bool(false));
    let mut marked = Table::new();
    marked.metatable = Some(t);
    let marked = Rc::new(RefCell::new(marked));

    let custom_cfg = Config::new().with_persist_key("__save");
    let result = persist(&WritePerms::new(), &custom_cfg, &Value::Table(marked.clone()));
    assert!(result.is_err());

    // The default key doesn't see the custom field, so it's treated as an
    // ordinary (literal) metatable and round-trips instead of erroring.
    let result = persist(&WritePerms::new(), &cfg(), &Value::Table(marked));
    assert!(result.is_ok());
}
