//! Method skeleton: header, variable declarations, limits, entry sequence.

use ssa_jasmin::ir::{Externals, FunctionBuilder, Type, Value};
use ssa_jasmin::jasm::{Line, Visibility};
use ssa_jasmin::test_harness::*;
use ssa_jasmin::{CompileOptions, Error};

fn quiet() -> CompileOptions {
    CompileOptions {
        annotate_values: false,
        ..CompileOptions::default()
    }
}

#[test]
fn full_method_text() {
    let mut b = FunctionBuilder::new("identity", Type::i64());
    let x = b.param("x", Type::i64());
    b.block("entry");
    b.ret(Some(&x));

    let lowered = lower_with(&b.build(), &quiet(), Externals::default()).expect("lower");
    let expected = "
.method public static identity(J)J
\t.var 0 is x J from begin_method to end_method
\t.limit stack 16
\t.limit locals 2
begin_method:
\tinvokestatic lljvm/runtime/Memory/createStackFrame()V
label_entry:
\tinvokestatic lljvm/runtime/Memory/destroyStackFrame()V
\tlload_0
\tlreturn
end_method:
.end method
";
    assert_eq!(lowered.text(), expected);
    assert_eq!(lowered.max_locals, 2);
    assert_eq!(lowered.max_stack, 16);
}

#[test]
fn internal_functions_are_private() {
    let mut b = FunctionBuilder::new("helper", Type::Void).internal();
    b.block("entry");
    b.ret(None);

    let lowered = lower(&b.build()).expect("lower");
    assert_eq!(
        lowered.lines[0],
        Line::MethodBegin {
            visibility: Visibility::Private,
            name: "helper".into(),
            signature: "()V".into(),
        }
    );
}

#[test]
fn variadic_header_takes_the_list_pointer() {
    let mut b = FunctionBuilder::new("log.msg", Type::Void).variadic();
    b.param("level", Type::i32());
    b.block("entry");
    b.ret(None);

    let lowered = lower(&b.build()).expect("lower");
    assert_eq!(
        lowered.lines[0].to_string(),
        ".method public static log_msg(II)V"
    );
    assert_eq!(
        var_decls(&lowered.lines),
        vec![
            (0, "level".to_string(), "I".to_string()),
            (1, "varargptr".to_string(), "I".to_string()),
        ]
    );
}

#[test]
fn stack_allocations_are_cleared_before_the_frame_is_created() {
    let mut b = FunctionBuilder::new("locals", Type::i32());
    b.block("entry");
    let slot = b.alloca("slot", Type::i32());
    b.alloca("buf", Type::array(Type::i8(), 16));
    b.store(&Value::i32(7), &slot);
    let v = b.load("v", &slot);
    b.ret(Some(&v));

    let lowered = lower(&b.build()).expect("lower");
    let all = insns(&lowered.lines);
    assert_eq!(
        &all[..5],
        &[
            "iconst_0",
            "istore_0",
            "iconst_0",
            "istore_1",
            "invokestatic lljvm/runtime/Memory/createStackFrame()V",
        ]
    );
    assert_matches(
        &body_insns(&lowered.lines),
        &[
            "iconst_4",
            "invokestatic lljvm/runtime/Memory/allocateStack(I)I",
            "istore_0",
            "bipush 16",
            "invokestatic lljvm/runtime/Memory/allocateStack(I)I",
            "istore_1",
            "iload_0",
            "bipush 7",
            "invokestatic lljvm/runtime/Memory/store(II)V",
            "iload_0",
            "invokestatic lljvm/runtime/Memory/load_i32(I)I",
            "istore_2",
            "invokestatic lljvm/runtime/Memory/destroyStackFrame()V",
            "iload_2",
            "ireturn",
        ],
    );
    // allocas are pointers into the heap
    assert_eq!(
        var_decls(&lowered.lines)[..2],
        [
            (0, "slot".to_string(), "I".to_string()),
            (1, "buf".to_string(), "I".to_string()),
        ]
    );
}

#[test]
fn element_addresses_scale_dynamic_indices() {
    let mut b = FunctionBuilder::new("index", Type::i32());
    let base = b.param("base", Type::ptr(Type::i32()));
    let i = b.param("i", Type::i64());
    b.block("entry");
    let elem = b.gep("elem", Type::i32(), &base, &[i], Type::ptr(Type::i32()));
    let v = b.load("v", &elem);
    b.ret(Some(&v));

    let lowered = lower(&b.build()).expect("lower");
    assert_has_sequence(
        &lowered.lines,
        &[
            "iload_0",
            "lload_1",
            "l2i",
            "iconst_4",
            "imul",
            "iadd",
            "istore_3",
            "iload_3",
            "invokestatic lljvm/runtime/Memory/load_i32(I)I",
        ],
    );
}

#[test]
fn negative_constant_indices_fold_into_one_offset() {
    let mut b = FunctionBuilder::new("back", Type::ptr(Type::i32()));
    let base = b.param("base", Type::ptr(Type::i32()));
    b.block("entry");
    let prev = b.gep("prev", Type::i32(), &base, &[Value::i64(-3)], Type::ptr(Type::i32()));
    b.ret(Some(&prev));

    let lowered = lower_with(&b.build(), &quiet(), Externals::default()).expect("lower");
    assert_has_sequence(&lowered.lines, &["iload_0", "bipush -12", "iadd", "istore_1"]);
}

#[test]
fn constant_offsets_outside_the_heap_are_rejected() {
    let mut b = FunctionBuilder::new("far", Type::ptr(Type::i32()));
    let base = b.param("base", Type::ptr(Type::i32()));
    b.block("entry");
    let far = b.gep("far", Type::i32(), &base, &[Value::i64(1 << 62)], Type::ptr(Type::i32()));
    b.ret(Some(&far));
    assert!(matches!(
        lower(&b.build()).expect_err("overflowing index"),
        Error::UnsupportedConstruct(_)
    ));

    let mut b = FunctionBuilder::new("huge", Type::Void);
    b.block("entry");
    b.push(
        ssa_jasmin::ir::Opcode::Alloca {
            allocated: Type::i64(),
        },
        vec![Value::i64(1 << 40)],
        "huge",
        &Type::ptr(Type::i64()),
    );
    b.ret(None);
    assert!(matches!(
        lower(&b.build()).expect_err("overflowing allocation"),
        Error::UnsupportedConstruct(_)
    ));
}

#[test]
fn unknown_opcodes_are_unsupported() {
    let mut b = FunctionBuilder::new("f", Type::Void);
    b.block("entry");
    b.push(
        ssa_jasmin::ir::Opcode::Other {
            name: "fence".into(),
        },
        Vec::new(),
        "",
        &Type::Void,
    );
    b.ret(None);

    match lower(&b.build()).expect_err("fence") {
        Error::UnsupportedConstruct(what) => assert_eq!(what, "opcode fence"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn declarations_cannot_be_lowered() {
    let decl = FunctionBuilder::new("extern_fn", Type::Void).build();
    assert!(matches!(lower(&decl), Err(Error::Internal(_))));
}
