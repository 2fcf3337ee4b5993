//! Direct calls, call signatures, and variadic argument packing.

use ssa_jasmin::backend::call_signature;
use ssa_jasmin::ir::{Externals, FunctionBuilder, FunctionType, Type, Value};
use ssa_jasmin::test_harness::*;
use ssa_jasmin::{CompileOptions, Error, JvmTypeCodec};

fn foo() -> Value {
    Value::function("foo", FunctionType::new(vec![Type::i32(), Type::i32()], Type::i32()))
}

fn printf() -> Value {
    Value::function(
        "printf",
        FunctionType::new(vec![Type::ptr(Type::i8())], Type::i32()).variadic(),
    )
}

#[test]
fn call_signatures() {
    let codec = JvmTypeCodec;
    let sig = |params: Vec<Type>, ret: Type| {
        call_signature(&codec, &FunctionType::new(params, ret)).expect("signature")
    };
    assert_eq!(sig(vec![Type::i32(), Type::i32()], Type::i32()), "(II)I");
    assert_eq!(sig(vec![Type::i64(), Type::Double], Type::Void), "(JD)V");
    assert_eq!(sig(vec![Type::i1(), Type::i8(), Type::i16()], Type::Float), "(ZBS)F");
    assert_eq!(
        call_signature(
            &codec,
            &FunctionType::new(vec![Type::ptr(Type::i8())], Type::i32()).variadic()
        )
        .expect("signature"),
        "(II)I"
    );
}

#[test]
fn direct_call_pushes_arguments_in_order() {
    let mut b = FunctionBuilder::new("caller", Type::i32());
    let a = b.param("a", Type::i32());
    let c = b.param("c", Type::i32());
    b.block("entry");
    let r = b.call("r", &foo(), &[a, c]).expect("result");
    b.ret(Some(&r));

    let lowered = lower(&b.build()).expect("lower");
    assert_matches(
        &body_insns(&lowered.lines),
        &[
            "iload_0",
            "iload_1",
            "invokestatic Module/foo(II)I",
            "istore_2",
            "invokestatic lljvm/runtime/Memory/destroyStackFrame()V",
            "iload_2",
            "ireturn",
        ],
    );
}

#[test]
fn external_callee_is_not_qualified() {
    let mut b = FunctionBuilder::new("caller", Type::i32());
    b.block("entry");
    let r = b
        .call("r", &foo(), &[Value::i32(1), Value::i32(2)])
        .expect("result");
    b.ret(Some(&r));

    let externals: Externals = ["foo"].into_iter().collect();
    let lowered =
        lower_with(&b.build(), &CompileOptions::default(), externals).expect("lower");
    assert_has_sequence(
        &lowered.lines,
        &["iconst_1", "iconst_2", "invokestatic foo(II)I"],
    );
}

#[test]
fn variadic_call_packs_extra_arguments() {
    let mut b = FunctionBuilder::new("caller", Type::Void);
    let fmt = b.param("fmt", Type::ptr(Type::i8()));
    b.block("entry");
    b.call("n", &printf(), &[fmt, Value::i32(1), Value::i32(2)]);
    b.ret(None);

    let externals: Externals = ["printf"].into_iter().collect();
    let lowered =
        lower_with(&b.build(), &CompileOptions::default(), externals).expect("lower");
    assert_matches(
        &body_insns(&lowered.lines),
        &[
            "iload_0",
            "bipush 8",
            "invokestatic lljvm/runtime/Memory/allocateStack(I)I",
            "dup",
            "iconst_1",
            "invokestatic lljvm/runtime/Memory/pack(II)I",
            "iconst_2",
            "invokestatic lljvm/runtime/Memory/pack(II)I",
            "pop",
            "invokestatic printf(II)I",
            "istore_1",
            "invokestatic lljvm/runtime/Memory/destroyStackFrame()V",
            "return",
        ],
    );
}

#[test]
fn variadic_extras_are_sized_by_type() {
    let mut b = FunctionBuilder::new("caller", Type::Void);
    let fmt = b.param("fmt", Type::ptr(Type::i8()));
    b.block("entry");
    b.call(
        "",
        &printf(),
        &[fmt, Value::i64(7), Value::const_float(Type::Double, 0.5), Value::i32(3)],
    );
    b.ret(None);

    let lowered = lower(&b.build()).expect("lower");
    assert_eq!(
        count_insn(
            &lowered.lines,
            "invokestatic lljvm/runtime/Memory/allocateStack(I)I"
        ),
        1
    );
    assert_has_sequence(
        &lowered.lines,
        &[
            "bipush 20",
            "invokestatic lljvm/runtime/Memory/allocateStack(I)I",
            "dup",
            "ldc2_w 7",
            "invokestatic lljvm/runtime/Memory/pack(IJ)I",
            "ldc2_w 0.5",
            "invokestatic lljvm/runtime/Memory/pack(ID)I",
            "iconst_3",
            "invokestatic lljvm/runtime/Memory/pack(II)I",
            "pop",
        ],
    );
}

#[test]
fn variadic_call_without_extras_still_passes_a_list() {
    let mut b = FunctionBuilder::new("caller", Type::Void);
    let fmt = b.param("fmt", Type::ptr(Type::i8()));
    b.block("entry");
    b.call("", &printf(), &[fmt]);
    b.ret(None);

    let lowered = lower(&b.build()).expect("lower");
    assert_has_sequence(
        &lowered.lines,
        &[
            "iload_0",
            "iconst_0",
            "invokestatic lljvm/runtime/Memory/allocateStack(I)I",
            "dup",
            "pop",
            "invokestatic Module/printf(II)I",
        ],
    );
}

#[test]
fn unused_results_are_dropped() {
    let wide = Value::function("now", FunctionType::new(vec![], Type::i64()));
    let mut b = FunctionBuilder::new("caller", Type::Void);
    b.block("entry");
    b.ret(None);
    let mut f = b.build();
    // a call whose result the producer left out
    f.blocks[0].instructions.insert(
        0,
        ssa_jasmin::ir::Instruction::new(ssa_jasmin::ir::Opcode::Call, vec![wide], None),
    );

    let lowered = lower(&f).expect("lower");
    assert_has_sequence(&lowered.lines, &["invokestatic Module/now()J", "pop2"]);
}

#[test]
fn indirect_calls_are_unsupported() {
    let mut b = FunctionBuilder::new("caller", Type::Void);
    let fp = b.param("fp", Type::ptr(Type::i8()));
    b.block("entry");
    b.call("", &fp, &[]);
    b.ret(None);

    let err = lower(&b.build()).expect_err("indirect call");
    match err {
        Error::UnsupportedConstruct(what) => assert_eq!(what, "indirect call"),
        other => panic!("unexpected error {other:?}"),
    }
}
