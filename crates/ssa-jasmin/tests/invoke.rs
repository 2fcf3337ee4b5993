//! `invoke` lowering: protected region, normal and unwind dispatch.

use ssa_jasmin::ir::{Externals, FunctionBuilder, FunctionType, Type, Value};
use ssa_jasmin::jasm::Line;
use ssa_jasmin::test_harness::*;
use ssa_jasmin::{CompileOptions, RuntimeConfig};

fn quiet() -> CompileOptions {
    CompileOptions {
        annotate_values: false,
        ..CompileOptions::default()
    }
}

fn may_throw() -> Value {
    Value::function("may_throw", FunctionType::new(vec![Type::i32()], Type::i32()))
}

fn single_invoke() -> ssa_jasmin::ir::Function {
    let mut b = FunctionBuilder::new("guarded", Type::i32());
    let a = b.param("a", Type::i32());
    let entry = b.block("entry");
    let normal = b.block("normal");
    let unwind = b.block("unwind");

    b.position_at(entry);
    let r = b
        .invoke("r", &may_throw(), &[a], normal, unwind)
        .expect("result");
    b.position_at(normal);
    b.ret(Some(&r));
    b.position_at(unwind);
    b.ret(Some(&Value::i32(-1)));
    b.build()
}

#[test]
fn invoke_brackets_the_call_with_one_handler() {
    let lowered = lower_with(&single_invoke(), &quiet(), Externals::default()).expect("lower");
    let text = lowered.text();
    let expected = "\
label_entry:
invoke0_begin:
\tiload_0
\tinvokestatic Module/may_throw(I)I
\tistore_1
invoke0_end:
\tgoto label_normal
invoke0_catch:
\tpop
\tgoto label_unwind
\t.catch lljvm/runtime/System$Unwind from invoke0_begin to invoke0_end using invoke0_catch
label_normal:
";
    assert!(text.contains(expected), "{text}");
    assert_eq!(catch_lines(&lowered.lines).len(), 1);
}

#[test]
fn unwind_class_is_configurable() {
    let options = CompileOptions {
        runtime: RuntimeConfig {
            unwind_class: "my/rt/Unwind".to_string(),
            ..RuntimeConfig::default()
        },
        ..quiet()
    };
    let lowered = lower_with(&single_invoke(), &options, Externals::default()).expect("lower");
    let catches = catch_lines(&lowered.lines);
    assert_eq!(catches.len(), 1);
    match catches[0] {
        Line::Catch { class, .. } => assert_eq!(class, "my/rt/Unwind"),
        other => panic!("not a catch line: {other}"),
    }
}

#[test]
fn each_invoke_gets_its_own_region() {
    let mut b = FunctionBuilder::new("twice", Type::i32());
    let a = b.param("a", Type::i32());
    let entry = b.block("entry");
    let middle = b.block("middle");
    let done = b.block("done");
    let unwind = b.block("unwind");

    b.position_at(entry);
    let first = b
        .invoke("first", &may_throw(), &[a], middle, unwind)
        .expect("result");
    b.position_at(middle);
    let second = b
        .invoke("second", &may_throw(), &[first], done, unwind)
        .expect("result");
    b.position_at(done);
    b.ret(Some(&second));
    b.position_at(unwind);
    b.unreachable();

    let lowered = lower(&b.build()).expect("lower");
    let regions: Vec<(String, String, String)> = catch_lines(&lowered.lines)
        .into_iter()
        .filter_map(|l| match l {
            Line::Catch { from, to, using, .. } => {
                Some((from.clone(), to.clone(), using.clone()))
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        regions,
        vec![
            (
                "invoke0_begin".to_string(),
                "invoke0_end".to_string(),
                "invoke0_catch".to_string()
            ),
            (
                "invoke1_begin".to_string(),
                "invoke1_end".to_string(),
                "invoke1_catch".to_string()
            ),
        ]
    );
    assert_eq!(count_insn(&lowered.lines, "invokestatic Module/may_throw(I)I"), 2);
}

#[test]
fn void_invoke_stores_nothing() {
    let callee = Value::function("poke", FunctionType::new(vec![], Type::Void));
    let mut b = FunctionBuilder::new("f", Type::Void);
    let entry = b.block("entry");
    let normal = b.block("normal");
    let unwind = b.block("unwind");
    b.position_at(entry);
    b.invoke("", &callee, &[], normal, unwind);
    b.position_at(normal);
    b.ret(None);
    b.position_at(unwind);
    b.ret(None);

    let lowered = lower(&b.build()).expect("lower");
    assert_has_sequence(
        &lowered.lines,
        &[
            "invokestatic Module/poke()V",
            "goto label_normal",
            "pop",
            "goto label_unwind",
        ],
    );
}
