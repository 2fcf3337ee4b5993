//! Module-level driver: error policies, declarations, JSON input.

use ssa_jasmin::ir::{
    Function, FunctionBuilder, FunctionType, GlobalDecl, Module, Opcode, Type, Value,
};
use ssa_jasmin::{CompileOptions, Error, ErrorPolicy, compile_module};

fn good(name: &str) -> Function {
    let mut b = FunctionBuilder::new(name, Type::i32());
    let x = b.param("x", Type::i32());
    b.block("entry");
    let r = b
        .call(
            "r",
            &Value::function("puts", FunctionType::new(vec![Type::i32()], Type::i32())),
            &[x],
        )
        .expect("result");
    b.ret(Some(&r));
    b.build()
}

fn bad(name: &str) -> Function {
    let mut b = FunctionBuilder::new(name, Type::Void);
    b.block("entry");
    b.push(
        Opcode::Other {
            name: "atomicrmw".into(),
        },
        Vec::new(),
        "",
        &Type::Void,
    );
    b.ret(None);
    b.build()
}

fn sample_module() -> Module {
    Module {
        functions: vec![
            good("first"),
            bad("broken"),
            FunctionBuilder::new("puts", Type::i32()).build(),
            good("last"),
        ],
        globals: vec![GlobalDecl {
            name: "stdout".into(),
            ty: Type::ptr(Type::i8()),
            external: true,
        }],
    }
}

#[test]
fn abort_policy_stops_at_the_first_failure() {
    let err = compile_module(&sample_module(), &CompileOptions::default()).expect_err("abort");
    match &err {
        Error::Function { name, .. } => assert_eq!(name, "broken"),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(matches!(err.root(), Error::UnsupportedConstruct(_)));
    assert_eq!(
        err.to_string(),
        "in function `broken`: Unsupported construct: opcode atomicrmw"
    );
}

#[test]
fn collect_policy_keeps_going() {
    let options = CompileOptions {
        error_policy: ErrorPolicy::Collect,
        ..CompileOptions::default()
    };
    let output = compile_module(&sample_module(), &options).expect("collect");
    let names: Vec<&str> = output.functions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["first", "last"]);
    assert_eq!(output.failures.len(), 1);

    // declarations are external: calls to them are not qualified
    let text = output.text();
    assert!(text.contains("\tinvokestatic puts(I)I\n"), "{text}");
    assert!(text.contains(".method public static first(I)I\n"));
    assert!(text.contains(".method public static last(I)I\n"));
    assert!(!text.contains("static puts"));
}

#[test]
fn modules_round_trip_through_json() {
    let module = sample_module();
    let json = serde_json::to_string_pretty(&module).expect("serialize");
    let parsed: Module = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(parsed, module);

    let options = CompileOptions {
        error_policy: ErrorPolicy::Collect,
        ..CompileOptions::default()
    };
    let a = compile_module(&module, &options).expect("compile");
    let b = compile_module(&parsed, &options).expect("compile");
    assert_eq!(a.text(), b.text());
}

#[test]
fn hand_written_json_is_accepted() {
    let json = r#"{
        "functions": [{
            "name": "answer",
            "params": [],
            "ret": { "kind": "int", "bits": 32 },
            "blocks": [{
                "id": 0,
                "name": "entry",
                "instructions": [{
                    "opcode": "ret",
                    "operands": [{
                        "kind": "constant",
                        "ty": { "kind": "int", "bits": 32 },
                        "value": { "int": 42 }
                    }]
                }]
            }]
        }]
    }"#;
    let module: Module = serde_json::from_str(json).expect("parse");
    let output = compile_module(&module, &CompileOptions::default()).expect("compile");
    assert!(output.text().contains("\tbipush 42\n\tireturn\n"));
}
