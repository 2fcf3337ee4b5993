//! Test harness for ssa-jasmin unit and integration tests
//!
//! Builds functions through [`FunctionBuilder`](crate::ir::FunctionBuilder),
//! lowers them, and matches the emitted instruction text against patterns.
//!
//! # Example
//!
//! ```rust
//! use ssa_jasmin::ir::{BinaryOp, FunctionBuilder, Type};
//! use ssa_jasmin::test_harness::*;
//!
//! let mut b = FunctionBuilder::new("add", Type::i32());
//! let x = b.param("x", Type::i32());
//! let y = b.param("y", Type::i32());
//! b.block("entry");
//! let sum = b.binary(BinaryOp::Add, "sum", &x, &y);
//! b.ret(Some(&sum));
//!
//! let lowered = lower(&b.build()).expect("lower");
//! assert_has_sequence(&lowered.lines, &["iload_0", "iload_1", "iadd", "istore_2"]);
//! ```

#![allow(
    clippy::must_use_candidate,
    clippy::manual_assert,
    clippy::missing_panics_doc,
    clippy::uninlined_format_args
)]

use crate::backend::{JasminEmitter, LoweredFunction, LoweringContext, lower_function};
use crate::ir::{Externals, Function};
use crate::jasm::Line;
use crate::options::CompileOptions;
use crate::Result;

/// Lower `function` with default options and no external symbols.
pub fn lower(function: &Function) -> Result<LoweredFunction> {
    lower_with(function, &CompileOptions::default(), Externals::default())
}

/// Lower `function` with explicit options and externals.
pub fn lower_with(
    function: &Function,
    options: &CompileOptions,
    externals: Externals,
) -> Result<LoweredFunction> {
    let ctx = LoweringContext::new(options, externals);
    lower_function(&ctx, function)
}

/// Run `f` against a fresh emitter for `function` and return what it
/// produced alongside the emitted lines.
pub fn with_emitter<R>(
    function: &Function,
    externals: Externals,
    f: impl FnOnce(&mut JasminEmitter<'_>) -> R,
) -> (R, Vec<Line>) {
    let options = CompileOptions::default();
    let ctx = LoweringContext::new(&options, externals);
    let mut emitter = JasminEmitter::new(&ctx, function);
    let result = f(&mut emitter);
    (result, emitter.lines().to_vec())
}

/// `op operand` text of every instruction line, comments stripped.
pub fn insns(lines: &[Line]) -> Vec<String> {
    lines.iter().filter_map(Line::insn_text).collect()
}

/// Instructions after the `createStackFrame` call, i.e. the lowered body.
pub fn body_insns(lines: &[Line]) -> Vec<String> {
    let all = insns(lines);
    match all.iter().position(|i| i.ends_with("/createStackFrame()V")) {
        Some(pos) => all[pos + 1..].to_vec(),
        None => all,
    }
}

/// Number of instructions whose text is exactly `text`.
pub fn count_insn(lines: &[Line], text: &str) -> usize {
    insns(lines).iter().filter(|i| *i == text).count()
}

/// Pattern for one instruction.
#[derive(Debug, Clone, Copy)]
pub enum Pat<'a> {
    /// Match any instruction
    Any,
    /// Match the full `op operand` text
    Exact(&'a str),
    /// Match the beginning of the text
    Prefix(&'a str),
}

impl Pat<'_> {
    pub fn matches(&self, insn: &str) -> bool {
        match self {
            Pat::Any => true,
            Pat::Exact(text) => insn == *text,
            Pat::Prefix(prefix) => insn.starts_with(prefix),
        }
    }
}

impl<'a> From<&'a str> for Pat<'a> {
    /// `"*"` is a wildcard, a trailing `*` makes a prefix pattern.
    fn from(text: &'a str) -> Self {
        if text == "*" {
            Pat::Any
        } else if let Some(prefix) = text.strip_suffix('*') {
            Pat::Prefix(prefix)
        } else {
            Pat::Exact(text)
        }
    }
}

/// Index of the first contiguous run of instructions matching `pattern`.
pub fn find_sequence(insns: &[String], pattern: &[&str]) -> Option<usize> {
    let pats: Vec<Pat<'_>> = pattern.iter().map(|p| Pat::from(*p)).collect();
    if pats.is_empty() {
        return Some(0);
    }
    insns
        .windows(pats.len())
        .position(|w| w.iter().zip(&pats).all(|(i, p)| p.matches(i)))
}

/// Assert that the instructions of `lines` contain `pattern` contiguously.
pub fn assert_has_sequence(lines: &[Line], pattern: &[&str]) {
    let all = insns(lines);
    if find_sequence(&all, pattern).is_none() {
        panic!(
            "Pattern not found in instruction sequence.\n\nExpected pattern:\n{}\n\nActual instructions:\n{}",
            pattern.join("\n"),
            all.join("\n")
        );
    }
}

/// Assert that `actual` matches `pattern` exactly, element by element.
pub fn assert_matches(actual: &[String], pattern: &[&str]) {
    if actual.len() != pattern.len() {
        panic!(
            "Instruction count mismatch: expected {}, got {}.\n\nExpected pattern:\n{}\n\nActual instructions:\n{}",
            pattern.len(),
            actual.len(),
            pattern.join("\n"),
            actual.join("\n")
        );
    }
    for (i, (insn, pat)) in actual.iter().zip(pattern).enumerate() {
        if !Pat::from(*pat).matches(insn) {
            panic!(
                "Instruction mismatch at index {}:\nExpected: {}\nActual:   {}\n\nFull instructions:\n{}",
                i,
                pat,
                insn,
                actual.join("\n")
            );
        }
    }
}

/// The `.catch` directives of a method.
pub fn catch_lines(lines: &[Line]) -> Vec<&Line> {
    lines.iter().filter(|l| matches!(l, Line::Catch { .. })).collect()
}

/// `(slot, name, descriptor)` of every `.var` directive.
pub fn var_decls(lines: &[Line]) -> Vec<(u32, String, String)> {
    lines
        .iter()
        .filter_map(|l| match l {
            Line::Var {
                slot,
                name,
                descriptor,
                ..
            } => Some((*slot, name.clone(), descriptor.clone())),
            _ => None,
        })
        .collect()
}
