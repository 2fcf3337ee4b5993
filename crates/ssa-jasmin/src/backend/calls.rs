// Direct calls and variadic argument packing.

use crate::codec::TypeCodec;
use crate::ir::{FunctionType, Instruction, Type, Value, call_arguments};
use crate::{Error, Result};

use super::constants::emit_int;
use super::emitter::JasminEmitter;
use super::values::{emit_load, store_result};

/// Method descriptor of a call target. Variadic functions take one extra
/// int: the heap address of the packed extra arguments.
pub fn call_signature(codec: &dyn TypeCodec, ty: &FunctionType) -> Result<String> {
    let mut sig = String::from("(");
    for param in &ty.params {
        sig.push_str(&codec.descriptor(param)?);
    }
    if ty.variadic {
        sig.push('I');
    }
    sig.push(')');
    sig.push_str(&codec.descriptor(&ty.ret)?);
    Ok(sig)
}

/// Push the arguments of `instr` and invoke `callee`. The return value, if
/// any, is left on the stack.
pub fn lower_call(e: &mut JasminEmitter<'_>, callee: &Value, instr: &Instruction) -> Result<()> {
    let Value::Function { name, ty } = callee else {
        return Err(Error::UnsupportedConstruct("indirect call".to_string()));
    };
    let fn_ty = ty
        .as_function()
        .ok_or_else(|| Error::Internal(format!("callee {name} has non-function type {ty}")))?;

    let args = call_arguments(instr);
    let fixed = fn_ty.params.len();
    if args.len() < fixed {
        return Err(Error::Internal(format!(
            "call to {name} passes {} of {fixed} arguments",
            args.len()
        )));
    }
    for arg in &args[..fixed] {
        emit_load(e, arg)?;
    }
    if fn_ty.variadic {
        lower_variadic_tail(e, &args[fixed..])?;
    }

    let signature = call_signature(e.codec(), fn_ty)?;
    let target = e.ctx.qualify(name);
    e.insn_with("invokestatic", format!("{target}{signature}"));
    Ok(())
}

/// Pack the extra arguments of a variadic call into a fresh stack-frame
/// buffer, leaving its base address on the stack.
pub fn lower_variadic_tail(e: &mut JasminEmitter<'_>, extra: &[Value]) -> Result<()> {
    let codec = e.codec();
    let size: u64 = extra.iter().map(|v| codec.byte_size(v.ty())).sum();
    emit_int(e, size as i32);
    e.runtime_call("allocateStack(I)I");
    e.insn("dup");
    for value in extra {
        emit_load(e, value)?;
        let descriptor = codec.descriptor(value.ty())?;
        e.runtime_call(&format!("pack(I{descriptor})I"));
    }
    e.insn("pop");
    Ok(())
}

/// Store the call result, or drop a return value nothing uses.
pub(crate) fn finish_call(
    e: &mut JasminEmitter<'_>,
    callee: &Value,
    result: Option<&Value>,
) -> Result<()> {
    if result.is_some() {
        return store_result(e, result);
    }
    let ret = callee
        .ty()
        .as_function()
        .map_or(&Type::Void, |ty| &ty.ret);
    match ret.stack_words() {
        0 => {}
        1 => e.insn("pop"),
        _ => e.insn("pop2"),
    }
    Ok(())
}

pub fn lower_call_instruction(e: &mut JasminEmitter<'_>, instr: &Instruction) -> Result<()> {
    let callee = instr.operand(0)?;
    lower_call(e, callee, instr)?;
    finish_call(e, callee, instr.result.as_ref())
}
