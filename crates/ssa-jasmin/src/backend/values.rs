// Pushing values onto the operand stack and popping them into slots.

use crate::ir::{Instruction, Value};
use crate::jasm::Line;
use crate::{Error, Result};

use super::constants::{emit_constant, emit_constant_expr, emit_null};
use super::emitter::JasminEmitter;

/// Push `value` onto the operand stack.
pub fn emit_load(e: &mut JasminEmitter<'_>, value: &Value) -> Result<()> {
    match value {
        Value::Function { .. } => Err(Error::UnsupportedConstruct(
            "function pointer value".to_string(),
        )),
        Value::Global { name, ty } => {
            let descriptor = e.codec().descriptor(ty)?;
            let field = e.ctx.qualify(name);
            e.insn_with("getstatic", format!("{field} {descriptor}"));
            Ok(())
        }
        Value::Null { .. } => {
            emit_null(e);
            Ok(())
        }
        Value::ConstantExpr(ce) => emit_constant_expr(e, ce),
        Value::Constant(c) => emit_constant(e, c),
        Value::Local { .. } | Value::Argument { .. } => {
            let prefix = e.codec().load_store_prefix(value.ty())?;
            let slot = e.slot_for(value)?;
            let comment = e.value_comment(value);
            emit_slot_access(e, prefix, "load", slot, comment);
            Ok(())
        }
    }
}

/// Pop the top of the stack into the slot of `value`.
///
/// Only locals and arguments have storage; anything else is rejected before
/// any output is produced.
pub fn emit_store(e: &mut JasminEmitter<'_>, value: &Value) -> Result<()> {
    match value {
        Value::Local { .. } | Value::Argument { .. } => {
            let prefix = e.codec().load_store_prefix(value.ty())?;
            let slot = e.slot_for(value)?;
            let comment = e.value_comment(value);
            emit_slot_access(e, prefix, "store", slot, comment);
            Ok(())
        }
        Value::Global { .. }
        | Value::Function { .. }
        | Value::Constant(_)
        | Value::ConstantExpr(_)
        | Value::Null { .. } => Err(Error::InvalidStoreTarget(value.to_string())),
    }
}

/// `<prefix><kind>_N` for the four lowest slots, `<prefix><kind> N` otherwise.
pub(crate) fn emit_slot_access(
    e: &mut JasminEmitter<'_>,
    prefix: &str,
    kind: &str,
    slot: u32,
    comment: Option<String>,
) {
    let line = if slot <= 3 && e.options().compact_slot_forms {
        Line::insn(format!("{prefix}{kind}_{slot}"))
    } else {
        Line::insn_with(format!("{prefix}{kind}"), slot.to_string())
    };
    e.emit(line.with_comment(comment));
}

/// Store an instruction's result, if it has one.
pub(crate) fn store_result(e: &mut JasminEmitter<'_>, result: Option<&Value>) -> Result<()> {
    match result {
        Some(value) => emit_store(e, value),
        None => Ok(()),
    }
}

/// Result value of an instruction that must produce one.
pub(crate) fn result_value(instr: &Instruction) -> Result<&Value> {
    instr
        .result
        .as_ref()
        .ok_or_else(|| Error::Internal(format!("{} without a result", instr.opcode.name())))
}
