// Memory operations through the runtime heap.
//
// Pointers are int addresses into the heap managed by the runtime memory
// class. Dereferencing calls its typed `load_*`/`store` accessors; stack
// allocations come from `allocateStack`.

use crate::ir::{ConstantValue, Instruction, Type, Value};
use crate::{Error, Result};

use super::constants::{emit_int, normalize_int};
use super::emitter::JasminEmitter;
use super::values::{emit_load, emit_store, result_value, store_result};

fn pointee_of(ptr: &Value) -> Result<&Type> {
    ptr.ty()
        .pointee()
        .ok_or_else(|| Error::Internal(format!("dereference of non-pointer value {ptr}")))
}

/// Push the value `ptr` points to.
pub fn emit_indirect_load(e: &mut JasminEmitter<'_>, ptr: &Value) -> Result<()> {
    emit_load(e, ptr)?;
    emit_indirect_load_type(e, pointee_of(ptr)?)
}

/// Replace the address on top of the stack with the `ty` stored there.
pub fn emit_indirect_load_type(e: &mut JasminEmitter<'_>, ty: &Type) -> Result<()> {
    let postfix = e.codec().postfix(ty)?;
    let descriptor = e.codec().descriptor(ty)?;
    e.runtime_call(&format!("load_{postfix}(I){descriptor}"));
    Ok(())
}

/// Write `value` to the heap address `ptr`.
pub fn emit_indirect_store(e: &mut JasminEmitter<'_>, ptr: &Value, value: &Value) -> Result<()> {
    emit_load(e, ptr)?;
    emit_load(e, value)?;
    emit_indirect_store_type(e, value.ty())
}

/// Consume an address and a `ty` value (on top) and write it to the heap.
pub fn emit_indirect_store_type(e: &mut JasminEmitter<'_>, ty: &Type) -> Result<()> {
    let descriptor = e.codec().descriptor(ty)?;
    e.runtime_call(&format!("store(I{descriptor})V"));
    Ok(())
}

pub fn lower_load(e: &mut JasminEmitter<'_>, instr: &Instruction) -> Result<()> {
    let result = result_value(instr)?;
    emit_indirect_load(e, instr.operand(0)?)?;
    store_result(e, Some(result))
}

pub fn lower_store(e: &mut JasminEmitter<'_>, instr: &Instruction) -> Result<()> {
    let value = instr.operand(0)?;
    let ptr = instr.operand(1)?;
    emit_indirect_store(e, ptr, value)
}

fn constant_int(value: &Value) -> Option<i64> {
    match value {
        Value::Constant(c) => match (c.value, c.ty.int_bits()) {
            (ConstantValue::Int(v), Some(bits)) => Some(normalize_int(v, bits)),
            _ => None,
        },
        _ => None,
    }
}

/// Push an integer index as an int, narrowing 64-bit indices.
fn emit_index(e: &mut JasminEmitter<'_>, index: &Value) -> Result<()> {
    emit_load(e, index)?;
    if index.ty().is_wide() {
        e.insn("l2i");
    }
    Ok(())
}

/// A folded byte offset as a heap-address literal.
fn address_literal(offset: i64) -> Result<i32> {
    i32::try_from(offset).map_err(|_| {
        Error::UnsupportedConstruct(format!("byte offset {offset} outside the 32-bit heap"))
    })
}

/// `index * size`, failing when it leaves the 32-bit heap.
fn scaled_offset(index: i64, size: u64) -> Result<i64> {
    let product = i64::try_from(size).ok().and_then(|s| index.checked_mul(s));
    match product {
        Some(bytes) => address_literal(bytes).map(i64::from),
        None => Err(Error::UnsupportedConstruct(format!(
            "byte offset {index} * {size} outside the 32-bit heap"
        ))),
    }
}

/// Multiply the int on top of the stack by `scale`.
fn emit_scale(e: &mut JasminEmitter<'_>, scale: u64) -> Result<()> {
    if scale != 1 {
        let literal = i32::try_from(scale).map_err(|_| {
            Error::UnsupportedConstruct(format!("element size {scale} outside the 32-bit heap"))
        })?;
        emit_int(e, literal);
        e.insn("imul");
    }
    Ok(())
}

fn add_offset(offset: i64, bytes: i64) -> Result<i64> {
    offset
        .checked_add(bytes)
        .ok_or_else(|| Error::UnsupportedConstruct("byte offset outside the 32-bit heap".into()))
        .and_then(|sum| address_literal(sum).map(i64::from))
}

/// Push the address `base + offset(indices)` for an element of `source`.
///
/// The first index steps over whole `source` objects, later ones select
/// struct fields or array elements. Constant indices fold into a single
/// trailing offset.
pub fn emit_element_address(
    e: &mut JasminEmitter<'_>,
    source: &Type,
    base: &Value,
    indices: &[Value],
) -> Result<()> {
    let codec = e.codec();
    emit_load(e, base)?;

    let mut offset: i64 = 0;
    let mut current = source;
    for (position, index) in indices.iter().enumerate() {
        let element = if position == 0 {
            current
        } else {
            match current {
                Type::Struct { fields } => {
                    let field = constant_int(index)
                        .and_then(|i| usize::try_from(i).ok())
                        .filter(|&i| i < fields.len())
                        .ok_or_else(|| {
                            Error::UnsupportedConstruct(format!("struct field index {index}"))
                        })?;
                    let bytes = scaled_offset(1, codec.field_offset(fields, field))?;
                    offset = add_offset(offset, bytes)?;
                    current = &fields[field];
                    continue;
                }
                Type::Array { element, .. } => element.as_ref(),
                Type::Pointer { pointee } => pointee.as_ref(),
                other => {
                    return Err(Error::Internal(format!(
                        "getelementptr steps into non-aggregate type {other}"
                    )));
                }
            }
        };
        let size = codec.byte_size(element);
        match constant_int(index) {
            Some(i) => offset = add_offset(offset, scaled_offset(i, size)?)?,
            None => {
                emit_index(e, index)?;
                emit_scale(e, size)?;
                e.insn("iadd");
            }
        }
        current = element;
    }

    if offset != 0 {
        emit_int(e, address_literal(offset)?);
        e.insn("iadd");
    }
    Ok(())
}

pub fn lower_gep(e: &mut JasminEmitter<'_>, instr: &Instruction, source: &Type) -> Result<()> {
    let result = result_value(instr)?;
    let base = instr.operand(0)?;
    emit_element_address(e, source, base, &instr.operands[1..])?;
    store_result(e, Some(result))
}

/// Allocate `byte_size(allocated) * count` bytes in the current stack
/// frame and store the address.
pub fn lower_alloca(e: &mut JasminEmitter<'_>, instr: &Instruction, allocated: &Type) -> Result<()> {
    let result = result_value(instr)?;
    let size = e.codec().byte_size(allocated);
    match instr.operands.first() {
        None => emit_int(e, address_literal(scaled_offset(1, size)?)?),
        Some(count) => match constant_int(count) {
            Some(n) => emit_int(e, address_literal(scaled_offset(n, size)?)?),
            None => {
                emit_index(e, count)?;
                emit_scale(e, size)?;
            }
        },
    }
    e.runtime_call("allocateStack(I)I");
    emit_store(e, result)
}

/// Clear the slot of a stack allocation at method entry.
pub fn emit_alloca_zero_init(e: &mut JasminEmitter<'_>, result: &Value) -> Result<()> {
    e.insn("iconst_0");
    emit_store(e, result)
}
