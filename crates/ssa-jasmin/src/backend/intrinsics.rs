// Variadic-argument intrinsics.
//
// A `va_list` is a heap cell holding the address of the next packed
// argument. `va_start` seeds it from the method's variadic slot.

use crate::ir::{Instruction, Intrinsic, Type};
use crate::{Error, Result};

use super::emitter::{JasminEmitter, VARARGS_NAME};
use super::memory::{emit_indirect_load_type, emit_indirect_store_type};
use super::values::{emit_load, emit_slot_access};

pub fn lower_intrinsic(
    e: &mut JasminEmitter<'_>,
    instr: &Instruction,
    intrinsic: &Intrinsic,
) -> Result<()> {
    let list_ty = Type::ptr(Type::i8());
    match intrinsic {
        Intrinsic::VaStart => {
            let slot = e.slots.variadic_slot().ok_or_else(|| {
                Error::Internal(format!(
                    "{} in non-variadic function {}",
                    intrinsic.name(),
                    e.function().name
                ))
            })?;
            emit_load(e, instr.operand(0)?)?;
            let comment = e.options().annotate_values.then(|| VARARGS_NAME.to_string());
            emit_slot_access(e, "i", "load", slot, comment);
            emit_indirect_store_type(e, &list_ty)
        }
        Intrinsic::VaCopy => {
            emit_load(e, instr.operand(0)?)?;
            emit_load(e, instr.operand(1)?)?;
            emit_indirect_load_type(e, &list_ty)?;
            emit_indirect_store_type(e, &list_ty)
        }
        Intrinsic::VaEnd => Ok(()),
        Intrinsic::Other(name) => Err(Error::UnsupportedConstruct(format!("intrinsic {name}"))),
    }
}
