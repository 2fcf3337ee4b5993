// Arithmetic, logic, comparison, and conversion operations.
//
// Integers narrower than 32 bits live on the operand stack as ints in
// canonical form: i1 is 0/1, i8 and i16 are sign-extended. Every operation
// that can leave that form re-normalizes its result.

use crate::ir::{BinaryOp, CastOp, Instruction, IntPredicate, Type};
use crate::{Error, Result};

use super::constants::{emit_int, emit_long};
use super::emitter::JasminEmitter;
use super::values::{emit_load, result_value, store_result};

/// Stack representation of a scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    /// An int-category integer of the given width (pointers are 32).
    Int(u32),
    Long,
    Float,
    Double,
}

fn kind_of(ty: &Type) -> Result<Kind> {
    match ty {
        Type::Int { bits: bits @ (1 | 8 | 16 | 32) } => Ok(Kind::Int(*bits)),
        Type::Pointer { .. } => Ok(Kind::Int(32)),
        Type::Int { bits: 64 } => Ok(Kind::Long),
        Type::Float => Ok(Kind::Float),
        Type::Double => Ok(Kind::Double),
        _ => Err(Error::UnsupportedConstruct(format!("arithmetic on type {ty}"))),
    }
}

/// Bring an int of width `bits` back into canonical form.
fn emit_narrow(e: &mut JasminEmitter<'_>, bits: u32) {
    match bits {
        1 => {
            e.insn("iconst_1");
            e.insn("iand");
        }
        8 => e.insn("i2b"),
        16 => e.insn("i2s"),
        _ => {}
    }
}

/// Zero-extend a canonical int of width `bits` to 32 bits.
fn emit_zero_extend(e: &mut JasminEmitter<'_>, bits: u32) {
    match bits {
        8 => {
            emit_int(e, 0xff);
            e.insn("iand");
        }
        16 => {
            emit_int(e, 0xffff);
            e.insn("iand");
        }
        _ => {}
    }
}

/// Zero-extend both int operands of a binary operation in place.
fn emit_zero_extend_pair(e: &mut JasminEmitter<'_>, bits: u32, both: bool) {
    if !matches!(bits, 8 | 16) {
        return;
    }
    e.insn("swap");
    emit_zero_extend(e, bits);
    e.insn("swap");
    if both {
        emit_zero_extend(e, bits);
    }
}

fn unsupported_op(op: BinaryOp, ty: &Type) -> Error {
    Error::UnsupportedConstruct(format!("binary operation {op:?} on type {ty}"))
}

/// Apply `op` to the two operands on top of the stack (lhs below rhs),
/// leaving one value of type `ty`.
pub fn emit_binary_op(e: &mut JasminEmitter<'_>, op: BinaryOp, ty: &Type) -> Result<()> {
    match kind_of(ty)? {
        Kind::Int(bits) => emit_int_op(e, op, bits, ty),
        Kind::Long => emit_long_op(e, op, ty),
        Kind::Float => emit_float_op(e, op, "f", ty),
        Kind::Double => emit_float_op(e, op, "d", ty),
    }
}

fn emit_int_op(e: &mut JasminEmitter<'_>, op: BinaryOp, bits: u32, ty: &Type) -> Result<()> {
    let mnemonic = match op {
        BinaryOp::Add => "iadd",
        BinaryOp::Sub => "isub",
        BinaryOp::Mul => "imul",
        BinaryOp::SDiv => "idiv",
        BinaryOp::SRem => "irem",
        BinaryOp::And => "iand",
        BinaryOp::Or => "ior",
        BinaryOp::Xor => "ixor",
        BinaryOp::Shl => "ishl",
        BinaryOp::AShr => "ishr",
        BinaryOp::LShr => {
            emit_zero_extend_pair(e, bits, false);
            "iushr"
        }
        BinaryOp::UDiv if bits == 32 => {
            e.insn_with("invokestatic", "java/lang/Integer/divideUnsigned(II)I");
            return Ok(());
        }
        BinaryOp::URem if bits == 32 => {
            e.insn_with("invokestatic", "java/lang/Integer/remainderUnsigned(II)I");
            return Ok(());
        }
        BinaryOp::UDiv => {
            emit_zero_extend_pair(e, bits, true);
            "idiv"
        }
        BinaryOp::URem => {
            emit_zero_extend_pair(e, bits, true);
            "irem"
        }
        BinaryOp::FAdd | BinaryOp::FSub | BinaryOp::FMul | BinaryOp::FDiv | BinaryOp::FRem => {
            return Err(unsupported_op(op, ty));
        }
    };
    e.insn(mnemonic);
    if !matches!(op, BinaryOp::And | BinaryOp::Or | BinaryOp::Xor) {
        emit_narrow(e, bits);
    }
    Ok(())
}

fn emit_long_op(e: &mut JasminEmitter<'_>, op: BinaryOp, ty: &Type) -> Result<()> {
    let mnemonic = match op {
        BinaryOp::Add => "ladd",
        BinaryOp::Sub => "lsub",
        BinaryOp::Mul => "lmul",
        BinaryOp::SDiv => "ldiv",
        BinaryOp::SRem => "lrem",
        BinaryOp::And => "land",
        BinaryOp::Or => "lor",
        BinaryOp::Xor => "lxor",
        BinaryOp::Shl | BinaryOp::LShr | BinaryOp::AShr => {
            // JVM long shifts take an int amount
            e.insn("l2i");
            match op {
                BinaryOp::Shl => "lshl",
                BinaryOp::LShr => "lushr",
                _ => "lshr",
            }
        }
        BinaryOp::UDiv => {
            e.insn_with("invokestatic", "java/lang/Long/divideUnsigned(JJ)J");
            return Ok(());
        }
        BinaryOp::URem => {
            e.insn_with("invokestatic", "java/lang/Long/remainderUnsigned(JJ)J");
            return Ok(());
        }
        BinaryOp::FAdd | BinaryOp::FSub | BinaryOp::FMul | BinaryOp::FDiv | BinaryOp::FRem => {
            return Err(unsupported_op(op, ty));
        }
    };
    e.insn(mnemonic);
    Ok(())
}

fn emit_float_op(e: &mut JasminEmitter<'_>, op: BinaryOp, prefix: &str, ty: &Type) -> Result<()> {
    let base = match op {
        BinaryOp::FAdd => "add",
        BinaryOp::FSub => "sub",
        BinaryOp::FMul => "mul",
        BinaryOp::FDiv => "div",
        BinaryOp::FRem => "rem",
        _ => return Err(unsupported_op(op, ty)),
    };
    e.insn(&format!("{prefix}{base}"));
    Ok(())
}

/// Lower a two-operand arithmetic instruction.
pub fn lower_binary(e: &mut JasminEmitter<'_>, instr: &Instruction, op: BinaryOp) -> Result<()> {
    let result = result_value(instr)?;
    emit_load(e, instr.operand(0)?)?;
    emit_load(e, instr.operand(1)?)?;
    emit_binary_op(e, op, result.ty())?;
    store_result(e, Some(result))
}

fn condition_suffix(predicate: IntPredicate) -> &'static str {
    match predicate {
        IntPredicate::Eq => "eq",
        IntPredicate::Ne => "ne",
        IntPredicate::Ugt | IntPredicate::Sgt => "gt",
        IntPredicate::Uge | IntPredicate::Sge => "ge",
        IntPredicate::Ult | IntPredicate::Slt => "lt",
        IntPredicate::Ule | IntPredicate::Sle => "le",
    }
}

fn is_unsigned(predicate: IntPredicate) -> bool {
    matches!(
        predicate,
        IntPredicate::Ugt | IntPredicate::Uge | IntPredicate::Ult | IntPredicate::Ule
    )
}

fn is_signed(predicate: IntPredicate) -> bool {
    matches!(
        predicate,
        IntPredicate::Sgt | IntPredicate::Sge | IntPredicate::Slt | IntPredicate::Sle
    )
}

/// Lower `icmp` into a diamond that pushes 0 or 1.
pub fn lower_icmp(
    e: &mut JasminEmitter<'_>,
    instr: &Instruction,
    predicate: IntPredicate,
) -> Result<()> {
    let lhs = instr.operand(0)?;
    let rhs = instr.operand(1)?;
    let cond = condition_suffix(predicate);
    let kind = kind_of(lhs.ty())?;

    // a set i1 is -1 when read as signed
    let negate = kind == Kind::Int(1) && is_signed(predicate);
    emit_load(e, lhs)?;
    if negate {
        e.insn("ineg");
    }
    emit_load(e, rhs)?;
    if negate {
        e.insn("ineg");
    }
    let jump = match kind {
        Kind::Int(32) if is_unsigned(predicate) => {
            e.insn_with("invokestatic", "java/lang/Integer/compareUnsigned(II)I");
            format!("if{cond}")
        }
        Kind::Int(bits) => {
            if is_unsigned(predicate) {
                emit_zero_extend_pair(e, bits, true);
            }
            format!("if_icmp{cond}")
        }
        Kind::Long if is_unsigned(predicate) => {
            e.insn_with("invokestatic", "java/lang/Long/compareUnsigned(JJ)I");
            format!("if{cond}")
        }
        Kind::Long => {
            e.insn("lcmp");
            format!("if{cond}")
        }
        Kind::Float | Kind::Double => {
            return Err(Error::UnsupportedConstruct(format!(
                "integer comparison on type {}",
                lhs.ty()
            )));
        }
    };

    let stem = e.fresh_label("cmp");
    let taken = format!("{stem}_true");
    let join = format!("{stem}_end");
    e.insn_with(&jump, taken.clone());
    e.insn("iconst_0");
    e.insn_with("goto", join.clone());
    e.define_label(taken);
    e.insn("iconst_1");
    e.define_label(join);
    store_result(e, instr.result.as_ref())
}

fn unsupported_cast(op: CastOp, from: &Type, to: &Type) -> Error {
    Error::UnsupportedConstruct(format!("cast {op:?} from {from} to {to}"))
}

/// Convert the value on top of the stack from `from` to `to`.
pub fn emit_conversion(e: &mut JasminEmitter<'_>, op: CastOp, from: &Type, to: &Type) -> Result<()> {
    let src = kind_of(from)?;
    let dst = kind_of(to)?;
    match (op, src, dst) {
        (CastOp::Trunc | CastOp::PtrToInt, Kind::Int(a), Kind::Int(b)) if b <= a => {
            if b < a {
                emit_narrow(e, b);
            }
        }
        (CastOp::Trunc | CastOp::PtrToInt | CastOp::IntToPtr, Kind::Long, Kind::Int(b)) => {
            e.insn("l2i");
            emit_narrow(e, b);
        }
        (CastOp::ZExt | CastOp::IntToPtr | CastOp::PtrToInt, Kind::Int(a), Kind::Int(b))
            if a <= b =>
        {
            emit_zero_extend(e, a);
        }
        (CastOp::ZExt | CastOp::PtrToInt, Kind::Int(a), Kind::Long) => {
            if a == 32 {
                e.insn("i2l");
                emit_long(e, 0xffff_ffff);
                e.insn("land");
            } else {
                emit_zero_extend(e, a);
                e.insn("i2l");
            }
        }
        (CastOp::SExt, Kind::Int(a), Kind::Int(b)) if a <= b => {
            if a == 1 {
                e.insn("ineg");
            }
        }
        (CastOp::SExt, Kind::Int(a), Kind::Long) => {
            if a == 1 {
                e.insn("ineg");
            }
            e.insn("i2l");
        }
        (CastOp::SIToFP, Kind::Int(a), Kind::Float | Kind::Double) => {
            if a == 1 {
                e.insn("ineg");
            }
            e.insn(if dst == Kind::Float { "i2f" } else { "i2d" });
        }
        (CastOp::SIToFP, Kind::Long, Kind::Float) => e.insn("l2f"),
        (CastOp::SIToFP, Kind::Long, Kind::Double) => e.insn("l2d"),
        (CastOp::FPToSI, Kind::Float, Kind::Int(b)) => {
            e.insn("f2i");
            emit_narrow(e, b);
        }
        (CastOp::FPToSI, Kind::Double, Kind::Int(b)) => {
            e.insn("d2i");
            emit_narrow(e, b);
        }
        (CastOp::FPToSI, Kind::Float, Kind::Long) => e.insn("f2l"),
        (CastOp::FPToSI, Kind::Double, Kind::Long) => e.insn("d2l"),
        (CastOp::FPExt, Kind::Float, Kind::Double) => e.insn("f2d"),
        (CastOp::FPTrunc, Kind::Double, Kind::Float) => e.insn("d2f"),
        (CastOp::BitCast, a, b) if a == b => {}
        (CastOp::BitCast, Kind::Int(32), Kind::Float) => {
            e.insn_with("invokestatic", "java/lang/Float/intBitsToFloat(I)F");
        }
        (CastOp::BitCast, Kind::Float, Kind::Int(32)) => {
            e.insn_with("invokestatic", "java/lang/Float/floatToRawIntBits(F)I");
        }
        (CastOp::BitCast, Kind::Long, Kind::Double) => {
            e.insn_with("invokestatic", "java/lang/Double/longBitsToDouble(J)D");
        }
        (CastOp::BitCast, Kind::Double, Kind::Long) => {
            e.insn_with("invokestatic", "java/lang/Double/doubleToRawLongBits(D)J");
        }
        _ => return Err(unsupported_cast(op, from, to)),
    }
    Ok(())
}

pub fn lower_cast(e: &mut JasminEmitter<'_>, instr: &Instruction, op: CastOp) -> Result<()> {
    let src = instr.operand(0)?;
    let result = result_value(instr)?;
    emit_load(e, src)?;
    emit_conversion(e, op, src.ty(), result.ty())?;
    store_result(e, Some(result))
}
