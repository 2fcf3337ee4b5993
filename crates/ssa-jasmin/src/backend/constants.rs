// Literal pushes and constant-expression folding.

use crate::ir::{BinaryOp, CastOp, ConstExprOp, Constant, ConstantExpr, ConstantValue, Type, Value};
use crate::{Error, Result};

use super::alu::{emit_binary_op, emit_conversion};
use super::emitter::JasminEmitter;
use super::memory::emit_element_address;
use super::values::emit_load;

/// Push the null pointer. Pointers are heap addresses, so this is int zero.
pub fn emit_null(e: &mut JasminEmitter<'_>) {
    e.insn("iconst_0");
}

/// Push a 32-bit int with the shortest encoding.
pub fn emit_int(e: &mut JasminEmitter<'_>, value: i32) {
    match value {
        -1 => e.insn("iconst_m1"),
        0..=5 => e.insn(&format!("iconst_{value}")),
        -128..=127 => e.insn_with("bipush", value.to_string()),
        -32768..=32767 => e.insn_with("sipush", value.to_string()),
        _ => e.insn_with("ldc", value.to_string()),
    }
}

pub fn emit_long(e: &mut JasminEmitter<'_>, value: i64) {
    match value {
        0 | 1 => e.insn(&format!("lconst_{value}")),
        _ => e.insn_with("ldc2_w", value.to_string()),
    }
}

pub fn emit_float(e: &mut JasminEmitter<'_>, value: f32) {
    if value.to_bits() == 0 {
        e.insn("fconst_0");
    } else if value == 1.0 {
        e.insn("fconst_1");
    } else if value == 2.0 {
        e.insn("fconst_2");
    } else if let Some(text) = plain_literal(value.is_finite(), format!("{value:?}")) {
        e.insn_with("ldc", text);
    } else {
        emit_int(e, value.to_bits() as i32);
        e.insn_with("invokestatic", "java/lang/Float/intBitsToFloat(I)F");
    }
}

pub fn emit_double(e: &mut JasminEmitter<'_>, value: f64) {
    if value.to_bits() == 0 {
        e.insn("dconst_0");
    } else if value == 1.0 {
        e.insn("dconst_1");
    } else if let Some(text) = plain_literal(value.is_finite(), format!("{value:?}")) {
        e.insn_with("ldc2_w", text);
    } else {
        emit_long(e, value.to_bits() as i64);
        e.insn_with("invokestatic", "java/lang/Double/longBitsToDouble(J)D");
    }
}

/// Decimal text the assembler reads back exactly; exponent and non-finite
/// forms go through the bit-pattern path instead.
fn plain_literal(finite: bool, text: String) -> Option<String> {
    (finite && !text.contains(['e', 'E'])).then_some(text)
}

/// Canonical in-register form of an integer constant: i1 is 0/1, narrower
/// widths are sign-extended.
pub(crate) fn normalize_int(value: i64, bits: u32) -> i64 {
    match bits {
        1 => value & 1,
        2..=63 => {
            let shift = 64 - bits;
            (value << shift) >> shift
        }
        _ => value,
    }
}

/// Push the zero value of `ty`.
pub fn emit_zero(e: &mut JasminEmitter<'_>, ty: &Type) -> Result<()> {
    match ty {
        Type::Int { bits: 64 } => e.insn("lconst_0"),
        Type::Int { .. } | Type::Pointer { .. } => e.insn("iconst_0"),
        Type::Float => e.insn("fconst_0"),
        Type::Double => e.insn("dconst_0"),
        _ => {
            return Err(Error::UnsupportedConstruct(format!(
                "constant of type {ty}"
            )));
        }
    }
    Ok(())
}

pub fn emit_constant(e: &mut JasminEmitter<'_>, c: &Constant) -> Result<()> {
    match (&c.ty, c.value) {
        (ty, ConstantValue::Undef) => emit_zero(e, ty),
        (Type::Int { bits: 64 }, ConstantValue::Int(v)) => {
            emit_long(e, v);
            Ok(())
        }
        (Type::Int { bits }, ConstantValue::Int(v)) => {
            emit_int(e, normalize_int(v, *bits) as i32);
            Ok(())
        }
        (Type::Pointer { .. }, ConstantValue::Int(v)) => {
            emit_int(e, v as i32);
            Ok(())
        }
        (Type::Float, ConstantValue::Float(v)) => {
            emit_float(e, v as f32);
            Ok(())
        }
        (Type::Double, ConstantValue::Float(v)) => {
            emit_double(e, v);
            Ok(())
        }
        (ty, value) => Err(Error::UnsupportedConstruct(format!(
            "constant {value:?} of type {ty}"
        ))),
    }
}

/// Lower a constant expression by pushing its operands and applying the
/// operator, recursively.
pub fn emit_constant_expr(e: &mut JasminEmitter<'_>, ce: &ConstantExpr) -> Result<()> {
    match &ce.op {
        ConstExprOp::BitCast => emit_cast_expr(e, ce, CastOp::BitCast),
        ConstExprOp::PtrToInt => emit_cast_expr(e, ce, CastOp::PtrToInt),
        ConstExprOp::IntToPtr => emit_cast_expr(e, ce, CastOp::IntToPtr),
        ConstExprOp::Trunc => emit_cast_expr(e, ce, CastOp::Trunc),
        ConstExprOp::ZExt => emit_cast_expr(e, ce, CastOp::ZExt),
        ConstExprOp::SExt => emit_cast_expr(e, ce, CastOp::SExt),
        ConstExprOp::Add => emit_arith_expr(e, ce, BinaryOp::Add),
        ConstExprOp::Sub => emit_arith_expr(e, ce, BinaryOp::Sub),
        ConstExprOp::Mul => emit_arith_expr(e, ce, BinaryOp::Mul),
        ConstExprOp::GetElementPtr { source } => {
            let base = expr_operand(ce, 0)?;
            emit_element_address(e, source, base, &ce.operands[1..])
        }
    }
}

fn expr_operand(ce: &ConstantExpr, i: usize) -> Result<&Value> {
    ce.operands.get(i).ok_or_else(|| {
        Error::Internal(format!("constant expression {:?} missing operand {i}", ce.op))
    })
}

fn emit_cast_expr(e: &mut JasminEmitter<'_>, ce: &ConstantExpr, op: CastOp) -> Result<()> {
    let src = expr_operand(ce, 0)?;
    emit_load(e, src)?;
    emit_conversion(e, op, src.ty(), &ce.ty)
}

fn emit_arith_expr(e: &mut JasminEmitter<'_>, ce: &ConstantExpr, op: BinaryOp) -> Result<()> {
    emit_load(e, expr_operand(ce, 0)?)?;
    emit_load(e, expr_operand(ce, 1)?)?;
    emit_binary_op(e, op, &ce.ty)
}

#[cfg(test)]
mod tests {
    use super::normalize_int;

    #[test]
    fn narrow_constants_are_sign_extended() {
        assert_eq!(normalize_int(255, 8), -1);
        assert_eq!(normalize_int(127, 8), 127);
        assert_eq!(normalize_int(0xffff, 16), -1);
        assert_eq!(normalize_int(3, 1), 1);
        assert_eq!(normalize_int(0xffff_ffff, 32), -1);
        assert_eq!(normalize_int(-5, 64), -5);
    }
}
