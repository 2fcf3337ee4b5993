//! Type codec: JVM descriptors, opcode prefixes, runtime postfixes and
//! in-memory layout for IR types.
//!
//! The backend only talks to types through [`TypeCodec`], so a different
//! signature grammar or data layout can be plugged in without touching the
//! lowering code.

use crate::ir::Type;
use crate::{Error, Result};

pub trait TypeCodec {
    /// Field/method descriptor of a type (`I`, `J`, `D`, `V`, ...).
    fn descriptor(&self, ty: &Type) -> Result<String>;

    /// Prefix of the typed local/stack opcodes (`i`, `l`, `f`, `d`).
    fn load_store_prefix(&self, ty: &Type) -> Result<&'static str>;

    /// Suffix selecting the runtime heap accessor (`load_i32`, `load_f64`, ...).
    fn postfix(&self, ty: &Type) -> Result<&'static str>;

    /// Allocation size in bytes, including tail padding.
    fn byte_size(&self, ty: &Type) -> u64;

    /// ABI alignment in bytes.
    fn alignment(&self, ty: &Type) -> u64;

    /// Byte offset of field `index` within a struct with `fields`.
    fn field_offset(&self, fields: &[Type], index: usize) -> u64 {
        let mut offset = 0;
        for (i, field) in fields.iter().enumerate() {
            offset = align_to(offset, self.alignment(field));
            if i == index {
                return offset;
            }
            offset += self.byte_size(field);
        }
        offset
    }
}

fn align_to(value: u64, align: u64) -> u64 {
    if align <= 1 {
        value
    } else {
        value.div_ceil(align) * align
    }
}

/// Default codec: pointers are 32-bit ints into the runtime heap, scalars
/// are naturally aligned, 64-bit types are 8-byte aligned.
#[derive(Debug, Clone, Copy, Default)]
pub struct JvmTypeCodec;

/// Size of a runtime heap address.
pub const POINTER_SIZE: u64 = 4;

impl TypeCodec for JvmTypeCodec {
    fn descriptor(&self, ty: &Type) -> Result<String> {
        let desc = match ty {
            Type::Void => "V",
            Type::Int { bits: 1 } => "Z",
            Type::Int { bits: 8 } => "B",
            Type::Int { bits: 16 } => "S",
            Type::Int { bits: 32 } | Type::Pointer { .. } => "I",
            Type::Int { bits: 64 } => "J",
            Type::Float => "F",
            Type::Double => "D",
            _ => {
                return Err(Error::UnsupportedConstruct(format!(
                    "no descriptor for type {ty}"
                )));
            }
        };
        Ok(desc.to_string())
    }

    fn load_store_prefix(&self, ty: &Type) -> Result<&'static str> {
        match ty {
            Type::Int { bits: 1 | 8 | 16 | 32 } | Type::Pointer { .. } => Ok("i"),
            Type::Int { bits: 64 } => Ok("l"),
            Type::Float => Ok("f"),
            Type::Double => Ok("d"),
            _ => Err(Error::UnsupportedConstruct(format!(
                "no load/store prefix for type {ty}"
            ))),
        }
    }

    fn postfix(&self, ty: &Type) -> Result<&'static str> {
        match ty {
            Type::Int { bits: 1 } => Ok("i1"),
            Type::Int { bits: 8 } => Ok("i8"),
            Type::Int { bits: 16 } => Ok("i16"),
            Type::Int { bits: 32 } | Type::Pointer { .. } => Ok("i32"),
            Type::Int { bits: 64 } => Ok("i64"),
            Type::Float => Ok("f32"),
            Type::Double => Ok("f64"),
            _ => Err(Error::UnsupportedConstruct(format!(
                "no memory accessor for type {ty}"
            ))),
        }
    }

    fn byte_size(&self, ty: &Type) -> u64 {
        match ty {
            Type::Void | Type::Function(_) => 0,
            Type::Int { bits } => u64::from(bits.div_ceil(8)).next_power_of_two(),
            Type::Float | Type::Pointer { .. } => 4,
            Type::Double => 8,
            Type::Array { element, len } => {
                align_to(self.byte_size(element), self.alignment(element)) * len
            }
            Type::Struct { fields } => {
                let end = fields.last().map_or(0, |last| {
                    self.field_offset(fields, fields.len() - 1) + self.byte_size(last)
                });
                align_to(end, self.alignment(ty))
            }
        }
    }

    fn alignment(&self, ty: &Type) -> u64 {
        match ty {
            Type::Void | Type::Function(_) => 1,
            Type::Int { .. } | Type::Float | Type::Double | Type::Pointer { .. } => {
                self.byte_size(ty).clamp(1, 8)
            }
            Type::Array { element, .. } => self.alignment(element),
            Type::Struct { fields } => fields.iter().map(|f| self.alignment(f)).max().unwrap_or(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_descriptors() {
        let c = JvmTypeCodec;
        assert_eq!(c.descriptor(&Type::i1()).unwrap(), "Z");
        assert_eq!(c.descriptor(&Type::i8()).unwrap(), "B");
        assert_eq!(c.descriptor(&Type::i16()).unwrap(), "S");
        assert_eq!(c.descriptor(&Type::i32()).unwrap(), "I");
        assert_eq!(c.descriptor(&Type::i64()).unwrap(), "J");
        assert_eq!(c.descriptor(&Type::Float).unwrap(), "F");
        assert_eq!(c.descriptor(&Type::Double).unwrap(), "D");
        assert_eq!(c.descriptor(&Type::Void).unwrap(), "V");
        assert_eq!(c.descriptor(&Type::ptr(Type::Double)).unwrap(), "I");
    }

    #[test]
    fn aggregates_have_no_descriptor() {
        let c = JvmTypeCodec;
        let err = c.descriptor(&Type::array(Type::i32(), 2)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedConstruct(_)));
    }

    #[test]
    fn prefixes_and_postfixes() {
        let c = JvmTypeCodec;
        assert_eq!(c.load_store_prefix(&Type::i8()).unwrap(), "i");
        assert_eq!(c.load_store_prefix(&Type::i64()).unwrap(), "l");
        assert_eq!(c.load_store_prefix(&Type::Double).unwrap(), "d");
        assert_eq!(c.postfix(&Type::ptr(Type::i8())).unwrap(), "i32");
        assert_eq!(c.postfix(&Type::Float).unwrap(), "f32");
    }

    #[test]
    fn struct_layout_pads_fields() {
        let c = JvmTypeCodec;
        let s = Type::Struct {
            fields: vec![Type::i8(), Type::i32(), Type::i64(), Type::i16()],
        };
        let Type::Struct { fields } = &s else {
            unreachable!()
        };
        assert_eq!(c.field_offset(fields, 0), 0);
        assert_eq!(c.field_offset(fields, 1), 4);
        assert_eq!(c.field_offset(fields, 2), 8);
        assert_eq!(c.field_offset(fields, 3), 16);
        assert_eq!(c.byte_size(&s), 24);
        assert_eq!(c.alignment(&s), 8);
    }

    #[test]
    fn array_size() {
        let c = JvmTypeCodec;
        assert_eq!(c.byte_size(&Type::array(Type::i16(), 5)), 10);
        assert_eq!(c.byte_size(&Type::i1()), 1);
    }
}
