use serde::{Deserialize, Serialize};

use super::types::{FunctionType, Type};

/// Identity of an argument or instruction result within one function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValueId(pub u32);

/// An IR value. Every variant carries its type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Value {
    /// Result of an instruction in the current function.
    Local { id: ValueId, name: String, ty: Type },
    /// Formal parameter of the current function.
    Argument { id: ValueId, name: String, ty: Type },
    /// Address of a global variable; `ty` is the pointer type.
    Global { name: String, ty: Type },
    /// A function symbol; `ty` is a pointer to the function type.
    Function { name: String, ty: Type },
    Constant(Constant),
    ConstantExpr(Box<ConstantExpr>),
    /// Null pointer of pointer type `ty`.
    Null { ty: Type },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constant {
    pub ty: Type,
    pub value: ConstantValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstantValue {
    Int(i64),
    Float(f64),
    Undef,
}

/// A constant operator tree, folded at use sites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantExpr {
    pub op: ConstExprOp,
    pub operands: Vec<Value>,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ConstExprOp {
    BitCast,
    PtrToInt,
    IntToPtr,
    Trunc,
    ZExt,
    SExt,
    Add,
    Sub,
    Mul,
    /// `operands[0]` is the base pointer, the rest are indices stepping
    /// through `source`.
    GetElementPtr { source: Type },
}

impl Value {
    #[must_use]
    pub fn ty(&self) -> &Type {
        match self {
            Value::Local { ty, .. }
            | Value::Argument { ty, .. }
            | Value::Global { ty, .. }
            | Value::Function { ty, .. }
            | Value::Null { ty } => ty,
            Value::Constant(c) => &c.ty,
            Value::ConstantExpr(ce) => &ce.ty,
        }
    }

    /// Slot identity for values that live in the local-variable array.
    #[must_use]
    pub fn slot_id(&self) -> Option<ValueId> {
        match self {
            Value::Local { id, .. } | Value::Argument { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Source-level name, when the value has one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Value::Local { name, .. }
            | Value::Argument { name, .. }
            | Value::Global { name, .. }
            | Value::Function { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn const_int(ty: Type, value: i64) -> Self {
        Value::Constant(Constant {
            ty,
            value: ConstantValue::Int(value),
        })
    }

    pub fn i32(value: i32) -> Self {
        Value::const_int(Type::i32(), i64::from(value))
    }

    pub fn i64(value: i64) -> Self {
        Value::const_int(Type::i64(), value)
    }

    pub fn const_float(ty: Type, value: f64) -> Self {
        Value::Constant(Constant {
            ty,
            value: ConstantValue::Float(value),
        })
    }

    pub fn undef(ty: Type) -> Self {
        Value::Constant(Constant {
            ty,
            value: ConstantValue::Undef,
        })
    }

    pub fn null(pointee: Type) -> Self {
        Value::Null {
            ty: Type::ptr(pointee),
        }
    }

    /// Address of the global `name` holding a `pointee`.
    pub fn global(name: impl Into<String>, pointee: Type) -> Self {
        Value::Global {
            name: name.into(),
            ty: Type::ptr(pointee),
        }
    }

    pub fn function(name: impl Into<String>, ty: FunctionType) -> Self {
        Value::Function {
            name: name.into(),
            ty: Type::ptr(Type::Function(Box::new(ty))),
        }
    }

    pub fn const_expr(op: ConstExprOp, operands: Vec<Value>, ty: Type) -> Self {
        Value::ConstantExpr(Box::new(ConstantExpr { op, operands, ty }))
    }
}
