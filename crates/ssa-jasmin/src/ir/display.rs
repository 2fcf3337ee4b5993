use std::fmt;

use super::types::{FunctionType, Type};
use super::value::{ConstantValue, Value};

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Int { bits } => write!(f, "i{bits}"),
            Type::Float => write!(f, "float"),
            Type::Double => write!(f, "double"),
            Type::Pointer { pointee } => write!(f, "{pointee}*"),
            Type::Array { element, len } => write!(f, "[{len} x {element}]"),
            Type::Struct { fields } => {
                write!(f, "{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{field}")?;
                }
                write!(f, "}}")
            }
            Type::Function(ft) => write!(f, "{ft}"),
        }
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (", self.ret)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{p}")?;
        }
        if self.variadic {
            if !self.params.is_empty() {
                write!(f, ", ")?;
            }
            write!(f, "...")?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Local { name, ty, .. } | Value::Argument { name, ty, .. } => {
                write!(f, "{ty} %{name}")
            }
            Value::Global { name, ty } | Value::Function { name, ty } => write!(f, "{ty} @{name}"),
            Value::Constant(c) => match c.value {
                ConstantValue::Int(v) => write!(f, "{} {v}", c.ty),
                ConstantValue::Float(v) => write!(f, "{} {v:?}", c.ty),
                ConstantValue::Undef => write!(f, "{} undef", c.ty),
            },
            Value::ConstantExpr(ce) => write!(f, "{} <constant expression {:?}>", ce.ty, ce.op),
            Value::Null { ty } => write!(f, "{ty} null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_llvm_style_types() {
        assert_eq!(Type::ptr(Type::i8()).to_string(), "i8*");
        assert_eq!(Type::array(Type::i32(), 4).to_string(), "[4 x i32]");
        assert_eq!(
            Type::Struct {
                fields: vec![Type::i32(), Type::Double]
            }
            .to_string(),
            "{i32, double}"
        );
        let ft = FunctionType::new(vec![Type::ptr(Type::i8())], Type::i32()).variadic();
        assert_eq!(ft.to_string(), "i32 (i8*, ...)");
    }

    #[test]
    fn renders_values() {
        assert_eq!(Value::i32(7).to_string(), "i32 7");
        assert_eq!(Value::null(Type::i8()).to_string(), "i8* null");
        assert_eq!(Value::global("g", Type::i32()).to_string(), "i32* @g");
    }
}
