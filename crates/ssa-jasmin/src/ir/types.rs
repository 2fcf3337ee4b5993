use serde::{Deserialize, Serialize};

/// A semantic IR type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Type {
    Void,
    Int { bits: u32 },
    Float,
    Double,
    Pointer { pointee: Box<Type> },
    Array { element: Box<Type>, len: u64 },
    Struct { fields: Vec<Type> },
    Function(Box<FunctionType>),
}

/// Signature of a function: parameter types, return type, variadic flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionType {
    pub params: Vec<Type>,
    pub ret: Type,
    #[serde(default)]
    pub variadic: bool,
}

impl Type {
    pub const fn int(bits: u32) -> Self {
        Type::Int { bits }
    }

    pub const fn i1() -> Self {
        Type::int(1)
    }

    pub const fn i8() -> Self {
        Type::int(8)
    }

    pub const fn i16() -> Self {
        Type::int(16)
    }

    pub const fn i32() -> Self {
        Type::int(32)
    }

    pub const fn i64() -> Self {
        Type::int(64)
    }

    pub fn ptr(pointee: Type) -> Self {
        Type::Pointer {
            pointee: Box::new(pointee),
        }
    }

    pub fn array(element: Type, len: u64) -> Self {
        Type::Array {
            element: Box::new(element),
            len,
        }
    }

    /// Bit width of an integer type, `None` for everything else.
    #[must_use]
    pub fn int_bits(&self) -> Option<u32> {
        match self {
            Type::Int { bits } => Some(*bits),
            _ => None,
        }
    }

    /// Values of this type occupy two local slots and two stack words.
    #[must_use]
    pub fn is_wide(&self) -> bool {
        matches!(self, Type::Int { bits: 64 } | Type::Double)
    }

    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    #[must_use]
    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer { .. })
    }

    #[must_use]
    pub fn is_floating(&self) -> bool {
        matches!(self, Type::Float | Type::Double)
    }

    #[must_use]
    pub fn pointee(&self) -> Option<&Type> {
        match self {
            Type::Pointer { pointee } => Some(pointee),
            _ => None,
        }
    }

    /// The function type behind a function or pointer-to-function type.
    #[must_use]
    pub fn as_function(&self) -> Option<&FunctionType> {
        match self {
            Type::Function(ft) => Some(ft),
            Type::Pointer { pointee } => pointee.as_function(),
            _ => None,
        }
    }

    /// Number of JVM stack words (and local slots) a value of this type uses.
    #[must_use]
    pub fn stack_words(&self) -> u32 {
        if self.is_void() {
            0
        } else if self.is_wide() {
            2
        } else {
            1
        }
    }
}

impl FunctionType {
    pub fn new(params: Vec<Type>, ret: Type) -> Self {
        Self {
            params,
            ret,
            variadic: false,
        }
    }

    #[must_use]
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_classes() {
        assert!(Type::i64().is_wide());
        assert!(Type::Double.is_wide());
        assert!(!Type::i32().is_wide());
        assert!(!Type::ptr(Type::i64()).is_wide());
        assert_eq!(Type::Void.stack_words(), 0);
        assert_eq!(Type::Float.stack_words(), 1);
        assert_eq!(Type::i64().stack_words(), 2);
    }

    #[test]
    fn pointer_to_function_exposes_signature() {
        let ft = FunctionType::new(vec![Type::i32()], Type::Void);
        let ty = Type::ptr(Type::Function(Box::new(ft.clone())));
        assert_eq!(ty.as_function(), Some(&ft));
        assert_eq!(Type::i32().as_function(), None);
    }
}
