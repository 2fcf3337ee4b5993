//! Typed SSA intermediate representation consumed by the backend.
//!
//! The input is assumed to be verified upstream: every operand is defined,
//! every branch target exists, and every call matches its callee's type.

mod builder;
mod display;
mod function;
mod instruction;
mod loops;
mod types;
mod value;

pub use builder::FunctionBuilder;
pub use function::{BasicBlock, BlockId, Externals, Function, GlobalDecl, Linkage, Module};
pub use instruction::{
    ARG_ORIGIN, BinaryOp, CastOp, Instruction, IntPredicate, Intrinsic, Opcode, call_arguments,
};
pub use loops::{Loop, LoopId, LoopNest};
pub use types::{FunctionType, Type};
pub use value::{ConstExprOp, Constant, ConstantExpr, ConstantValue, Value, ValueId};
