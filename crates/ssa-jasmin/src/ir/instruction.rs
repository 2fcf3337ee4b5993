use serde::{Deserialize, Serialize};

use super::function::BlockId;
use super::types::Type;
use super::value::Value;
use crate::{Error, Result};

/// One IR instruction.
///
/// Operand layout per opcode:
/// - `call`/`invoke`: `[callee, args...]` (invoke destinations live in the opcode)
/// - `load`: `[ptr]`; `store`: `[value, ptr]`
/// - `alloca`: `[]` or `[count]`
/// - `getelementptr`: `[base, indices...]`
/// - `phi`: one incoming value per entry of `incoming`
/// - `condbr`: `[cond]`; `ret`: `[]` or `[value]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    #[serde(flatten)]
    pub opcode: Opcode,
    #[serde(default)]
    pub operands: Vec<Value>,
    /// Result value (a `Value::Local`), absent for void operations.
    #[serde(default)]
    pub result: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "opcode", rename_all = "snake_case")]
pub enum Opcode {
    Call,
    Invoke { normal: BlockId, unwind: BlockId },
    Intrinsic { intrinsic: Intrinsic },
    Alloca { allocated: Type },
    Load,
    Store,
    GetElementPtr { source: Type },
    Binary { op: BinaryOp },
    ICmp { predicate: IntPredicate },
    Cast { op: CastOp },
    Phi { incoming: Vec<BlockId> },
    Br { dest: BlockId },
    CondBr { then_dest: BlockId, else_dest: BlockId },
    Ret,
    Unreachable,
    /// An operation this backend has no lowering for.
    Other { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intrinsic {
    VaStart,
    VaCopy,
    VaEnd,
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    SDiv,
    UDiv,
    SRem,
    URem,
    And,
    Or,
    Xor,
    Shl,
    LShr,
    AShr,
    FAdd,
    FSub,
    FMul,
    FDiv,
    FRem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntPredicate {
    Eq,
    Ne,
    Ugt,
    Uge,
    Ult,
    Ule,
    Sgt,
    Sge,
    Slt,
    Sle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastOp {
    Trunc,
    ZExt,
    SExt,
    SIToFP,
    FPToSI,
    FPExt,
    FPTrunc,
    BitCast,
    PtrToInt,
    IntToPtr,
}

/// Index of the first argument operand of a call or invoke.
pub const ARG_ORIGIN: usize = 1;

/// Argument operands of a call or invoke (everything after the callee).
pub fn call_arguments(instr: &Instruction) -> &[Value] {
    instr.operands.get(ARG_ORIGIN..).unwrap_or(&[])
}

impl Instruction {
    pub fn new(opcode: Opcode, operands: Vec<Value>, result: Option<Value>) -> Self {
        Self {
            opcode,
            operands,
            result,
        }
    }

    pub fn operand(&self, i: usize) -> Result<&Value> {
        self.operands.get(i).ok_or_else(|| {
            Error::Internal(format!("missing operand {i} in {}", self.opcode.name()))
        })
    }

    /// Operand count including block operands, matching the classic IR
    /// operand list where branch and invoke destinations are operands too.
    #[must_use]
    pub fn operand_count(&self) -> usize {
        let blocks = match &self.opcode {
            Opcode::Br { .. } => 1,
            Opcode::CondBr { .. } | Opcode::Invoke { .. } => 2,
            _ => 0,
        };
        self.operands.len() + blocks
    }
}

impl Opcode {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Opcode::Call => "call",
            Opcode::Invoke { .. } => "invoke",
            Opcode::Intrinsic { .. } => "intrinsic",
            Opcode::Alloca { .. } => "alloca",
            Opcode::Load => "load",
            Opcode::Store => "store",
            Opcode::GetElementPtr { .. } => "getelementptr",
            Opcode::Binary { .. } => "binary",
            Opcode::ICmp { .. } => "icmp",
            Opcode::Cast { .. } => "cast",
            Opcode::Phi { .. } => "phi",
            Opcode::Br { .. } => "br",
            Opcode::CondBr { .. } => "condbr",
            Opcode::Ret => "ret",
            Opcode::Unreachable => "unreachable",
            Opcode::Other { name } => name,
        }
    }
}

impl Intrinsic {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Intrinsic::VaStart => "llvm.va_start",
            Intrinsic::VaCopy => "llvm.va_copy",
            Intrinsic::VaEnd => "llvm.va_end",
            Intrinsic::Other(name) => name,
        }
    }
}
