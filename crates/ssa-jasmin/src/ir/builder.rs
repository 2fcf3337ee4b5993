// Programmatic construction of IR functions: fresh value ids, blocks in
// layout order, and result types derived from operands.

use super::function::{BasicBlock, BlockId, Function, Linkage};
use super::instruction::{BinaryOp, CastOp, Instruction, IntPredicate, Intrinsic, Opcode};
use super::loops::{Loop, LoopId, LoopNest};
use super::types::Type;
use super::value::{Value, ValueId};

pub struct FunctionBuilder {
    name: String,
    params: Vec<Value>,
    ret: Type,
    variadic: bool,
    linkage: Linkage,
    blocks: Vec<BasicBlock>,
    loops: LoopNest,
    current: Option<usize>,
    next_value: u32,
}

impl FunctionBuilder {
    pub fn new(name: impl Into<String>, ret: Type) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            ret,
            variadic: false,
            linkage: Linkage::External,
            blocks: Vec::new(),
            loops: LoopNest::default(),
            current: None,
            next_value: 0,
        }
    }

    #[must_use]
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    #[must_use]
    pub fn internal(mut self) -> Self {
        self.linkage = Linkage::Internal;
        self
    }

    fn fresh_id(&mut self) -> ValueId {
        let id = ValueId(self.next_value);
        self.next_value += 1;
        id
    }

    pub fn param(&mut self, name: &str, ty: Type) -> Value {
        let id = self.fresh_id();
        let value = Value::Argument {
            id,
            name: name.to_string(),
            ty,
        };
        self.params.push(value.clone());
        value
    }

    /// Append a block and make it the insertion point.
    pub fn block(&mut self, name: &str) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(BasicBlock {
            id,
            name: name.to_string(),
            instructions: Vec::new(),
        });
        self.current = Some(self.blocks.len() - 1);
        id
    }

    /// Move the insertion point to an existing block.
    pub fn position_at(&mut self, block: BlockId) {
        self.current = self.blocks.iter().position(|b| b.id == block);
    }

    pub fn add_loop(&mut self, header: BlockId, parent: Option<LoopId>, blocks: &[BlockId]) -> LoopId {
        self.loops.add(Loop {
            header,
            parent,
            blocks: blocks.to_vec(),
        })
    }

    fn local(&mut self, name: &str, ty: Type) -> Value {
        let id = self.fresh_id();
        let name = if name.is_empty() {
            format!("t{}", id.0)
        } else {
            name.to_string()
        };
        Value::Local { id, name, ty }
    }

    /// Append an instruction; a result is created unless `ty` is void.
    pub fn push(&mut self, opcode: Opcode, operands: Vec<Value>, name: &str, ty: &Type) -> Option<Value> {
        let result = (!ty.is_void()).then(|| self.local(name, ty.clone()));
        let idx = self
            .current
            .expect("FunctionBuilder: no insertion block, call block() first");
        self.blocks[idx]
            .instructions
            .push(Instruction::new(opcode, operands, result.clone()));
        result
    }

    fn push_value(&mut self, opcode: Opcode, operands: Vec<Value>, name: &str, ty: &Type) -> Value {
        self.push(opcode, operands, name, ty)
            .expect("FunctionBuilder: value-producing instruction with void type")
    }

    pub fn call(&mut self, name: &str, callee: &Value, args: &[Value]) -> Option<Value> {
        let ret = callee.ty().as_function().map_or(Type::Void, |ft| ft.ret.clone());
        let mut operands = vec![callee.clone()];
        operands.extend_from_slice(args);
        self.push(Opcode::Call, operands, name, &ret)
    }

    pub fn invoke(
        &mut self,
        name: &str,
        callee: &Value,
        args: &[Value],
        normal: BlockId,
        unwind: BlockId,
    ) -> Option<Value> {
        let ret = callee.ty().as_function().map_or(Type::Void, |ft| ft.ret.clone());
        let mut operands = vec![callee.clone()];
        operands.extend_from_slice(args);
        self.push(Opcode::Invoke { normal, unwind }, operands, name, &ret)
    }

    pub fn intrinsic(&mut self, intrinsic: Intrinsic, args: &[Value]) {
        self.push(Opcode::Intrinsic { intrinsic }, args.to_vec(), "", &Type::Void);
    }

    pub fn alloca(&mut self, name: &str, allocated: Type) -> Value {
        let ty = Type::ptr(allocated.clone());
        self.push_value(Opcode::Alloca { allocated }, Vec::new(), name, &ty)
    }

    pub fn load(&mut self, name: &str, ptr: &Value) -> Value {
        let ty = ptr.ty().pointee().cloned().unwrap_or(Type::i32());
        self.push_value(Opcode::Load, vec![ptr.clone()], name, &ty)
    }

    pub fn store(&mut self, value: &Value, ptr: &Value) {
        self.push(Opcode::Store, vec![value.clone(), ptr.clone()], "", &Type::Void);
    }

    pub fn gep(&mut self, name: &str, source: Type, base: &Value, indices: &[Value], result: Type) -> Value {
        let mut operands = vec![base.clone()];
        operands.extend_from_slice(indices);
        self.push_value(Opcode::GetElementPtr { source }, operands, name, &result)
    }

    pub fn binary(&mut self, op: BinaryOp, name: &str, lhs: &Value, rhs: &Value) -> Value {
        let ty = lhs.ty().clone();
        self.push_value(Opcode::Binary { op }, vec![lhs.clone(), rhs.clone()], name, &ty)
    }

    pub fn icmp(&mut self, predicate: IntPredicate, name: &str, lhs: &Value, rhs: &Value) -> Value {
        self.push_value(
            Opcode::ICmp { predicate },
            vec![lhs.clone(), rhs.clone()],
            name,
            &Type::i1(),
        )
    }

    pub fn cast(&mut self, op: CastOp, name: &str, value: &Value, to: Type) -> Value {
        self.push_value(Opcode::Cast { op }, vec![value.clone()], name, &to)
    }

    pub fn phi(&mut self, name: &str, ty: Type, incoming: &[(Value, BlockId)]) -> Value {
        let (values, blocks): (Vec<_>, Vec<_>) = incoming.iter().cloned().unzip();
        self.push_value(Opcode::Phi { incoming: blocks }, values, name, &ty)
    }

    pub fn br(&mut self, dest: BlockId) {
        self.push(Opcode::Br { dest }, Vec::new(), "", &Type::Void);
    }

    pub fn cond_br(&mut self, cond: &Value, then_dest: BlockId, else_dest: BlockId) {
        self.push(
            Opcode::CondBr {
                then_dest,
                else_dest,
            },
            vec![cond.clone()],
            "",
            &Type::Void,
        );
    }

    pub fn ret(&mut self, value: Option<&Value>) {
        self.push(Opcode::Ret, value.into_iter().cloned().collect(), "", &Type::Void);
    }

    pub fn unreachable(&mut self) {
        self.push(Opcode::Unreachable, Vec::new(), "", &Type::Void);
    }

    pub fn build(self) -> Function {
        Function {
            name: self.name,
            params: self.params,
            ret: self.ret,
            variadic: self.variadic,
            linkage: self.linkage,
            blocks: self.blocks,
            loops: self.loops,
        }
    }
}
