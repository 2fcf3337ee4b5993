// Control flow: block and loop emission, branches, phi copies, return,
// unreachable, and invoke with its protected region.

use tracing::trace;

use crate::ir::{BlockId, Function, Instruction, LoopId, Opcode, Value, ValueId};
use crate::jasm::Line;
use crate::{Error, Result};

use super::calls::{finish_call, lower_call};
use super::emitter::JasminEmitter;
use super::values::{emit_load, emit_slot_access, emit_store};

/// Emits the whole construct of one top-level loop.
pub trait LoopLowering {
    fn lower_loop(&self, e: &mut JasminEmitter<'_>, id: LoopId) -> Result<()>;
}

/// Emits a loop as plain labelled blocks: the header first, then the
/// remaining member blocks (nested loops included) in layout order.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLoopLowering;

impl LoopLowering for DefaultLoopLowering {
    fn lower_loop(&self, e: &mut JasminEmitter<'_>, id: LoopId) -> Result<()> {
        let function = e.function();
        let lp = function
            .loops
            .get(id)
            .ok_or_else(|| Error::Internal(format!("unknown loop {}", id.0)))?;
        trace!(loop_id = id.0, header = lp.header.0, "lowering loop");
        e.lower_block(lp.header)?;
        for block in &function.blocks {
            if block.id != lp.header && function.loops.contains(id, block.id) {
                e.lower_block(block.id)?;
            }
        }
        Ok(())
    }
}

impl JasminEmitter<'_> {
    /// Emit a block's label followed by its instructions.
    pub fn lower_block(&mut self, id: BlockId) -> Result<()> {
        let block = self.block(id)?;
        let label = self.block_label(id)?;
        self.define_label(label);
        self.set_current_block(id);
        for instr in &block.instructions {
            super::lower_instruction(self, instr)?;
        }
        Ok(())
    }

    /// Emit every block in layout order. A top-level loop header hands its
    /// whole loop to the loop lowerer; other loop members are skipped here.
    pub fn lower_body(&mut self) -> Result<()> {
        let function = self.function();
        let loop_lowering = self.ctx.loop_lowering;
        for block in &function.blocks {
            if let Some(id) = function.loops.top_level_header(block.id) {
                loop_lowering.lower_loop(self, id)?;
            } else if function.loops.loop_for(block.id).is_none() {
                self.lower_block(block.id)?;
            }
        }
        Ok(())
    }
}

/// `(incoming value, phi result)` pairs for the edge `from -> to`.
fn phi_copies(function: &Function, from: BlockId, to: BlockId) -> Result<Vec<(&Value, &Value)>> {
    let block = function
        .block(to)
        .ok_or_else(|| Error::Internal(format!("reference to unknown block {}", to.0)))?;
    let mut copies = Vec::new();
    for instr in &block.instructions {
        let Opcode::Phi { incoming } = &instr.opcode else {
            break;
        };
        let Some(index) = incoming.iter().position(|&b| b == from) else {
            continue;
        };
        let result = instr
            .result
            .as_ref()
            .ok_or_else(|| Error::Internal("phi without a result".into()))?;
        copies.push((instr.operand(index)?, result));
    }
    Ok(copies)
}

/// Incoming values whose slot an earlier copy of the same edge overwrites.
/// These are saved to scratch slots before any phi is written.
fn staged_sources<'f>(copies: &[(&'f Value, &'f Value)]) -> Vec<&'f Value> {
    let mut staged: Vec<&Value> = Vec::new();
    for (index, (value, _)) in copies.iter().enumerate() {
        let Some(id) = value.slot_id() else {
            continue;
        };
        let overwritten = copies[..index]
            .iter()
            .any(|(_, result)| result.slot_id() == Some(id));
        if overwritten && !staged.iter().any(|v| v.slot_id() == Some(id)) {
            staged.push(value);
        }
    }
    staged
}

fn slot_width(value: &Value) -> u32 {
    if value.ty().is_wide() { 2 } else { 1 }
}

/// Scratch slots needed by the widest staged edge of `function`.
pub(crate) fn phi_scratch_width(function: &Function) -> Result<u32> {
    let mut widest = 0;
    for block in &function.blocks {
        let mut preds: Vec<BlockId> = Vec::new();
        for instr in &block.instructions {
            let Opcode::Phi { incoming } = &instr.opcode else {
                break;
            };
            for &pred in incoming {
                if !preds.contains(&pred) {
                    preds.push(pred);
                }
            }
        }
        for from in preds {
            let copies = phi_copies(function, from, block.id)?;
            let width: u32 = staged_sources(&copies).into_iter().map(slot_width).sum();
            widest = widest.max(width);
        }
    }
    Ok(widest)
}

/// Copy incoming values into the phi slots of `to`, one value on the stack
/// at a time. Sources clobbered by an earlier copy are read from scratch.
fn emit_phi_copies(e: &mut JasminEmitter<'_>, from: BlockId, to: BlockId) -> Result<()> {
    let copies = phi_copies(e.function(), from, to)?;
    let staged = staged_sources(&copies);

    let mut saved: Vec<(ValueId, u32)> = Vec::with_capacity(staged.len());
    if !staged.is_empty() {
        let mut slot = e
            .slots
            .scratch_base()
            .ok_or_else(|| Error::Internal("phi scratch slots were not reserved".into()))?;
        for value in staged {
            let prefix = e.codec().load_store_prefix(value.ty())?;
            emit_load(e, value)?;
            emit_slot_access(e, prefix, "store", slot, None);
            if let Some(id) = value.slot_id() {
                saved.push((id, slot));
            }
            slot += slot_width(value);
        }
    }

    for (value, result) in copies {
        let scratch = value
            .slot_id()
            .and_then(|id| saved.iter().find(|(s, _)| *s == id))
            .map(|&(_, slot)| slot);
        match scratch {
            Some(slot) => {
                let prefix = e.codec().load_store_prefix(value.ty())?;
                let comment = e.value_comment(value);
                emit_slot_access(e, prefix, "load", slot, comment);
            }
            None => emit_load(e, value)?,
        }
        emit_store(e, result)?;
    }
    Ok(())
}

fn has_phi_from(e: &JasminEmitter<'_>, from: BlockId, to: BlockId) -> Result<bool> {
    Ok(!phi_copies(e.function(), from, to)?.is_empty())
}

fn emit_jump(e: &mut JasminEmitter<'_>, dest: BlockId) -> Result<()> {
    let label = e.block_label(dest)?;
    e.insn_with("goto", label);
    Ok(())
}

pub fn lower_br(e: &mut JasminEmitter<'_>, dest: BlockId) -> Result<()> {
    let current = e.current_block()?;
    emit_phi_copies(e, current, dest)?;
    emit_jump(e, dest)
}

pub fn lower_cond_br(
    e: &mut JasminEmitter<'_>,
    instr: &Instruction,
    then_dest: BlockId,
    else_dest: BlockId,
) -> Result<()> {
    let current = e.current_block()?;
    emit_load(e, instr.operand(0)?)?;

    if !has_phi_from(e, current, then_dest)? && !has_phi_from(e, current, else_dest)? {
        let then_label = e.block_label(then_dest)?;
        e.insn_with("ifne", then_label);
        return emit_jump(e, else_dest);
    }

    // Per-edge phi copies: the taken edge goes through a trampoline.
    let trampoline = e.fresh_label("edge");
    e.insn_with("ifne", trampoline.clone());
    emit_phi_copies(e, current, else_dest)?;
    emit_jump(e, else_dest)?;
    e.define_label(trampoline);
    emit_phi_copies(e, current, then_dest)?;
    emit_jump(e, then_dest)
}

pub fn lower_return(e: &mut JasminEmitter<'_>, instr: &Instruction) -> Result<()> {
    e.runtime_call("destroyStackFrame()V");
    match instr.operands.first() {
        Some(value) => {
            let prefix = e.codec().load_store_prefix(value.ty())?;
            emit_load(e, value)?;
            e.insn(&format!("{prefix}return"));
        }
        None => e.insn("return"),
    }
    Ok(())
}

pub fn lower_unreachable(e: &mut JasminEmitter<'_>) {
    e.insn("aconst_null");
    e.insn("athrow");
}

/// Stages of an invoke. Both dispatch stages end the instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InvokeStage {
    Begin,
    DispatchNormal,
    DispatchCatch,
}

impl InvokeStage {
    fn next(self) -> Option<Self> {
        match self {
            InvokeStage::Begin => Some(InvokeStage::DispatchNormal),
            InvokeStage::DispatchNormal => Some(InvokeStage::DispatchCatch),
            InvokeStage::DispatchCatch => None,
        }
    }
}

/// Lower an invoke: the call sits in a region guarded by one handler for
/// the runtime's unwind exception.
pub fn lower_invoke(
    e: &mut JasminEmitter<'_>,
    instr: &Instruction,
    normal: BlockId,
    unwind: BlockId,
) -> Result<()> {
    let current = e.current_block()?;
    let callee = instr.operand(0)?;
    let stem = e.fresh_label("invoke");
    let begin = format!("{stem}_begin");
    let end = format!("{stem}_end");
    let catch = format!("{stem}_catch");

    let mut stage = Some(InvokeStage::Begin);
    while let Some(current_stage) = stage {
        match current_stage {
            InvokeStage::Begin => {
                e.define_label(begin.clone());
                lower_call(e, callee, instr)?;
            }
            InvokeStage::DispatchNormal => {
                finish_call(e, callee, instr.result.as_ref())?;
                e.define_label(end.clone());
                emit_phi_copies(e, current, normal)?;
                emit_jump(e, normal)?;
            }
            InvokeStage::DispatchCatch => {
                e.define_label(catch.clone());
                e.insn("pop");
                emit_phi_copies(e, current, unwind)?;
                emit_jump(e, unwind)?;
                let class = e.options().runtime.unwind_class.clone();
                e.emit(Line::Catch {
                    class,
                    from: begin.clone(),
                    to: end.clone(),
                    using: catch.clone(),
                });
            }
        }
        stage = current_stage.next();
    }
    Ok(())
}
