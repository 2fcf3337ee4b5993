// Per-function Jasmin emitter.
//
// Owns everything that lives for exactly one function compilation: the slot
// table, the output lines, block labels and the fresh-label counter. A new
// emitter is built for every function, so no state leaks between methods.

use std::collections::{HashMap, HashSet};

use crate::codec::{JvmTypeCodec, TypeCodec};
use crate::ir::{BasicBlock, BlockId, Externals, Function, Value};
use crate::jasm::{Line, sanitize};
use crate::options::CompileOptions;
use crate::{Error, Result};

use super::control_flow::{DefaultLoopLowering, LoopLowering};
use super::slots::SlotAllocator;

/// Label opening every method body; all locals are scoped from here.
pub const BEGIN_METHOD: &str = "begin_method";
/// Label closing every method body.
pub const END_METHOD: &str = "end_method";
/// Local name of the variadic-argument-list slot.
pub const VARARGS_NAME: &str = "varargptr";

/// Read-only inputs shared by all functions of one compilation unit.
pub struct LoweringContext<'a> {
    pub options: &'a CompileOptions,
    pub codec: &'a dyn TypeCodec,
    pub loop_lowering: &'a dyn LoopLowering,
    /// Symbols defined outside this unit.
    pub externals: Externals,
}

impl<'a> LoweringContext<'a> {
    pub fn new(options: &'a CompileOptions, externals: Externals) -> Self {
        Self {
            options,
            codec: &JvmTypeCodec,
            loop_lowering: &DefaultLoopLowering,
            externals,
        }
    }

    #[must_use]
    pub fn with_codec(mut self, codec: &'a dyn TypeCodec) -> Self {
        self.codec = codec;
        self
    }

    #[must_use]
    pub fn with_loop_lowering(mut self, loop_lowering: &'a dyn LoopLowering) -> Self {
        self.loop_lowering = loop_lowering;
        self
    }

    /// Symbol reference for a function or global: external symbols are used
    /// as-is, internal ones are qualified by the unit's class.
    pub fn qualify(&self, name: &str) -> String {
        if self.externals.contains(name) {
            name.to_string()
        } else {
            format!("{}/{}", self.options.class_name, sanitize(name))
        }
    }
}

/// Jasmin emitter for a single function.
pub struct JasminEmitter<'a> {
    pub(crate) ctx: &'a LoweringContext<'a>,
    function: &'a Function,
    pub(crate) slots: SlotAllocator,
    pub(crate) lines: Vec<Line>,
    block_labels: HashMap<BlockId, String>,
    current_block: Option<BlockId>,
    next_label: u32,
}

impl<'a> JasminEmitter<'a> {
    pub fn new(ctx: &'a LoweringContext<'a>, function: &'a Function) -> Self {
        let mut taken = HashSet::new();
        let mut block_labels = HashMap::new();
        for block in &function.blocks {
            let stem = if block.name.is_empty() {
                format!("label_{}", block.id.0)
            } else {
                format!("label_{}", sanitize(&block.name))
            };
            let mut label = stem.clone();
            let mut suffix = block.id.0;
            while !taken.insert(label.clone()) {
                label = format!("{stem}_{suffix}");
                suffix += 1;
            }
            block_labels.insert(block.id, label);
        }
        Self {
            ctx,
            function,
            slots: SlotAllocator::new(),
            lines: Vec::new(),
            block_labels,
            current_block: None,
            next_label: 0,
        }
    }

    pub fn function(&self) -> &'a Function {
        self.function
    }

    pub fn codec(&self) -> &'a dyn TypeCodec {
        self.ctx.codec
    }

    pub fn options(&self) -> &'a CompileOptions {
        self.ctx.options
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn emit(&mut self, line: Line) {
        self.lines.push(line);
    }

    pub fn insn(&mut self, op: &str) {
        self.emit(Line::insn(op));
    }

    pub fn insn_with(&mut self, op: &str, operand: impl Into<String>) {
        self.emit(Line::insn_with(op, operand));
    }

    pub fn define_label(&mut self, name: impl Into<String>) {
        self.emit(Line::Label(name.into()));
    }

    /// A label unique within this method, e.g. `invoke3`.
    pub fn fresh_label(&mut self, stem: &str) -> String {
        let label = format!("{stem}{}", self.next_label);
        self.next_label += 1;
        label
    }

    pub fn block(&self, id: BlockId) -> Result<&'a BasicBlock> {
        self.function
            .block(id)
            .ok_or_else(|| Error::Internal(format!("reference to unknown block {}", id.0)))
    }

    pub fn block_label(&self, id: BlockId) -> Result<String> {
        self.block_labels
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::Internal(format!("no label for block {}", id.0)))
    }

    pub fn current_block(&self) -> Result<BlockId> {
        self.current_block
            .ok_or_else(|| Error::Internal("instruction lowered outside a block".into()))
    }

    pub(crate) fn set_current_block(&mut self, id: BlockId) {
        self.current_block = Some(id);
    }

    /// Emit `invokestatic <memory class>/<method>`.
    pub fn runtime_call(&mut self, method: &str) {
        let target = format!("{}/{method}", self.ctx.options.runtime.memory_class);
        self.insn_with("invokestatic", target);
    }

    /// Slot of a local or argument, allocating on first use.
    pub fn slot_for(&mut self, value: &Value) -> Result<u32> {
        let id = value
            .slot_id()
            .ok_or_else(|| Error::Internal(format!("value {value} has no local slot")))?;
        Ok(self.slots.slot_of(id, value.ty().is_wide()))
    }

    /// Trailing comment naming `value`, when annotations are enabled.
    pub(crate) fn value_comment(&self, value: &Value) -> Option<String> {
        if self.ctx.options.annotate_values {
            value.name().filter(|name| !name.is_empty()).map(sanitize)
        } else {
            None
        }
    }

    pub(crate) fn into_lines(self) -> Vec<Line> {
        self.lines
    }
}
