// Operand-stack limit for a method.

use crate::ir::Function;

/// Lower bound on the scanned depth, in instructions' operands.
pub const MIN_DEPTH: u32 = 8;

/// `.limit stack` for `function`: twice the larger of [`MIN_DEPTH`] and the
/// widest operand list of any instruction. Doubling covers 64-bit operands.
#[must_use]
pub fn estimate_stack_limit(function: &Function) -> u32 {
    let widest = function
        .instructions()
        .map(|instr| instr.operand_count() as u32)
        .max()
        .unwrap_or(0);
    2 * widest.max(MIN_DEPTH)
}
