// SSA IR backend: lowers IR functions into Jasmin methods.
//
// This module is organized into submodules:
// - `emitter`: per-function JasminEmitter and the shared LoweringContext
// - `slots`: local-variable slot allocation
// - `values`: pushing values and storing results
// - `constants`: literal pushes and constant expressions
// - `memory`: heap loads/stores, stack allocation, element addresses
// - `calls`: direct calls and variadic argument packing
// - `intrinsics`: va_start / va_copy / va_end
// - `alu`: arithmetic, comparisons, conversions
// - `control_flow`: blocks, loops, branches, phi copies, return, invoke
// - `stack`: the `.limit stack` estimate

mod alu;
mod calls;
mod constants;
mod control_flow;
mod emitter;
mod intrinsics;
mod memory;
pub(crate) mod slots;
mod stack;
mod values;

pub use calls::call_signature;
pub use control_flow::{DefaultLoopLowering, LoopLowering};
pub use emitter::{BEGIN_METHOD, END_METHOD, JasminEmitter, LoweringContext, VARARGS_NAME};
pub use memory::{
    emit_indirect_load, emit_indirect_load_type, emit_indirect_store, emit_indirect_store_type,
};
pub use stack::{MIN_DEPTH, estimate_stack_limit};
pub use values::{emit_load, emit_store};

use tracing::{debug, trace, warn};

use crate::ir::{Function, Instruction, Linkage, Module, Opcode, Value};
use crate::jasm::{Line, Method, Visibility, sanitize, stack_effect};
use crate::options::{CompileOptions, ErrorPolicy};
use crate::{Error, Result};

/// One lowered method.
#[derive(Debug, Clone)]
pub struct LoweredFunction {
    /// IR name of the function.
    pub name: String,
    pub lines: Vec<Line>,
    /// Value emitted as `.limit stack`.
    pub max_stack: u32,
    /// Value emitted as `.limit locals`.
    pub max_locals: u32,
}

impl LoweredFunction {
    #[must_use]
    pub fn method(&self) -> Method {
        Method {
            lines: self.lines.clone(),
        }
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.method().to_string()
    }
}

/// Result of lowering a whole module.
#[derive(Debug, Default)]
pub struct ModuleOutput {
    pub functions: Vec<LoweredFunction>,
    /// Functions skipped under [`ErrorPolicy::Collect`], as `Error::Function`.
    pub failures: Vec<Error>,
}

impl ModuleOutput {
    /// All methods, in module order.
    #[must_use]
    pub fn text(&self) -> String {
        self.functions.iter().map(LoweredFunction::text).collect()
    }
}

fn var_line(slot: u32, name: &str, descriptor: String) -> Line {
    let name = if name.is_empty() {
        format!("v{slot}")
    } else {
        sanitize(name)
    };
    Line::Var {
        slot,
        name,
        descriptor,
        from: BEGIN_METHOD.to_string(),
        to: END_METHOD.to_string(),
    }
}

fn declare_value(e: &mut JasminEmitter<'_>, value: &Value) -> Result<()> {
    let slot = e.slot_for(value)?;
    let descriptor = e.codec().descriptor(value.ty())?;
    let line = var_line(slot, value.name().unwrap_or_default(), descriptor);
    e.emit(line);
    Ok(())
}

/// Lower one function definition into a Jasmin method.
pub fn lower_function(ctx: &LoweringContext<'_>, function: &Function) -> Result<LoweredFunction> {
    if function.is_declaration() {
        return Err(Error::Internal(format!(
            "{} is a declaration and has no body",
            function.name
        )));
    }
    let mut e = JasminEmitter::new(ctx, function);

    let visibility = match function.linkage {
        Linkage::External => Visibility::Public,
        Linkage::Internal => Visibility::Private,
    };
    let signature = call_signature(ctx.codec, &function.function_type())?;
    e.emit(Line::MethodBegin {
        visibility,
        name: sanitize(&function.name),
        signature,
    });

    // Parameters first, then the variadic list, every local, and phi scratch.
    for param in &function.params {
        declare_value(&mut e, param)?;
    }
    if function.variadic {
        let slot = e.slots.reserve_variadic_slot();
        e.emit(var_line(slot, VARARGS_NAME, "I".to_string()));
    }
    for instr in function.instructions() {
        if let Some(result) = &instr.result {
            declare_value(&mut e, result)?;
        }
    }
    let scratch = control_flow::phi_scratch_width(function)?;
    if scratch > 0 {
        e.slots.reserve_scratch(scratch);
    }

    let max_stack = estimate_stack_limit(function);
    let max_locals = e.slots.used();
    e.emit(Line::LimitStack(max_stack));
    e.emit(Line::LimitLocals(max_locals));

    e.define_label(BEGIN_METHOD);
    for instr in function.instructions() {
        if let (Opcode::Alloca { .. }, Some(result)) = (&instr.opcode, &instr.result) {
            memory::emit_alloca_zero_init(&mut e, result)?;
        }
    }
    e.runtime_call("createStackFrame()V");

    e.lower_body()?;

    e.define_label(END_METHOD);
    e.emit(Line::MethodEnd);

    match stack_effect::peak_depth(e.lines()) {
        Ok(peak) if peak > max_stack => warn!(
            function = %function.name,
            peak,
            max_stack,
            "simulated stack depth exceeds the estimated limit"
        ),
        Ok(peak) => debug!(
            function = %function.name,
            slots = max_locals,
            max_stack,
            peak,
            "lowered function"
        ),
        Err(err) => warn!(function = %function.name, %err, "stack simulation failed"),
    }

    Ok(LoweredFunction {
        name: function.name.clone(),
        lines: e.into_lines(),
        max_stack,
        max_locals,
    })
}

/// Lower a single instruction.
fn lower_instruction(e: &mut JasminEmitter<'_>, instr: &Instruction) -> Result<()> {
    use alu::{lower_binary, lower_cast, lower_icmp};
    use calls::lower_call_instruction;
    use control_flow::{lower_br, lower_cond_br, lower_invoke, lower_return, lower_unreachable};
    use intrinsics::lower_intrinsic;
    use memory::{lower_alloca, lower_gep, lower_load, lower_store};

    trace!(opcode = instr.opcode.name(), "lowering instruction");
    match &instr.opcode {
        Opcode::Call => lower_call_instruction(e, instr),
        Opcode::Invoke { normal, unwind } => lower_invoke(e, instr, *normal, *unwind),
        Opcode::Intrinsic { intrinsic } => lower_intrinsic(e, instr, intrinsic),

        Opcode::Alloca { allocated } => lower_alloca(e, instr, allocated),
        Opcode::Load => lower_load(e, instr),
        Opcode::Store => lower_store(e, instr),
        Opcode::GetElementPtr { source } => lower_gep(e, instr, source),

        Opcode::Binary { op } => lower_binary(e, instr, *op),
        Opcode::ICmp { predicate } => lower_icmp(e, instr, *predicate),
        Opcode::Cast { op } => lower_cast(e, instr, *op),

        // Phi nodes: copies are emitted by the predecessors' terminators.
        Opcode::Phi { .. } => Ok(()),
        Opcode::Br { dest } => lower_br(e, *dest),
        Opcode::CondBr {
            then_dest,
            else_dest,
        } => lower_cond_br(e, instr, *then_dest, *else_dest),
        Opcode::Ret => lower_return(e, instr),
        Opcode::Unreachable => {
            lower_unreachable(e);
            Ok(())
        }

        Opcode::Other { name } => Err(Error::UnsupportedConstruct(format!("opcode {name}"))),
    }
}

/// Lower every defined function of `module` with the default codec and
/// loop lowering.
pub fn compile_module(module: &Module, options: &CompileOptions) -> Result<ModuleOutput> {
    let ctx = LoweringContext::new(options, module.externals());
    compile_module_with(module, &ctx)
}

/// Lower every defined function of `module` with an explicit context.
pub fn compile_module_with(module: &Module, ctx: &LoweringContext<'_>) -> Result<ModuleOutput> {
    let mut output = ModuleOutput::default();
    for function in module.functions.iter().filter(|f| !f.is_declaration()) {
        match lower_function(ctx, function) {
            Ok(lowered) => output.functions.push(lowered),
            Err(err) => {
                let err = Error::Function {
                    name: function.name.clone(),
                    source: Box::new(err),
                };
                match ctx.options.error_policy {
                    ErrorPolicy::Abort => return Err(err),
                    ErrorPolicy::Collect => {
                        warn!(%err, "skipping function");
                        output.failures.push(err);
                    }
                }
            }
        }
    }
    debug!(
        functions = output.functions.len(),
        failures = output.failures.len(),
        "module lowered"
    );
    Ok(output)
}
