//! Compilation options shared by the library drivers and the CLI.

/// Names of the runtime classes the generated code calls into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Class providing the heap primitives (`allocateStack`, `pack`,
    /// `load_*`, `store`, `createStackFrame`, `destroyStackFrame`).
    pub memory_class: String,
    /// Exception class thrown by the runtime to unwind through an `invoke`.
    pub unwind_class: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            memory_class: "lljvm/runtime/Memory".to_string(),
            unwind_class: "lljvm/runtime/System$Unwind".to_string(),
        }
    }
}

/// What the module driver does when one function fails to lower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Stop at the first failing function and return its error.
    #[default]
    Abort,
    /// Skip failing functions, keep lowering the rest, report all failures.
    Collect,
}

/// Options for one compilation run.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Class that owns every internal function and global.
    pub class_name: String,
    pub runtime: RuntimeConfig,
    /// Use `iload_0`..`iload_3` style encodings for the four lowest slots.
    pub compact_slot_forms: bool,
    /// Append `; name` comments to slot loads and stores.
    pub annotate_values: bool,
    pub error_policy: ErrorPolicy,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            class_name: "Module".to_string(),
            runtime: RuntimeConfig::default(),
            compact_slot_forms: true,
            annotate_values: true,
            error_policy: ErrorPolicy::Abort,
        }
    }
}
