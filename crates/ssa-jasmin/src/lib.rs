#![allow(
    clippy::cast_possible_truncation, // slot numbers and stack depths are u32, IR counts are usize
    clippy::cast_possible_wrap,       // byte sizes are pushed as JVM int literals
    clippy::missing_errors_doc        // every lowering entry point returns the same crate Error
)]

pub mod backend;
pub mod codec;
pub mod error;
pub mod ir;
pub mod jasm;
pub mod options;

/// Test harness module for writing unit and integration tests.
///
/// This module is only available when running tests or when the
/// `test-harness` feature is enabled.
#[cfg(any(test, feature = "test-harness"))]
pub mod test_harness;

pub use backend::{
    DefaultLoopLowering, JasminEmitter, LoopLowering, LoweredFunction, LoweringContext,
    ModuleOutput, compile_module, compile_module_with, lower_function,
};
pub use codec::{JvmTypeCodec, TypeCodec};
pub use error::{Error, Result};
pub use options::{CompileOptions, ErrorPolicy, RuntimeConfig};
