//! Structured Jasmin assembly.
//!
//! The backend emits [`Line`]s rather than raw text so tests can inspect the
//! output and the stack accounting in [`stack_effect`] can walk it. Each
//! `Line` variant renders through one fixed template.

mod line;
pub mod stack_effect;

pub use line::{Line, Method, Visibility, sanitize};
