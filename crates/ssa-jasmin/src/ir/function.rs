use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::instruction::Instruction;
use super::loops::LoopNest;
use super::types::{FunctionType, Type};
use super::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u32);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicBlock {
    pub id: BlockId,
    pub name: String,
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Linkage {
    #[default]
    External,
    Internal,
}

/// A function definition, or a declaration when `blocks` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    /// Formal parameters, each a `Value::Argument`.
    pub params: Vec<Value>,
    pub ret: Type,
    #[serde(default)]
    pub variadic: bool,
    #[serde(default)]
    pub linkage: Linkage,
    /// Basic blocks in layout order; the first is the entry block.
    #[serde(default)]
    pub blocks: Vec<BasicBlock>,
    /// Precomputed loop structure of `blocks`.
    #[serde(default)]
    pub loops: LoopNest,
}

impl Function {
    #[must_use]
    pub fn function_type(&self) -> FunctionType {
        FunctionType {
            params: self.params.iter().map(|p| p.ty().clone()).collect(),
            ret: self.ret.clone(),
            variadic: self.variadic,
        }
    }

    #[must_use]
    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.blocks.iter().flat_map(|b| b.instructions.iter())
    }

    /// A `Value::Function` referring to this function.
    #[must_use]
    pub fn as_value(&self) -> Value {
        Value::function(self.name.clone(), self.function_type())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalDecl {
    pub name: String,
    pub ty: Type,
    /// Defined in another compilation unit.
    #[serde(default)]
    pub external: bool,
}

/// A compilation unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Module {
    #[serde(default)]
    pub functions: Vec<Function>,
    #[serde(default)]
    pub globals: Vec<GlobalDecl>,
}

impl Module {
    /// Symbols defined outside this unit: function declarations and globals
    /// marked external.
    #[must_use]
    pub fn externals(&self) -> Externals {
        let mut externals = Externals::default();
        for f in self.functions.iter().filter(|f| f.is_declaration()) {
            externals.insert(f.name.clone());
        }
        for g in self.globals.iter().filter(|g| g.external) {
            externals.insert(g.name.clone());
        }
        externals
    }
}

/// External/internal classification of symbols.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Externals(HashSet<String>);

impl Externals {
    pub fn insert(&mut self, name: impl Into<String>) {
        self.0.insert(name.into());
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }
}

impl<S: Into<String>> FromIterator<S> for Externals {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
