//! Operator registry
//!
//! The engine does not know operator semantics. It consumes them through
//! [`OpSchema`] entries looked up by [`OpKind`]:
//!
//! | Query | Field |
//! |-------|-------|
//! | required input arity | [`OpSchema::arity`] |
//! | output descriptors from input descriptors | [`OpSchema::infer`] |
//! | compile-time constant | [`OpSchema::constant`] |
//!
//! # Example
//!
//! ```ignore
//! use graph_rewrite::opset::{Arity, OpKind, OpRegistry, OpSchema};
//!
//! let mut registry = OpRegistry::standard();
//! registry.register(OpSchema::new(OpKind::Custom("Gelu"), Arity::Exact(1), same_as_input));
//! ```

pub mod attributes;
pub mod standard;

use std::fmt;

use rustc_hash::FxHashMap;

use crate::tensor::TensorDesc;

pub use attributes::{AttrValue, Attributes};

/// Operator identity, compared by value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// Graph input
    Parameter,
    /// Compile-time constant
    Constant,
    /// Result sink
    Result,
    /// Concatenation along an axis
    Concat,
    /// Concatenation that only copies contiguous chunks
    ConcatOptimized,
    /// Mish activation
    Mish,
    /// Channel shuffle
    ShuffleChannels,
    /// Reshape to a static target shape
    Reshape,
    /// Axis permutation
    Transpose,
    /// Element-wise exponent
    Exp,
    /// Element-wise natural logarithm
    Log,
    /// Element-wise hyperbolic tangent
    Tanh,
    /// Broadcasting addition
    Add,
    /// Broadcasting multiplication
    Multiply,
    /// Operator supplied by the embedding compiler
    Custom(&'static str),
}

impl OpKind {
    /// Operator name
    pub fn name(&self) -> &'static str {
        match self {
            OpKind::Parameter => "Parameter",
            OpKind::Constant => "Constant",
            OpKind::Result => "Result",
            OpKind::Concat => "Concat",
            OpKind::ConcatOptimized => "ConcatOptimized",
            OpKind::Mish => "Mish",
            OpKind::ShuffleChannels => "ShuffleChannels",
            OpKind::Reshape => "Reshape",
            OpKind::Transpose => "Transpose",
            OpKind::Exp => "Exp",
            OpKind::Log => "Log",
            OpKind::Tanh => "Tanh",
            OpKind::Add => "Add",
            OpKind::Multiply => "Multiply",
            OpKind::Custom(name) => *name,
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Number of inputs an operator accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly n inputs
    Exact(usize),
    /// n or more inputs
    AtLeast(usize),
}

impl Arity {
    /// Check if `count` inputs are accepted
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

/// Output inference: input descriptors and attributes to output descriptors
///
/// An `Err` carries the operator's rejection reason.
pub type InferFn = fn(&[TensorDesc], &Attributes) -> Result<Vec<TensorDesc>, String>;

/// Everything the engine needs to know about one operator kind
#[derive(Clone, Copy)]
pub struct OpSchema {
    /// Operator kind
    pub kind: OpKind,
    /// Accepted input count
    pub arity: Arity,
    /// Output inference
    pub infer: InferFn,
    /// Whether nodes of this kind are compile-time constants
    pub constant: bool,
}

impl OpSchema {
    /// Create a non-constant schema
    pub fn new(kind: OpKind, arity: Arity, infer: InferFn) -> Self {
        Self {
            kind,
            arity,
            infer,
            constant: false,
        }
    }

    /// Mark the schema as a compile-time constant
    pub fn as_constant(mut self) -> Self {
        self.constant = true;
        self
    }
}

impl fmt::Debug for OpSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpSchema")
            .field("kind", &self.kind)
            .field("arity", &self.arity)
            .field("constant", &self.constant)
            .finish_non_exhaustive()
    }
}

/// Lookup table from operator kind to schema
#[derive(Debug, Clone, Default)]
pub struct OpRegistry {
    schemas: FxHashMap<OpKind, OpSchema>,
}

impl OpRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in operator set
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for schema in standard::schemas() {
            registry.register(schema);
        }
        registry
    }

    /// Register (or replace) a schema
    pub fn register(&mut self, schema: OpSchema) -> &mut Self {
        self.schemas.insert(schema.kind, schema);
        self
    }

    /// Look up a schema
    pub fn get(&self, kind: OpKind) -> Option<&OpSchema> {
        self.schemas.get(&kind)
    }

    /// Check if a kind is registered
    pub fn contains(&self, kind: OpKind) -> bool {
        self.schemas.contains_key(&kind)
    }

    /// Whether nodes of `kind` are compile-time constants
    pub fn is_constant(&self, kind: OpKind) -> bool {
        self.get(kind).map(|s| s.constant).unwrap_or(false)
    }

    /// Number of registered kinds
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(inputs: &[TensorDesc], _: &Attributes) -> Result<Vec<TensorDesc>, String> {
        Ok(inputs.to_vec())
    }

    #[test]
    fn test_arity_accepts() {
        assert!(Arity::Exact(2).accepts(2));
        assert!(!Arity::Exact(2).accepts(3));
        assert!(Arity::AtLeast(1).accepts(5));
        assert!(!Arity::AtLeast(1).accepts(0));
    }

    #[test]
    fn test_standard_registry() {
        let registry = OpRegistry::standard();
        assert!(registry.contains(OpKind::Concat));
        assert!(registry.contains(OpKind::ShuffleChannels));
        assert!(registry.is_constant(OpKind::Constant));
        assert!(!registry.is_constant(OpKind::Parameter));
        assert!(!registry.contains(OpKind::Custom("Gelu")));
    }

    #[test]
    fn test_register_custom() {
        let mut registry = OpRegistry::standard();
        let before = registry.len();
        registry.register(OpSchema::new(
            OpKind::Custom("Gelu"),
            Arity::Exact(1),
            identity,
        ));

        assert_eq!(registry.len(), before + 1);
        assert_eq!(
            registry.get(OpKind::Custom("Gelu")).map(|s| s.arity),
            Some(Arity::Exact(1))
        );
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(OpKind::ConcatOptimized.to_string(), "ConcatOptimized");
        assert_eq!(OpKind::Custom("Gelu").to_string(), "Gelu");
        assert_eq!(Arity::AtLeast(1).to_string(), "at least 1");
    }
}
