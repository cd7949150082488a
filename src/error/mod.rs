//! Error types for graph-rewrite
//!
//! This module defines all error types used throughout the crate.
//!
//! Rule legality failures are not errors: a rule that declines returns
//! `Ok(false)`. Iteration-bound exhaustion is reported through
//! [`PassState::BoundExceeded`](crate::transform::PassState), not here.

use thiserror::Error;

use crate::graph::{NodeId, OutputRef};
use crate::opset::{Arity, OpKind};
use crate::tensor::TensorDesc;

/// Violation of a graph invariant
///
/// Always fatal: it means the engine itself produced a corrupted graph,
/// or a rewrite would have.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructuralError {
    /// An input edge targets an output that does not exist
    #[error("dangling edge: input {input} of node {consumer} targets missing output {target}")]
    DanglingEdge {
        /// Consuming node
        consumer: NodeId,
        /// Input index on the consumer
        input: usize,
        /// Missing output
        target: OutputRef,
    },

    /// The graph (or a requested rewrite) contains a cycle
    #[error("cycle detected through node {node}")]
    Cycle {
        /// A node on the cycle
        node: NodeId,
    },

    /// A forward edge and its recorded back-edge disagree
    #[error("back-edge of output {output} does not match input {input} of node {consumer}")]
    BrokenBackEdge {
        /// Producer output
        output: OutputRef,
        /// Consuming node
        consumer: NodeId,
        /// Input index on the consumer
        input: usize,
    },

    /// A registered result node is not live
    #[error("result node {0} is missing")]
    MissingResult(NodeId),

    /// A live node does not reach any result
    #[error("node {0} is not reachable from any result")]
    Unreachable(NodeId),
}

/// Main error type for graph construction and rewriting
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RewriteError {
    /// Input count does not fit the operator's arity
    #[error("{kind} expects {expected} inputs, got {actual}")]
    InvalidInputArity {
        /// Operator kind
        kind: OpKind,
        /// Accepted arity
        expected: Arity,
        /// Supplied input count
        actual: usize,
    },

    /// Operator rejected its parameters or input shapes
    #[error("invalid parameter for {kind}: {reason}")]
    InvalidParameter {
        /// Operator kind
        kind: OpKind,
        /// Rejection reason from the operator
        reason: String,
    },

    /// Replacement output descriptor differs from the replaced one
    #[error("shape mismatch at output {index}: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Output index on the replaced node
        index: usize,
        /// Descriptor of the replaced output
        expected: TensorDesc,
        /// Descriptor of the replacement output
        actual: TensorDesc,
    },

    /// Replacement provides a different number of outputs
    #[error("arity mismatch: node has {expected} outputs, replacement provides {actual}")]
    ArityMismatch {
        /// Output count of the replaced node
        expected: usize,
        /// Number of replacement outputs
        actual: usize,
    },

    /// Output reference does not point at a live output
    #[error("output {0} does not exist")]
    InvalidOutput(OutputRef),

    /// Node id is not live
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    /// Operator kind has no schema in the registry
    #[error("operator {0} is not registered")]
    UnknownOp(OpKind),

    /// Result sinks cannot be replaced
    #[error("result node {0} cannot be replaced")]
    ResultReplacement(NodeId),

    /// Graph invariant violation
    #[error("structural invariant violated: {0}")]
    Structural(#[from] StructuralError),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RewriteError {
    /// Whether the error indicates a corrupted (or about to be corrupted) graph
    pub fn is_structural(&self) -> bool {
        matches!(self, RewriteError::Structural(_))
    }
}

/// Result type alias for graph operations
pub type RewriteResult<T> = Result<T, RewriteError>;
