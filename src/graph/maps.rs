//! Node and edge types
//!
//! Identifiers, edge references and the [`Node`] record stored in the graph
//! arena.

use std::fmt;

use smallvec::SmallVec;

use crate::opset::{Attributes, OpKind};
use crate::tensor::TensorDesc;

use super::metadata::{names_of, Metadata, ORIGINAL_NAMES};

/// Stable node identifier, never reused within one graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Create an id from its raw value
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Arena index
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Reference to output `index` of this node
    pub fn output(self, index: usize) -> OutputRef {
        OutputRef { node: self, index }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Edge source: output `index` of producer `node`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputRef {
    /// Producer node
    pub node: NodeId,
    /// Output index on the producer
    pub index: usize,
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node, self.index)
    }
}

impl From<NodeId> for OutputRef {
    fn from(node: NodeId) -> Self {
        node.output(0)
    }
}

/// Edge target: input `index` of consumer `node`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputSlot {
    /// Consumer node
    pub node: NodeId,
    /// Input index on the consumer
    pub index: usize,
}

/// Inline input list
pub type InputList = SmallVec<[OutputRef; 4]>;

/// Back-edges of one output, in attachment order
pub type ConsumerList = SmallVec<[InputSlot; 4]>;

/// One output of a node
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    /// Value descriptor
    pub desc: TensorDesc,
    /// Inputs reading this output
    pub consumers: ConsumerList,
}

impl Output {
    /// Create an output without consumers
    pub fn new(desc: TensorDesc) -> Self {
        Self {
            desc,
            consumers: ConsumerList::new(),
        }
    }
}

/// A computation node
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) kind: OpKind,
    pub(crate) inputs: InputList,
    pub(crate) outputs: SmallVec<[Output; 1]>,
    pub(crate) attributes: Attributes,
    pub(crate) label: String,
    pub(crate) metadata: Metadata,
}

impl Node {
    /// Node id
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Operator kind
    pub fn kind(&self) -> OpKind {
        self.kind
    }

    /// Ordered inputs
    pub fn inputs(&self) -> &[OutputRef] {
        &self.inputs
    }

    /// Input at `index`
    pub fn input(&self, index: usize) -> Option<OutputRef> {
        self.inputs.get(index).copied()
    }

    /// Ordered outputs
    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    /// Descriptor of output `index`
    pub fn output_desc(&self, index: usize) -> Option<&TensorDesc> {
        self.outputs.get(index).map(|o| &o.desc)
    }

    /// Operator attributes
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Human-readable label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Metadata map
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Provenance list, empty when the node carries none
    pub fn original_names(&self) -> Vec<String> {
        self.metadata
            .get(ORIGINAL_NAMES)
            .map(names_of)
            .unwrap_or_default()
    }

    /// Total number of consumers over all outputs
    pub fn consumer_count(&self) -> usize {
        self.outputs.iter().map(|o| o.consumers.len()).sum()
    }

    /// Check if no output has a consumer
    pub fn has_no_consumers(&self) -> bool {
        self.outputs.iter().all(|o| o.consumers.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        let id = NodeId::new(7);
        assert_eq!(id.to_string(), "#7");
        assert_eq!(id.output(1).to_string(), "#7:1");
        assert_eq!(OutputRef::from(id), id.output(0));
    }

    #[test]
    fn test_id_ordering() {
        assert!(NodeId::new(1) < NodeId::new(2));
        assert_eq!(NodeId::new(5).index(), 5);
    }
}
