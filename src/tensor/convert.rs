//! Constant payloads
//!
//! Compile-time constants carry their data as ndarray arrays. The engine never
//! computes with them; it only reads their descriptor.

use ndarray::{Array, ArrayD, IxDyn};

use super::dtype::ElementType;
use super::shape::TensorDesc;

/// Data held by a constant node
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantData {
    /// 32-bit float tensor
    F32(ArrayD<f32>),
    /// 64-bit integer tensor
    I64(ArrayD<i64>),
}

impl ConstantData {
    /// Element type of the payload
    pub fn element_type(&self) -> ElementType {
        match self {
            ConstantData::F32(_) => ElementType::F32,
            ConstantData::I64(_) => ElementType::I64,
        }
    }

    /// Descriptor of the edge produced by this constant
    pub fn desc(&self) -> TensorDesc {
        let dims = match self {
            ConstantData::F32(a) => a.shape(),
            ConstantData::I64(a) => a.shape(),
        };
        TensorDesc::new(self.element_type(), dims)
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        match self {
            ConstantData::F32(a) => a.len(),
            ConstantData::I64(a) => a.len(),
        }
    }

    /// Check if the payload has no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read an i64 payload as a flat vector
    pub fn to_i64_vec(&self) -> Option<Vec<i64>> {
        match self {
            ConstantData::I64(a) => Some(a.iter().copied().collect()),
            ConstantData::F32(_) => None,
        }
    }
}

/// Create a rank-0 f32 constant
pub fn scalar_f32(value: f32) -> ConstantData {
    ConstantData::F32(ArrayD::from_elem(IxDyn(&[]), value))
}

/// Create an f32 constant from a flat vector and shape
pub fn vec_to_f32(data: Vec<f32>, dims: &[usize]) -> Option<ConstantData> {
    Array::from_shape_vec(IxDyn(dims), data)
        .ok()
        .map(ConstantData::F32)
}

/// Create a 1-D i64 constant
pub fn vec_to_i64(data: Vec<i64>) -> ConstantData {
    ConstantData::I64(Array::from_vec(data).into_dyn())
}
