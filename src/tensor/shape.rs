//! Shape utilities and edge descriptors
//!
//! Shapes are static: every dimension is a known extent.

use std::fmt;

use smallvec::SmallVec;

use super::dtype::ElementType;

/// Static tensor shape, inline for rank <= 4
pub type Shape = SmallVec<[usize; 4]>;

/// Shape and element type carried by an edge
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TensorDesc {
    /// Element type
    pub element_type: ElementType,
    /// Static shape
    pub shape: Shape,
}

impl TensorDesc {
    /// Create a descriptor from an element type and dimensions
    pub fn new(element_type: ElementType, dims: &[usize]) -> Self {
        Self {
            element_type,
            shape: dims.iter().copied().collect(),
        }
    }

    /// Scalar descriptor
    pub fn scalar(element_type: ElementType) -> Self {
        Self {
            element_type,
            shape: Shape::new(),
        }
    }

    /// Tensor rank
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements
    pub fn numel(&self) -> usize {
        numel(&self.shape)
    }

    /// Same shape with a different element type
    pub fn with_element_type(&self, element_type: ElementType) -> Self {
        Self {
            element_type,
            shape: self.shape.clone(),
        }
    }
}

impl fmt::Display for TensorDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.element_type)?;
        for (i, d) in self.shape.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", d)?;
        }
        f.write_str("]")
    }
}

/// Calculate total number of elements from shape
///
/// Graph nodes never carry a shape whose count overflows (see
/// [`checked_numel`]), so this is exact for any descriptor read from a graph.
pub fn numel(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Total number of elements, `None` on `usize` overflow
pub fn checked_numel(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

/// Product of all dimensions strictly before `axis`
pub fn outer_size(shape: &[usize], axis: usize) -> usize {
    shape[..axis.min(shape.len())].iter().product()
}

/// Product of all dimensions strictly after `axis`
pub fn inner_size(shape: &[usize], axis: usize) -> usize {
    shape.get(axis + 1..).map_or(1, |rest| rest.iter().product())
}

/// Check if two shapes are broadcastable (numpy rules)
pub fn is_broadcastable(shape_a: &[usize], shape_b: &[usize]) -> bool {
    shape_a
        .iter()
        .rev()
        .zip(shape_b.iter().rev())
        .all(|(&a, &b)| a == b || a == 1 || b == 1)
}

/// Compute broadcast output shape, `None` if incompatible
pub fn broadcast_shape(shape_a: &[usize], shape_b: &[usize]) -> Option<Shape> {
    if !is_broadcastable(shape_a, shape_b) {
        return None;
    }

    let max_len = shape_a.len().max(shape_b.len());
    let mut result: Shape = SmallVec::from_elem(1, max_len);

    for i in 0..max_len {
        // Index from the right (broadcasting aligns trailing dimensions)
        let dim_a = shape_a.len().checked_sub(i + 1).map_or(1, |k| shape_a[k]);
        let dim_b = shape_b.len().checked_sub(i + 1).map_or(1, |k| shape_b[k]);
        result[max_len - 1 - i] = if dim_a == 1 { dim_b } else { dim_a };
    }

    Some(result)
}

/// Normalize a possibly negative axis against a rank
pub fn normalize_axis(axis: i64, rank: usize) -> Option<usize> {
    let rank_i64 = rank as i64;
    let normalized = if axis < 0 { axis + rank_i64 } else { axis };

    if normalized < 0 || normalized >= rank_i64 {
        return None;
    }

    Some(normalized as usize)
}
