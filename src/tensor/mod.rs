//! Tensor descriptors
//!
//! This module provides what the engine knows about values flowing along edges:
//! - Element types (`dtype`)
//! - Static shapes and edge descriptors (`shape`)
//! - Constant payloads backed by ndarray (`convert`)
//!
//! # Example
//!
//! ```ignore
//! use graph_rewrite::tensor::{ElementType, TensorDesc};
//!
//! let desc = TensorDesc::new(ElementType::F32, &[1, 3, 224, 224]);
//! assert_eq!(desc.numel(), 3 * 224 * 224);
//! ```

pub mod convert;
pub mod dtype;
pub mod shape;

// Re-export commonly used items
pub use convert::{scalar_f32, vec_to_f32, vec_to_i64, ConstantData};
pub use dtype::ElementType;
pub use shape::{
    broadcast_shape, checked_numel, inner_size, is_broadcastable, normalize_axis, numel,
    outer_size, Shape, TensorDesc,
};
