//! Element type descriptors
//!
//! The engine only needs element types for equality checks between edges,
//! so the set is small and closed.

use std::fmt;

/// Element type carried by an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// 32-bit float
    F32,
    /// 16-bit float
    F16,
    /// 64-bit signed integer
    I64,
    /// 32-bit signed integer
    I32,
    /// 8-bit unsigned integer
    U8,
    /// Boolean
    Bool,
}

impl ElementType {
    /// Size in bytes of one element
    pub fn size(self) -> usize {
        match self {
            ElementType::F32 | ElementType::I32 => 4,
            ElementType::F16 => 2,
            ElementType::I64 => 8,
            ElementType::U8 | ElementType::Bool => 1,
        }
    }

    /// Check if the type is floating point
    pub fn is_float(self) -> bool {
        matches!(self, ElementType::F32 | ElementType::F16)
    }

    /// Check if the type is an integer
    pub fn is_int(self) -> bool {
        matches!(self, ElementType::I64 | ElementType::I32 | ElementType::U8)
    }

    /// Short lowercase name (`f32`, `i64`, ...)
    pub fn name(self) -> &'static str {
        match self {
            ElementType::F32 => "f32",
            ElementType::F16 => "f16",
            ElementType::I64 => "i64",
            ElementType::I32 => "i32",
            ElementType::U8 => "u8",
            ElementType::Bool => "bool",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
