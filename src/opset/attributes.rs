//! Operator attributes
//!
//! Operator-specific parameters (axis, group, target shape, constant payload)
//! attached to a node at construction.

use indexmap::IndexMap;

use crate::tensor::{ConstantData, ElementType};

/// A single attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Integer
    Int(i64),
    /// Integer list
    Ints(Vec<i64>),
    /// Float
    Float(f32),
    /// String
    Str(String),
    /// Element type
    Type(ElementType),
    /// Constant payload
    Tensor(ConstantData),
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<Vec<i64>> for AttrValue {
    fn from(v: Vec<i64>) -> Self {
        AttrValue::Ints(v)
    }
}

impl From<&[i64]> for AttrValue {
    fn from(v: &[i64]) -> Self {
        AttrValue::Ints(v.to_vec())
    }
}

impl From<f32> for AttrValue {
    fn from(v: f32) -> Self {
        AttrValue::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Str(v.to_string())
    }
}

impl From<ElementType> for AttrValue {
    fn from(v: ElementType) -> Self {
        AttrValue::Type(v)
    }
}

impl From<ConstantData> for AttrValue {
    fn from(v: ConstantData) -> Self {
        AttrValue::Tensor(v)
    }
}

/// Ordered attribute map of a node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    values: IndexMap<String, AttrValue>,
}

impl Attributes {
    /// Create an empty attribute map
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Set or update an attribute
    pub fn set(&mut self, name: &str, value: impl Into<AttrValue>) {
        self.values.insert(name.to_string(), value.into());
    }

    /// Get attribute by name
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.values.get(name)
    }

    /// Check if attribute exists
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Get attribute value as i64
    pub fn get_int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            AttrValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get attribute value as i64 list
    pub fn get_ints(&self, name: &str) -> Option<&[i64]> {
        match self.get(name)? {
            AttrValue::Ints(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Get attribute value as f32
    pub fn get_float(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            AttrValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Get attribute value as string
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            AttrValue::Str(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Get attribute value as element type
    pub fn get_type(&self, name: &str) -> Option<ElementType> {
        match self.get(name)? {
            AttrValue::Type(v) => Some(*v),
            _ => None,
        }
    }

    /// Get attribute value as constant payload
    pub fn get_tensor(&self, name: &str) -> Option<&ConstantData> {
        match self.get(name)? {
            AttrValue::Tensor(v) => Some(v),
            _ => None,
        }
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}
