//! Built-in operator schemas
//!
//! Shape inference for the operators the bundled rewrite rules produce and
//! consume. Each function validates its parameters and returns the output
//! descriptors, or the reason the operator rejects them.

use crate::tensor::{broadcast_shape, checked_numel, normalize_axis, Shape, TensorDesc};

use super::{Arity, Attributes, OpKind, OpSchema};

/// All built-in schemas
pub fn schemas() -> Vec<OpSchema> {
    vec![
        OpSchema::new(OpKind::Parameter, Arity::Exact(0), infer_parameter),
        OpSchema::new(OpKind::Constant, Arity::Exact(0), infer_constant).as_constant(),
        OpSchema::new(OpKind::Result, Arity::Exact(1), infer_result),
        OpSchema::new(OpKind::Concat, Arity::AtLeast(1), infer_concat),
        OpSchema::new(OpKind::ConcatOptimized, Arity::AtLeast(1), infer_concat),
        OpSchema::new(OpKind::Mish, Arity::Exact(1), infer_float_unary),
        OpSchema::new(OpKind::Exp, Arity::Exact(1), infer_float_unary),
        OpSchema::new(OpKind::Log, Arity::Exact(1), infer_float_unary),
        OpSchema::new(OpKind::Tanh, Arity::Exact(1), infer_float_unary),
        OpSchema::new(OpKind::Add, Arity::Exact(2), infer_broadcast_binary),
        OpSchema::new(OpKind::Multiply, Arity::Exact(2), infer_broadcast_binary),
        OpSchema::new(
            OpKind::ShuffleChannels,
            Arity::Exact(1),
            infer_shuffle_channels,
        ),
        OpSchema::new(OpKind::Reshape, Arity::Exact(1), infer_reshape),
        OpSchema::new(OpKind::Transpose, Arity::Exact(1), infer_transpose),
    ]
}

fn infer_parameter(_: &[TensorDesc], attrs: &Attributes) -> Result<Vec<TensorDesc>, String> {
    let element_type = attrs
        .get_type("element_type")
        .ok_or("missing 'element_type'")?;
    let dims = attrs.get_ints("shape").ok_or("missing 'shape'")?;
    let shape = to_static_shape(dims)?;

    Ok(vec![TensorDesc {
        element_type,
        shape,
    }])
}

fn infer_constant(_: &[TensorDesc], attrs: &Attributes) -> Result<Vec<TensorDesc>, String> {
    let value = attrs.get_tensor("value").ok_or("missing 'value'")?;
    Ok(vec![value.desc()])
}

fn infer_result(_: &[TensorDesc], _: &Attributes) -> Result<Vec<TensorDesc>, String> {
    Ok(Vec::new())
}

fn infer_concat(inputs: &[TensorDesc], attrs: &Attributes) -> Result<Vec<TensorDesc>, String> {
    let first = inputs.first().ok_or("no inputs")?;
    let axis = attrs.get_int("axis").ok_or("missing 'axis'")?;
    let axis = normalize_axis(axis, first.rank())
        .ok_or_else(|| format!("axis {} out of range for rank {}", axis, first.rank()))?;

    let mut shape = first.shape.clone();
    for (i, input) in inputs.iter().enumerate().skip(1) {
        if input.element_type != first.element_type {
            return Err(format!(
                "input {} has element type {}, expected {}",
                i, input.element_type, first.element_type
            ));
        }
        if input.rank() != first.rank() {
            return Err(format!(
                "input {} has rank {}, expected {}",
                i,
                input.rank(),
                first.rank()
            ));
        }
        let compatible = input
            .shape
            .iter()
            .zip(first.shape.iter())
            .enumerate()
            .all(|(d, (a, b))| d == axis || a == b);
        if !compatible {
            return Err(format!(
                "input {} shape {} is incompatible with {}",
                i, input, first
            ));
        }
        shape[axis] = shape[axis]
            .checked_add(input.shape[axis])
            .ok_or_else(|| format!("concatenated dimension {} overflows", axis))?;
    }

    Ok(vec![TensorDesc {
        element_type: first.element_type,
        shape,
    }])
}

fn infer_float_unary(inputs: &[TensorDesc], _: &Attributes) -> Result<Vec<TensorDesc>, String> {
    let input = &inputs[0];
    if !input.element_type.is_float() {
        return Err(format!(
            "expected a floating point input, got {}",
            input.element_type
        ));
    }
    Ok(vec![input.clone()])
}

fn infer_broadcast_binary(
    inputs: &[TensorDesc],
    _: &Attributes,
) -> Result<Vec<TensorDesc>, String> {
    let (a, b) = (&inputs[0], &inputs[1]);
    if a.element_type != b.element_type {
        return Err(format!(
            "element types differ: {} and {}",
            a.element_type, b.element_type
        ));
    }
    let shape = broadcast_shape(&a.shape, &b.shape)
        .ok_or_else(|| format!("shapes {} and {} are not broadcastable", a, b))?;

    Ok(vec![TensorDesc {
        element_type: a.element_type,
        shape,
    }])
}

fn infer_shuffle_channels(
    inputs: &[TensorDesc],
    attrs: &Attributes,
) -> Result<Vec<TensorDesc>, String> {
    let input = &inputs[0];
    let axis = attrs.get_int("axis").unwrap_or(1);
    let group = attrs.get_int("group").unwrap_or(1);

    let axis = normalize_axis(axis, input.rank())
        .ok_or_else(|| format!("axis {} out of range for rank {}", axis, input.rank()))?;
    if group < 1 {
        return Err(format!("group must be positive, got {}", group));
    }
    let channels = input.shape[axis];
    if channels % group as usize != 0 {
        return Err(format!(
            "channel dimension {} is not divisible by group {}",
            channels, group
        ));
    }

    Ok(vec![input.clone()])
}

fn infer_reshape(inputs: &[TensorDesc], attrs: &Attributes) -> Result<Vec<TensorDesc>, String> {
    let input = &inputs[0];
    let target = attrs.get_ints("shape").ok_or("missing 'shape'")?;

    let inferred: Vec<usize> = target.iter().filter(|&&d| d == -1).map(|_| 0).collect();
    if inferred.len() > 1 {
        return Err("at most one dimension may be -1".to_string());
    }

    let known = target
        .iter()
        .filter(|&&d| d != -1)
        .try_fold(1usize, |acc, &d| {
            let d = usize::try_from(d).map_err(|_| format!("invalid dimension {}", d))?;
            acc.checked_mul(d)
                .ok_or_else(|| format!("element count of {:?} overflows", target))
        })?;

    let total = input.numel();
    let mut shape = Shape::with_capacity(target.len());
    for &d in target {
        if d == -1 {
            if known == 0 || total % known != 0 {
                return Err(format!("cannot infer -1 for {} elements", total));
            }
            shape.push(total / known);
        } else {
            shape.push(d as usize);
        }
    }

    if checked_numel(&shape) != Some(total) {
        return Err(format!(
            "cannot reshape {} elements into {:?}",
            total,
            shape.as_slice()
        ));
    }

    Ok(vec![TensorDesc {
        element_type: input.element_type,
        shape,
    }])
}

fn infer_transpose(inputs: &[TensorDesc], attrs: &Attributes) -> Result<Vec<TensorDesc>, String> {
    let input = &inputs[0];
    let perm = attrs.get_ints("perm").ok_or("missing 'perm'")?;
    if perm.len() != input.rank() {
        return Err(format!(
            "perm has {} entries for rank {}",
            perm.len(),
            input.rank()
        ));
    }

    let mut seen = vec![false; perm.len()];
    let mut shape = Shape::with_capacity(perm.len());
    for &p in perm {
        let axis = usize::try_from(p)
            .ok()
            .filter(|&a| a < perm.len() && !seen[a])
            .ok_or_else(|| format!("perm {:?} is not a permutation", perm))?;
        seen[axis] = true;
        shape.push(input.shape[axis]);
    }

    Ok(vec![TensorDesc {
        element_type: input.element_type,
        shape,
    }])
}

fn to_static_shape(dims: &[i64]) -> Result<Shape, String> {
    dims.iter()
        .map(|&d| usize::try_from(d).map_err(|_| format!("invalid dimension {}", d)))
        .collect()
}
