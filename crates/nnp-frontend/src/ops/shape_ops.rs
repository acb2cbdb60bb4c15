// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Layout and shape manipulation: identity, reshape, concatenate,
//! transpose and split.

use super::{attr_int, attr_ints, conversion_error, input_shape, normalize_axis, operands, output_shape};
use crate::registry::{ConvertContext, OpOutput};
use crate::ImportError;
use dataflow_ir::{op, Expr};
use nnp_model::FunctionNode;

pub fn identity(inputs: &[Expr], node: &FunctionNode, _ctx: &ConvertContext<'_>) -> Result<OpOutput, ImportError> {
    Ok(operands(node, inputs, 1, 1)?[0].clone().into())
}

/// Uses the output variable's resolved shape so placeholder dimensions are
/// already concrete; falls back to the `shape` attribute.
pub fn reshape(inputs: &[Expr], node: &FunctionNode, ctx: &ConvertContext<'_>) -> Result<OpOutput, ImportError> {
    let x = operands(node, inputs, 1, 1)?[0].clone();
    let newshape = match output_shape(node, ctx, 0) {
        Some(shape) => shape.to_i64(),
        None => attr_ints(node, "shape")?
            .ok_or_else(|| conversion_error(node, "output shape unknown and no 'shape' attribute"))?,
    };
    Ok(op::reshape(x, newshape).into())
}

/// `axis` defaults to the last axis of the first input.
pub fn concatenate(inputs: &[Expr], node: &FunctionNode, ctx: &ConvertContext<'_>) -> Result<OpOutput, ImportError> {
    let parts = operands(node, inputs, 1, usize::MAX)?;
    let rank = input_shape(node, ctx, 0)?.rank();
    let axis = attr_int(node, "axis", rank as i64 - 1)?;
    let axis = normalize_axis(node, axis, rank)?;
    Ok(op::concatenate(parts.to_vec(), axis).into())
}

pub fn transpose(inputs: &[Expr], node: &FunctionNode, ctx: &ConvertContext<'_>) -> Result<OpOutput, ImportError> {
    let x = operands(node, inputs, 1, 1)?[0].clone();
    let rank = input_shape(node, ctx, 0)?.rank();
    let axes = attr_ints(node, "axes")?
        .ok_or_else(|| conversion_error(node, "missing 'axes' attribute"))?;
    if axes.len() != rank {
        return Err(conversion_error(
            node,
            format_args!("'axes' has {} entries for a rank {rank} input", axes.len()),
        ));
    }
    Ok(op::transpose(x, axes).into())
}

/// Splits along `axis` (default 0) into one value per index, each with the
/// split axis removed.
pub fn split(inputs: &[Expr], node: &FunctionNode, ctx: &ConvertContext<'_>) -> Result<OpOutput, ImportError> {
    let x = operands(node, inputs, 1, 1)?[0].clone();
    let x_shape = input_shape(node, ctx, 0)?;
    let axis = normalize_axis(node, attr_int(node, "axis", 0)?, x_shape.rank())?;
    let sections = x_shape.dims()[axis as usize];

    let parts = op::split(x, sections as i64, axis);
    let values = (0..sections)
        .map(|i| op::squeeze(Expr::tuple_get_item(parts.clone(), i), vec![axis]))
        .collect();
    Ok(OpOutput::Multi(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::testing::Fixture;
    use dataflow_ir::AttrValue;
    use nnp_model::{AttrValue as NnpAttr, Attributes};

    #[test]
    fn test_identity_passes_input_through() {
        let node = FunctionNode::new("id", "Identity", ["x"], ["y"]);
        let f = Fixture::new(node, &[("x", &[3]), ("y", &[3])], &[]);
        let out = f.single(identity);
        assert_eq!(out.as_var().unwrap().name(), "x");
    }

    #[test]
    fn test_reshape_uses_resolved_output_shape() {
        let node = FunctionNode::new("r", "Reshape", ["x"], ["y"])
            .with_attributes(Attributes::new().with("shape", NnpAttr::Ints(vec![-1, 12])));
        let f = Fixture::new(node, &[("x", &[-1, 3, 4]), ("y", &[-1, 12])], &[]);
        let out = f.single(reshape);
        assert_eq!(
            out.as_call().unwrap().attrs().get("newshape"),
            Some(&AttrValue::Ints(vec![1, 12]))
        );
    }

    #[test]
    fn test_reshape_attribute_fallback() {
        let node = FunctionNode::new("r", "Reshape", ["x"], ["y"])
            .with_attributes(Attributes::new().with("shape", NnpAttr::Ints(vec![4, 3])));
        let f = Fixture::new(node, &[("x", &[3, 4])], &[]);
        let out = f.single(reshape);
        assert_eq!(
            out.as_call().unwrap().attrs().get("newshape"),
            Some(&AttrValue::Ints(vec![4, 3]))
        );
    }

    #[test]
    fn test_concatenate_default_axis() {
        let node = FunctionNode::new("cat", "Concatenate", ["a", "b"], ["y"]);
        let f = Fixture::new(node, &[("a", &[2, 3]), ("b", &[2, 5]), ("y", &[2, 8])], &[]);
        let out = f.single(concatenate);
        let call = out.as_call().unwrap();
        assert_eq!(call.op().name(), "concatenate");
        assert_eq!(call.attrs().get("axis"), Some(&AttrValue::Int(1)));
    }

    #[test]
    fn test_transpose_axes_checked() {
        let node = FunctionNode::new("t", "Transpose", ["x"], ["y"])
            .with_attributes(Attributes::new().with("axes", NnpAttr::Ints(vec![1, 0])));
        let f = Fixture::new(node, &[("x", &[2, 3]), ("y", &[3, 2])], &[]);
        assert_eq!(f.single(transpose).as_call().unwrap().op().name(), "transpose");

        let node = FunctionNode::new("t", "Transpose", ["x"], ["y"])
            .with_attributes(Attributes::new().with("axes", NnpAttr::Ints(vec![0])));
        let f = Fixture::new(node, &[("x", &[2, 3]), ("y", &[3, 2])], &[]);
        assert!(matches!(f.run(transpose), Err(ImportError::Conversion { .. })));
    }

    #[test]
    fn test_split_yields_one_value_per_index() {
        let node = FunctionNode::new("s", "Split", ["x"], ["a", "b", "c"])
            .with_attributes(Attributes::new().with("axis", NnpAttr::Int(1)));
        let f = Fixture::new(node, &[("x", &[2, 3, 4]), ("a", &[2, 4]), ("b", &[2, 4]), ("c", &[2, 4])], &[]);
        let OpOutput::Multi(values) = f.run(split).unwrap() else {
            panic!("split must produce several values");
        };
        assert_eq!(values.len(), 3);
        let squeeze = values[2].as_call().unwrap();
        assert_eq!(squeeze.op().name(), "squeeze");
        assert_eq!(squeeze.attrs().get("axis"), Some(&AttrValue::Ints(vec![1])));
    }
}
