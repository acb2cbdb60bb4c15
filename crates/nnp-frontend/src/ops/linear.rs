// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fully connected layer.
//!
//! NNP's `Affine` flattens `x` at `base_axis`: dimensions before it are rows,
//! the rest are features. The weight is stored `(features, units...)` and
//! the output shape is `x.shape[..base_axis] ++ w.shape[1..]`. The IR's
//! `nn.dense` expects a 2-D input and a `(units, features)` weight, so the
//! handler reshapes on the way in and out.

use super::{attr_int, conversion_error, input_shape, operands};
use crate::registry::{ConvertContext, OpOutput};
use crate::ImportError;
use dataflow_ir::{op, Expr};
use nnp_model::FunctionNode;

pub fn affine(inputs: &[Expr], node: &FunctionNode, ctx: &ConvertContext<'_>) -> Result<OpOutput, ImportError> {
    let inputs = operands(node, inputs, 2, 3)?;
    let x_shape = input_shape(node, ctx, 0)?;
    let w_shape = input_shape(node, ctx, 1)?;

    let base_axis = attr_int(node, "base_axis", 1)?;
    let base_axis = usize::try_from(base_axis)
        .ok()
        .filter(|&b| b < x_shape.rank())
        .ok_or_else(|| {
            conversion_error(
                node,
                format_args!("base_axis {base_axis} is out of range for input {x_shape}"),
            )
        })?;
    if w_shape.rank() < 2 {
        return Err(conversion_error(
            node,
            format_args!("weight must have rank >= 2, got {w_shape}"),
        ));
    }

    let rows = x_shape.product_of(0..base_axis);
    let features = x_shape.product_of(base_axis..x_shape.rank());
    let units = w_shape.product_of(1..w_shape.rank());
    if w_shape.dims()[0] != features {
        return Err(conversion_error(
            node,
            format_args!("weight {w_shape} does not match {features} input features"),
        ));
    }

    let data = match (base_axis, x_shape.rank()) {
        (1, 2) => inputs[0].clone(),
        (1, _) => op::batch_flatten(inputs[0].clone()),
        _ => op::reshape(inputs[0].clone(), vec![rows as i64, features as i64]),
    };

    let mut weight = inputs[1].clone();
    if w_shape.rank() != 2 {
        weight = op::reshape(weight, vec![features as i64, units as i64]);
    }
    let weight = op::transpose(weight, vec![1, 0]);

    let mut out = op::dense(data, weight, units as i64);
    if let Some(bias) = inputs.get(2) {
        let b_shape = input_shape(node, ctx, 2)?;
        let bias = if b_shape.rank() == 1 {
            bias.clone()
        } else {
            op::reshape(bias.clone(), vec![units as i64])
        };
        out = op::bias_add(out, bias, 1);
    }

    let mut out_shape: Vec<i64> = x_shape.dims()[..base_axis].iter().map(|&d| d as i64).collect();
    out_shape.extend(w_shape.dims()[1..].iter().map(|&d| d as i64));
    if out_shape.len() != 2 {
        out = op::reshape(out, out_shape);
    }
    Ok(out.into())
}
